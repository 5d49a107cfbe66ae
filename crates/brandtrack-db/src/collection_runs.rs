//! Database operations for `collection_runs`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const RUN_COLUMNS: &str = "id, public_id, trigger_source, status, started_at, finished_at, \
     fetched, new_candidates, duplicates, enrichment_failed, persist_failed, persisted, \
     alerts_fired, failed_sources, created_at";

/// A row from the `collection_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub fetched: i64,
    pub new_candidates: i64,
    pub duplicates: i64,
    pub enrichment_failed: i64,
    pub persist_failed: i64,
    pub persisted: i64,
    pub alerts_fired: i64,
    pub failed_sources: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Final counters written when a run completes.
#[derive(Debug, Clone, Default)]
pub struct RunCounters {
    pub fetched: i64,
    pub new_candidates: i64,
    pub duplicates: i64,
    pub enrichment_failed: i64,
    pub persist_failed: i64,
    pub persisted: i64,
    pub alerts_fired: i64,
    pub failed_sources: Vec<String>,
}

/// Creates a run in `running` status with `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_collection_run(
    pool: &PgPool,
    trigger_source: &str,
) -> Result<CollectionRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, CollectionRunRow>(&format!(
        "INSERT INTO collection_runs (public_id, trigger_source, status) \
         VALUES ($1, $2, 'running') \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(public_id)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `succeeded`, sets `finished_at = NOW()` and the counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not in `running`
/// status, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_collection_run(
    pool: &PgPool,
    id: i64,
    counters: &RunCounters,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = 'succeeded', finished_at = NOW(), fetched = $1, new_candidates = $2, \
             duplicates = $3, enrichment_failed = $4, persist_failed = $5, persisted = $6, \
             alerts_fired = $7, failed_sources = $8 \
         WHERE id = $9 AND status = 'running'",
    )
    .bind(counters.fetched)
    .bind(counters.new_candidates)
    .bind(counters.duplicates)
    .bind(counters.enrichment_failed)
    .bind(counters.persist_failed)
    .bind(counters.persisted)
    .bind(counters.alerts_fired)
    .bind(&counters.failed_sources)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_collection_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<CollectionRunRow>, DbError> {
    let rows = sqlx::query_as::<_, CollectionRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM collection_runs \
         ORDER BY started_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
