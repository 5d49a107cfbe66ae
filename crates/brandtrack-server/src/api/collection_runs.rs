use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CollectionRunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct CollectionRunItem {
    collection_run_id: Uuid,
    trigger_source: String,
    status: String,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    fetched: i64,
    new_candidates: i64,
    duplicates: i64,
    enrichment_failed: i64,
    persist_failed: i64,
    persisted: i64,
    alerts_fired: i64,
    failed_sources: Vec<String>,
    created_at: DateTime<Utc>,
}

pub(super) async fn list_collection_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CollectionRunsQuery>,
) -> Result<Json<ApiResponse<Vec<CollectionRunItem>>>, ApiError> {
    let rows = brandtrack_db::list_collection_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| CollectionRunItem {
            collection_run_id: row.public_id,
            trigger_source: row.trigger_source,
            status: row.status,
            started_at: row.started_at,
            finished_at: row.finished_at,
            fetched: row.fetched,
            new_candidates: row.new_candidates,
            duplicates: row.duplicates,
            enrichment_failed: row.enrichment_failed,
            persist_failed: row.persist_failed,
            persisted: row.persisted,
            alerts_fired: row.alerts_fired,
            failed_sources: row.failed_sources,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
