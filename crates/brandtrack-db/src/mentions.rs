//! Database operations for the `mentions` table.
//!
//! `(platform, url)` is the natural key; [`insert_mention_if_new`] is the only
//! write path for new rows and relies on the unique constraint so concurrent
//! cycles cannot both insert the same mention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use brandtrack_core::Engagement;

use crate::DbError;

const MENTION_COLUMNS: &str = "id, public_id, platform, url, text, author, author_profile, \
     mention_kind, published_at, collected_at, sentiment_score, sentiment_label, \
     sentiment_confidence, keywords, likes, shares, comments, views, brand_mentions, \
     processed, triggered_alerts, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A derived keyword stored with a mention, with its relevance weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub word: String,
    pub relevance: f64,
}

impl KeywordEntry {
    #[must_use]
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            relevance: 1.0,
        }
    }
}

/// An alert-trigger record appended to a mention when a config fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredAlert {
    pub alert_public_id: Uuid,
    pub triggered_at: DateTime<Utc>,
}

/// A row from the `mentions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MentionRow {
    pub id: i64,
    pub public_id: Uuid,
    pub platform: String,
    pub url: String,
    pub text: String,
    pub author: String,
    pub author_profile: Option<String>,
    pub mention_kind: String,
    pub published_at: DateTime<Utc>,
    pub collected_at: DateTime<Utc>,
    pub sentiment_score: f64,
    pub sentiment_label: String,
    pub sentiment_confidence: f64,
    pub keywords: Json<Vec<KeywordEntry>>,
    pub likes: i64,
    pub shares: i64,
    pub comments: i64,
    pub views: i64,
    pub brand_mentions: Vec<String>,
    pub processed: bool,
    pub triggered_alerts: Json<Vec<TriggeredAlert>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MentionRow {
    /// Raw engagement counters for this row.
    #[must_use]
    pub fn engagement(&self) -> Engagement {
        Engagement {
            likes: self.likes,
            shares: self.shares,
            comments: self.comments,
            views: self.views,
        }
    }

    /// Weighted engagement score, recomputed on demand (never stored).
    #[must_use]
    pub fn engagement_score(&self) -> f64 {
        self.engagement().score()
    }
}

/// Borrowed insert payload for a new, already-enriched mention.
pub struct NewMention<'a> {
    pub platform: &'a str,
    pub url: &'a str,
    pub text: &'a str,
    pub author: &'a str,
    pub author_profile: Option<&'a str>,
    pub mention_kind: &'a str,
    pub published_at: DateTime<Utc>,
    pub sentiment_score: f64,
    pub sentiment_label: &'a str,
    pub sentiment_confidence: f64,
    pub keywords: &'a [KeywordEntry],
    pub likes: i64,
    pub shares: i64,
    pub comments: i64,
    pub views: i64,
    pub brand_mentions: &'a [String],
    pub processed: bool,
}

/// Filters for [`list_mentions`]. `cursor` is the `id` of the last seen row
/// (exclusive, for next-page queries).
#[derive(Debug, Clone, Default)]
pub struct MentionFilter {
    pub platform: Option<String>,
    pub sentiment_label: Option<String>,
    pub published_from: Option<DateTime<Utc>>,
    pub published_to: Option<DateTime<Utc>>,
    pub cursor: Option<i64>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Insert a mention unless its `(platform, url)` natural key already exists.
///
/// Returns `Some(row)` when the insert created a new row, `None` when an
/// existing row won — the check and the insert are one statement, so two
/// overlapping cycles can never both create the same mention.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on any failure other than the key conflict.
pub async fn insert_mention_if_new(
    pool: &PgPool,
    mention: &NewMention<'_>,
) -> Result<Option<MentionRow>, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, MentionRow>(&format!(
        "INSERT INTO mentions \
           (public_id, platform, url, text, author, author_profile, mention_kind, \
            published_at, sentiment_score, sentiment_label, sentiment_confidence, \
            keywords, likes, shares, comments, views, brand_mentions, processed) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
         ON CONFLICT (platform, url) DO NOTHING \
         RETURNING {MENTION_COLUMNS}"
    ))
    .bind(public_id)
    .bind(mention.platform)
    .bind(mention.url)
    .bind(mention.text)
    .bind(mention.author)
    .bind(mention.author_profile)
    .bind(mention.mention_kind)
    .bind(mention.published_at)
    .bind(mention.sentiment_score)
    .bind(mention.sentiment_label)
    .bind(mention.sentiment_confidence)
    .bind(Json(mention.keywords))
    .bind(mention.likes)
    .bind(mention.shares)
    .bind(mention.comments)
    .bind(mention.views)
    .bind(mention.brand_mentions)
    .bind(mention.processed)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Cheap existence probe by natural key, used to skip enrichment for mentions
/// already seen in a prior cycle. The guarded insert remains the authority.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn mention_exists(pool: &PgPool, platform: &str, url: &str) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM mentions WHERE platform = $1 AND url = $2)",
    )
    .bind(platform)
    .bind(url)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Cursor-paginated mention feed, newest first, with optional filters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_mentions(
    pool: &PgPool,
    filter: &MentionFilter,
    limit: i64,
) -> Result<Vec<MentionRow>, DbError> {
    let rows = sqlx::query_as::<_, MentionRow>(&format!(
        "SELECT {MENTION_COLUMNS} FROM mentions \
         WHERE ($1::TEXT IS NULL OR platform = $1) \
           AND ($2::TEXT IS NULL OR sentiment_label = $2) \
           AND ($3::TIMESTAMPTZ IS NULL OR published_at >= $3) \
           AND ($4::TIMESTAMPTZ IS NULL OR published_at <= $4) \
           AND ($5::BIGINT IS NULL OR id < $5) \
         ORDER BY id DESC LIMIT $6"
    ))
    .bind(filter.platform.as_deref())
    .bind(filter.sentiment_label.as_deref())
    .bind(filter.published_from)
    .bind(filter.published_to)
    .bind(filter.cursor)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// All mentions published at or after `since`, oldest first. Chronological
/// order keeps the aggregator's "first platform encountered" tie-break stable.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_mentions_since(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<Vec<MentionRow>, DbError> {
    let rows = sqlx::query_as::<_, MentionRow>(&format!(
        "SELECT {MENTION_COLUMNS} FROM mentions \
         WHERE published_at >= $1 \
         ORDER BY published_at ASC, id ASC"
    ))
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Atomically append one alert-trigger record to a mention's `triggered_alerts`
/// array.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the mention does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn append_triggered_alert(
    pool: &PgPool,
    mention_id: i64,
    record: &TriggeredAlert,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE mentions \
         SET triggered_alerts = triggered_alerts || $2::jsonb, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(mention_id)
    .bind(Json(vec![record.clone()]))
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Count mentions collected in `[from, to)`. Backs the windowed comparison a
/// volume-spike job needs.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn count_mentions_between(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM mentions WHERE collected_at >= $1 AND collected_at < $2",
    )
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
