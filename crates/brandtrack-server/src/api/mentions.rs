//! GET /api/v1/mentions — cursor-paginated mention feed with filters.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use brandtrack_core::SentimentLabel;
use brandtrack_db::{KeywordEntry, MentionFilter, MentionRow, TriggeredAlert};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct MentionsQuery {
    pub platform: Option<String>,
    pub sentiment: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub cursor: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct MentionItem {
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
    pub keywords: Vec<KeywordEntry>,
    pub likes: i64,
    pub shares: i64,
    pub comments: i64,
    pub views: i64,
    pub engagement_score: f64,
    pub brand_mentions: Vec<String>,
    pub triggered_alerts: Vec<TriggeredAlert>,
    pub created_at: DateTime<Utc>,
}

impl MentionItem {
    fn from_row(row: MentionRow) -> Self {
        let engagement_score = row.engagement_score();
        Self {
            id: row.id,
            public_id: row.public_id,
            platform: row.platform,
            url: row.url,
            text: row.text,
            author: row.author,
            author_profile: row.author_profile,
            mention_kind: row.mention_kind,
            published_at: row.published_at,
            collected_at: row.collected_at,
            sentiment_score: row.sentiment_score,
            sentiment_label: row.sentiment_label,
            sentiment_confidence: row.sentiment_confidence,
            keywords: row.keywords.0,
            likes: row.likes,
            shares: row.shares,
            comments: row.comments,
            views: row.views,
            engagement_score,
            brand_mentions: row.brand_mentions,
            triggered_alerts: row.triggered_alerts.0,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct PaginatedMentions {
    pub items: Vec<MentionItem>,
    pub next_cursor: Option<i64>,
}

pub(super) async fn list_mentions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<MentionsQuery>,
) -> Result<Json<ApiResponse<PaginatedMentions>>, ApiError> {
    let rid = &req_id.0;

    // Labels are a closed vocabulary; platforms are open-ended, an unknown
    // one simply matches nothing.
    let sentiment_label = match query.sentiment.as_deref() {
        Some(raw) => Some(
            raw.parse::<SentimentLabel>()
                .map_err(|_| {
                    ApiError::new(
                        rid,
                        "validation_error",
                        format!("sentiment must be 'positive', 'negative', or 'neutral', got '{raw}'"),
                    )
                })?
                .as_str()
                .to_string(),
        ),
        None => None,
    };

    let limit = normalize_limit(query.limit);
    let filter = MentionFilter {
        platform: query.platform,
        sentiment_label,
        published_from: query.from,
        published_to: query.to,
        cursor: query.cursor,
    };

    let rows = brandtrack_db::list_mentions(&state.pool, &filter, limit + 1)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    // `normalize_limit` clamps to 1..=200, so the conversion is always safe.
    let limit_usize = usize::try_from(limit).unwrap_or(usize::MAX);
    let has_more = rows.len() > limit_usize;
    let take = if has_more { limit_usize } else { rows.len() };

    let items: Vec<MentionItem> = rows
        .into_iter()
        .take(take)
        .map(MentionItem::from_row)
        .collect();

    let next_cursor = if has_more {
        items.last().map(|item| item.id)
    } else {
        None
    };

    Ok(Json(ApiResponse {
        data: PaginatedMentions { items, next_cursor },
        meta: ResponseMeta::new(req_id.0),
    }))
}
