//! Alert config CRUD plus the dry-run endpoint that evaluates a config
//! against a synthetic worst-case mention.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use brandtrack_db::{AlertConfigRow, AlertConfigUpdate, NewAlertConfig};
use brandtrack_pipeline::{evaluate, synthetic_test_mention};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

// Defaults match the alert_configs column defaults.
const DEFAULT_SENTIMENT_THRESHOLD: f64 = -0.5;
const DEFAULT_SPIKE_PCT: f64 = 50.0;
const DEFAULT_SPIKE_WINDOW_MINUTES: i32 = 60;
const DEFAULT_ENGAGEMENT_THRESHOLD: f64 = 1000.0;

fn default_platforms() -> Vec<String> {
    ["twitter", "reddit", "news", "web"]
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateAlertRequest {
    pub name: String,
    pub description: Option<String>,
    pub negative_sentiment_threshold: Option<f64>,
    pub volume_spike_enabled: Option<bool>,
    pub volume_spike_pct: Option<f64>,
    pub volume_spike_window_minutes: Option<i32>,
    pub engagement_threshold: Option<f64>,
    pub critical_keywords: Option<Vec<String>>,
    pub platforms: Option<Vec<String>>,
    pub monitored_brands: Option<Vec<String>>,
    pub monitored_keywords: Option<Vec<String>>,
    pub email_recipients: Option<Vec<String>>,
    pub email_frequency: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_headers: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

// Option<Option<T>> is intentional: outer None = "not in request" (keep current),
// Some(None) = "explicitly cleared", Some(Some(v)) = "set to value" (PATCH semantics).
#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct UpdateAlertRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub negative_sentiment_threshold: Option<f64>,
    pub volume_spike_enabled: Option<bool>,
    pub volume_spike_pct: Option<f64>,
    pub volume_spike_window_minutes: Option<i32>,
    pub engagement_threshold: Option<f64>,
    pub critical_keywords: Option<Vec<String>>,
    pub platforms: Option<Vec<String>>,
    pub monitored_brands: Option<Vec<String>>,
    pub monitored_keywords: Option<Vec<String>>,
    pub email_recipients: Option<Vec<String>>,
    pub email_frequency: Option<String>,
    pub webhook_url: Option<Option<String>>,
    pub webhook_headers: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct AlertConfigItem {
    pub alert_id: Uuid,
    pub name: String,
    pub description: String,
    pub negative_sentiment_threshold: f64,
    pub volume_spike_enabled: bool,
    pub volume_spike_pct: f64,
    pub volume_spike_window_minutes: i32,
    pub engagement_threshold: f64,
    pub critical_keywords: Vec<String>,
    pub platforms: Vec<String>,
    pub monitored_brands: Vec<String>,
    pub monitored_keywords: Vec<String>,
    pub email_recipients: Vec<String>,
    pub email_frequency: String,
    pub webhook_url: Option<String>,
    pub webhook_headers: serde_json::Value,
    pub is_active: bool,
    pub total_triggered: i64,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AlertConfigItem {
    fn from_row(row: AlertConfigRow) -> Self {
        Self {
            alert_id: row.public_id,
            name: row.name,
            description: row.description,
            negative_sentiment_threshold: row.negative_sentiment_threshold,
            volume_spike_enabled: row.volume_spike_enabled,
            volume_spike_pct: row.volume_spike_pct,
            volume_spike_window_minutes: row.volume_spike_window_minutes,
            engagement_threshold: row.engagement_threshold,
            critical_keywords: row.critical_keywords,
            platforms: row.platforms,
            monitored_brands: row.monitored_brands,
            monitored_keywords: row.monitored_keywords,
            email_recipients: row.email_recipients,
            email_frequency: row.email_frequency,
            webhook_url: row.webhook_url,
            webhook_headers: row.webhook_headers.0,
            is_active: row.is_active,
            total_triggered: row.total_triggered,
            last_triggered_at: row.last_triggered_at,
            last_checked_at: row.last_checked_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct TestAlertResponse {
    pub fires: bool,
    pub reasons: Vec<String>,
    pub mention: SyntheticMention,
}

/// The worst-case mention the dry run evaluated, echoed for the operator.
#[derive(Debug, Serialize)]
pub(super) struct SyntheticMention {
    pub platform: String,
    pub text: String,
    pub sentiment_score: f64,
    pub sentiment_label: String,
    pub engagement_score: f64,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn parse_alert_id(request_id: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::new(
            request_id,
            "validation_error",
            format!("alert id must be a UUID, got '{raw}'"),
        )
    })
}

fn validate_name(request_id: &str, name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > 200 {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "name must be 1-200 characters",
        ));
    }
    Ok(())
}

fn validate_sentiment_threshold(request_id: &str, value: f64) -> Result<(), ApiError> {
    if (-1.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::new(
            request_id,
            "validation_error",
            format!("negative_sentiment_threshold must be between -1 and 1, got {value}"),
        ))
    }
}

fn validate_engagement_threshold(request_id: &str, value: f64) -> Result<(), ApiError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ApiError::new(
            request_id,
            "validation_error",
            format!("engagement_threshold must be non-negative, got {value}"),
        ))
    }
}

fn validate_email_frequency(request_id: &str, value: &str) -> Result<(), ApiError> {
    match value {
        "immediate" | "hourly" | "daily" => Ok(()),
        _ => Err(ApiError::new(
            request_id,
            "validation_error",
            format!("email_frequency must be 'immediate', 'hourly', or 'daily', got '{value}'"),
        )),
    }
}

fn validate_webhook_url(request_id: &str, value: &str) -> Result<(), ApiError> {
    reqwest::Url::parse(value).map_err(|_| {
        ApiError::new(
            request_id,
            "validation_error",
            format!("webhook_url must be a valid URL, got '{value}'"),
        )
    })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/alerts — all configs, newest first.
pub(super) async fn list_alerts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<AlertConfigItem>>>, ApiError> {
    let rows = brandtrack_db::list_alert_configs(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(AlertConfigItem::from_row).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/alerts — create a config; omitted fields take the table defaults.
pub(super) async fn create_alert(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateAlertRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AlertConfigItem>>), ApiError> {
    let rid = &req_id.0;

    let name = body.name.trim().to_owned();
    validate_name(rid, &name)?;
    if let Some(threshold) = body.negative_sentiment_threshold {
        validate_sentiment_threshold(rid, threshold)?;
    }
    if let Some(threshold) = body.engagement_threshold {
        validate_engagement_threshold(rid, threshold)?;
    }
    if let Some(ref url) = body.webhook_url {
        validate_webhook_url(rid, url)?;
    }

    let description = body.description.unwrap_or_default();
    let critical_keywords = body.critical_keywords.unwrap_or_default();
    let platforms = body.platforms.unwrap_or_else(default_platforms);
    let monitored_brands = body.monitored_brands.unwrap_or_default();
    let monitored_keywords = body.monitored_keywords.unwrap_or_default();
    let email_recipients = body.email_recipients.unwrap_or_default();
    let email_frequency = body
        .email_frequency
        .unwrap_or_else(|| "immediate".to_string());
    validate_email_frequency(rid, &email_frequency)?;
    let webhook_headers = body
        .webhook_headers
        .unwrap_or_else(|| serde_json::json!({}));

    let config = NewAlertConfig {
        name: &name,
        description: &description,
        negative_sentiment_threshold: body
            .negative_sentiment_threshold
            .unwrap_or(DEFAULT_SENTIMENT_THRESHOLD),
        volume_spike_enabled: body.volume_spike_enabled.unwrap_or(false),
        volume_spike_pct: body.volume_spike_pct.unwrap_or(DEFAULT_SPIKE_PCT),
        volume_spike_window_minutes: body
            .volume_spike_window_minutes
            .unwrap_or(DEFAULT_SPIKE_WINDOW_MINUTES),
        engagement_threshold: body
            .engagement_threshold
            .unwrap_or(DEFAULT_ENGAGEMENT_THRESHOLD),
        critical_keywords: &critical_keywords,
        platforms: &platforms,
        monitored_brands: &monitored_brands,
        monitored_keywords: &monitored_keywords,
        email_recipients: &email_recipients,
        email_frequency: &email_frequency,
        webhook_url: body.webhook_url.as_deref(),
        webhook_headers: &webhook_headers,
        is_active: body.is_active.unwrap_or(true),
    };

    let row = brandtrack_db::create_alert_config(&state.pool, &config)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: AlertConfigItem::from_row(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/alerts/:alert_id — fetch one config.
pub(super) async fn get_alert(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(alert_id): Path<String>,
) -> Result<Json<ApiResponse<AlertConfigItem>>, ApiError> {
    let public_id = parse_alert_id(&req_id.0, &alert_id)?;

    let row = brandtrack_db::get_alert_config_by_public_id(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: AlertConfigItem::from_row(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PATCH /api/v1/alerts/:alert_id — sparse update.
pub(super) async fn update_alert(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(alert_id): Path<String>,
    Json(body): Json<UpdateAlertRequest>,
) -> Result<Json<ApiResponse<AlertConfigItem>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_alert_id(rid, &alert_id)?;

    let trimmed_name = body.name.as_ref().map(|n| n.trim().to_owned());
    if let Some(ref name) = trimmed_name {
        validate_name(rid, name)?;
    }
    if let Some(threshold) = body.negative_sentiment_threshold {
        validate_sentiment_threshold(rid, threshold)?;
    }
    if let Some(threshold) = body.engagement_threshold {
        validate_engagement_threshold(rid, threshold)?;
    }
    if let Some(ref freq) = body.email_frequency {
        validate_email_frequency(rid, freq)?;
    }
    if let Some(Some(ref url)) = body.webhook_url {
        validate_webhook_url(rid, url)?;
    }

    let update = AlertConfigUpdate {
        name: trimmed_name,
        description: body.description,
        negative_sentiment_threshold: body.negative_sentiment_threshold,
        volume_spike_enabled: body.volume_spike_enabled,
        volume_spike_pct: body.volume_spike_pct,
        volume_spike_window_minutes: body.volume_spike_window_minutes,
        engagement_threshold: body.engagement_threshold,
        critical_keywords: body.critical_keywords,
        platforms: body.platforms,
        monitored_brands: body.monitored_brands,
        monitored_keywords: body.monitored_keywords,
        email_recipients: body.email_recipients,
        email_frequency: body.email_frequency,
        webhook_url: body.webhook_url,
        webhook_headers: body.webhook_headers,
        is_active: body.is_active,
    };

    let row = brandtrack_db::update_alert_config(&state.pool, public_id, &update)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: AlertConfigItem::from_row(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/alerts/:alert_id — hard delete.
pub(super) async fn delete_alert(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(alert_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let public_id = parse_alert_id(&req_id.0, &alert_id)?;

    brandtrack_db::delete_alert_config(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/alerts/:alert_id/toggle — flip the active flag.
pub(super) async fn toggle_alert(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(alert_id): Path<String>,
) -> Result<Json<ApiResponse<AlertConfigItem>>, ApiError> {
    let public_id = parse_alert_id(&req_id.0, &alert_id)?;

    let row = brandtrack_db::toggle_alert_config(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: AlertConfigItem::from_row(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/alerts/:alert_id/test — dry-run the evaluator against a
/// synthetic worst-case mention. Nothing is persisted or published.
pub(super) async fn test_alert(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(alert_id): Path<String>,
) -> Result<Json<ApiResponse<TestAlertResponse>>, ApiError> {
    let public_id = parse_alert_id(&req_id.0, &alert_id)?;

    let config = brandtrack_db::get_alert_config_by_public_id(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let mention = synthetic_test_mention(&config);
    let decision = evaluate(&mention, &config);

    Ok(Json(ApiResponse {
        data: TestAlertResponse {
            fires: decision.fires,
            reasons: decision.reasons.iter().map(ToString::to_string).collect(),
            mention: SyntheticMention {
                platform: mention.platform.clone(),
                text: mention.text.clone(),
                sentiment_score: mention.sentiment_score,
                sentiment_label: mention.sentiment_label.clone(),
                engagement_score: mention.engagement_score(),
            },
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
