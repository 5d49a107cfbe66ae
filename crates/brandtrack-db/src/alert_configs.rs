//! Database operations for `alert_configs`.
//!
//! The pipeline never rewrites a config; it only bumps the statistics columns
//! through the atomic updates at the bottom of this module.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const ALERT_COLUMNS: &str = "id, public_id, name, description, negative_sentiment_threshold, \
     volume_spike_enabled, volume_spike_pct, volume_spike_window_minutes, engagement_threshold, \
     critical_keywords, platforms, monitored_brands, monitored_keywords, email_recipients, \
     email_frequency, webhook_url, webhook_headers, is_active, total_triggered, \
     last_triggered_at, last_checked_at, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `alert_configs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertConfigRow {
    pub id: i64,
    pub public_id: Uuid,
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
    pub webhook_headers: Json<serde_json::Value>,
    pub is_active: bool,
    pub total_triggered: i64,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Borrowed insert payload for a new alert config.
pub struct NewAlertConfig<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub negative_sentiment_threshold: f64,
    pub volume_spike_enabled: bool,
    pub volume_spike_pct: f64,
    pub volume_spike_window_minutes: i32,
    pub engagement_threshold: f64,
    pub critical_keywords: &'a [String],
    pub platforms: &'a [String],
    pub monitored_brands: &'a [String],
    pub monitored_keywords: &'a [String],
    pub email_recipients: &'a [String],
    pub email_frequency: &'a str,
    pub webhook_url: Option<&'a str>,
    pub webhook_headers: &'a serde_json::Value,
    pub is_active: bool,
}

/// Sparse update payload. `None` keeps the current value; for `webhook_url`
/// the outer `None` keeps and `Some(None)` clears.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct AlertConfigUpdate {
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
// Operations
// ---------------------------------------------------------------------------

/// All configs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_alert_configs(pool: &PgPool) -> Result<Vec<AlertConfigRow>, DbError> {
    let rows = sqlx::query_as::<_, AlertConfigRow>(&format!(
        "SELECT {ALERT_COLUMNS} FROM alert_configs ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Active configs in stable id order, loaded once per collection cycle.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_active_alert_configs(pool: &PgPool) -> Result<Vec<AlertConfigRow>, DbError> {
    let rows = sqlx::query_as::<_, AlertConfigRow>(&format!(
        "SELECT {ALERT_COLUMNS} FROM alert_configs WHERE is_active = true ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetch a single config by its public UUID.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such config exists, or
/// [`DbError::Sqlx`] on query failure.
pub async fn get_alert_config_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<AlertConfigRow, DbError> {
    let row = sqlx::query_as::<_, AlertConfigRow>(&format!(
        "SELECT {ALERT_COLUMNS} FROM alert_configs WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Create a config and return the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on insert failure.
pub async fn create_alert_config(
    pool: &PgPool,
    config: &NewAlertConfig<'_>,
) -> Result<AlertConfigRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, AlertConfigRow>(&format!(
        "INSERT INTO alert_configs \
           (public_id, name, description, negative_sentiment_threshold, volume_spike_enabled, \
            volume_spike_pct, volume_spike_window_minutes, engagement_threshold, \
            critical_keywords, platforms, monitored_brands, monitored_keywords, \
            email_recipients, email_frequency, webhook_url, webhook_headers, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
         RETURNING {ALERT_COLUMNS}"
    ))
    .bind(public_id)
    .bind(config.name)
    .bind(config.description)
    .bind(config.negative_sentiment_threshold)
    .bind(config.volume_spike_enabled)
    .bind(config.volume_spike_pct)
    .bind(config.volume_spike_window_minutes)
    .bind(config.engagement_threshold)
    .bind(config.critical_keywords)
    .bind(config.platforms)
    .bind(config.monitored_brands)
    .bind(config.monitored_keywords)
    .bind(config.email_recipients)
    .bind(config.email_frequency)
    .bind(config.webhook_url)
    .bind(Json(config.webhook_headers))
    .bind(config.is_active)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Sparse update; untouched fields keep their current values.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such config exists, or
/// [`DbError::Sqlx`] on query failure.
pub async fn update_alert_config(
    pool: &PgPool,
    public_id: Uuid,
    update: &AlertConfigUpdate,
) -> Result<AlertConfigRow, DbError> {
    let clear_webhook_url = update.webhook_url.is_some();
    let webhook_url_value = update.webhook_url.clone().flatten();

    let row = sqlx::query_as::<_, AlertConfigRow>(&format!(
        "UPDATE alert_configs SET \
           name = COALESCE($2::TEXT, name), \
           description = COALESCE($3::TEXT, description), \
           negative_sentiment_threshold = COALESCE($4::DOUBLE PRECISION, negative_sentiment_threshold), \
           volume_spike_enabled = COALESCE($5::BOOLEAN, volume_spike_enabled), \
           volume_spike_pct = COALESCE($6::DOUBLE PRECISION, volume_spike_pct), \
           volume_spike_window_minutes = COALESCE($7::INT, volume_spike_window_minutes), \
           engagement_threshold = COALESCE($8::DOUBLE PRECISION, engagement_threshold), \
           critical_keywords = COALESCE($9::TEXT[], critical_keywords), \
           platforms = COALESCE($10::TEXT[], platforms), \
           monitored_brands = COALESCE($11::TEXT[], monitored_brands), \
           monitored_keywords = COALESCE($12::TEXT[], monitored_keywords), \
           email_recipients = COALESCE($13::TEXT[], email_recipients), \
           email_frequency = COALESCE($14::TEXT, email_frequency), \
           webhook_url = CASE WHEN $15 THEN $16::TEXT ELSE webhook_url END, \
           webhook_headers = COALESCE($17::JSONB, webhook_headers), \
           is_active = COALESCE($18::BOOLEAN, is_active), \
           updated_at = NOW() \
         WHERE public_id = $1 \
         RETURNING {ALERT_COLUMNS}"
    ))
    .bind(public_id)
    .bind(update.name.as_deref())
    .bind(update.description.as_deref())
    .bind(update.negative_sentiment_threshold)
    .bind(update.volume_spike_enabled)
    .bind(update.volume_spike_pct)
    .bind(update.volume_spike_window_minutes)
    .bind(update.engagement_threshold)
    .bind(update.critical_keywords.as_deref())
    .bind(update.platforms.as_deref())
    .bind(update.monitored_brands.as_deref())
    .bind(update.monitored_keywords.as_deref())
    .bind(update.email_recipients.as_deref())
    .bind(update.email_frequency.as_deref())
    .bind(clear_webhook_url)
    .bind(webhook_url_value)
    .bind(update.webhook_headers.as_ref().map(Json))
    .bind(update.is_active)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Hard-delete a config.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such config exists, or
/// [`DbError::Sqlx`] on query failure.
pub async fn delete_alert_config(pool: &PgPool, public_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM alert_configs WHERE public_id = $1")
        .bind(public_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Atomically flip the active flag and return the updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such config exists, or
/// [`DbError::Sqlx`] on query failure.
pub async fn toggle_alert_config(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<AlertConfigRow, DbError> {
    let row = sqlx::query_as::<_, AlertConfigRow>(&format!(
        "UPDATE alert_configs \
         SET is_active = NOT is_active, updated_at = NOW() \
         WHERE public_id = $1 \
         RETURNING {ALERT_COLUMNS}"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Bump the trigger statistics after a fire: `total_triggered + 1` and a fresh
/// `last_triggered_at`. Never reads the old count back.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the config is gone, or [`DbError::Sqlx`]
/// on query failure.
pub async fn record_trigger(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE alert_configs \
         SET total_triggered = total_triggered + 1, last_triggered_at = NOW(), updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Stamp `last_checked_at` for every config evaluated this cycle.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn touch_checked(pool: &PgPool, ids: &[i64]) -> Result<(), DbError> {
    if ids.is_empty() {
        return Ok(());
    }

    sqlx::query("UPDATE alert_configs SET last_checked_at = NOW() WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;

    Ok(())
}
