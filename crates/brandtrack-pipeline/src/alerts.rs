//! Alert evaluation and trigger bookkeeping.
//!
//! [`evaluate`] is a pure predicate over one mention and one config;
//! [`process_alerts`] applies it to a cycle's freshly persisted rows and
//! performs the database side effects for every fire.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use brandtrack_core::text::contains_ci;
use brandtrack_db::{
    append_triggered_alert, record_trigger, touch_checked, AlertConfigRow, MentionRow,
    TriggeredAlert,
};

use crate::events::{EventSink, PipelineEvent};

pub const REASON_NEGATIVE_SENTIMENT: &str = "negative sentiment threshold";
pub const REASON_CRITICAL_KEYWORD: &str = "critical keyword";
pub const REASON_ENGAGEMENT: &str = "engagement threshold";

/// Outcome of evaluating one config against one mention. `reasons` lists
/// every predicate that matched, in a fixed order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct AlertDecision {
    pub fires: bool,
    pub reasons: Vec<&'static str>,
}

/// Decide whether `config` fires for `mention`.
///
/// Gates first: an inactive config, a platform outside the allow-list, or a
/// mention that matches neither a monitored brand nor a monitored keyword
/// never fires. Past the gates, all three trigger predicates are evaluated
/// so `reasons` is complete, not just the first hit.
#[must_use]
pub fn evaluate(mention: &MentionRow, config: &AlertConfigRow) -> AlertDecision {
    if !config.is_active {
        return AlertDecision::default();
    }
    if !config.platforms.iter().any(|p| p == &mention.platform) {
        return AlertDecision::default();
    }

    let brand_match = config
        .monitored_brands
        .iter()
        .any(|brand| mention.brand_mentions.contains(brand));
    let keyword_match = config
        .monitored_keywords
        .iter()
        .any(|keyword| contains_ci(&mention.text, keyword));
    if !brand_match && !keyword_match {
        return AlertDecision::default();
    }

    let mut reasons = Vec::new();
    if mention.sentiment_score <= config.negative_sentiment_threshold {
        reasons.push(REASON_NEGATIVE_SENTIMENT);
    }
    if config
        .critical_keywords
        .iter()
        .any(|keyword| contains_ci(&mention.text, keyword))
    {
        reasons.push(REASON_CRITICAL_KEYWORD);
    }
    // a zero threshold means the engagement predicate is switched off
    if config.engagement_threshold > 0.0
        && mention.engagement_score() >= config.engagement_threshold
    {
        reasons.push(REASON_ENGAGEMENT);
    }

    AlertDecision {
        fires: !reasons.is_empty(),
        reasons,
    }
}

/// True when `current` is at least `multiplier` times `baseline`. Declared
/// spike configs are checked through this against windowed counts; it never
/// fires off an empty baseline.
#[must_use]
pub fn spike_exceeded(current: i64, baseline: i64, multiplier: f64) -> bool {
    if baseline <= 0 || multiplier <= 0.0 {
        return false;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = current as f64 / baseline as f64;
    ratio >= multiplier
}

/// Evaluate every active config against every mention persisted this cycle,
/// recording triggers and publishing events for each fire. Returns the fire
/// count. Storage failures are logged per record and never stop the sweep;
/// `last_checked_at` is stamped once for the whole batch.
pub async fn process_alerts(
    pool: &PgPool,
    sink: &dyn EventSink,
    configs: &[AlertConfigRow],
    mentions: &[MentionRow],
) -> usize {
    let mut fired = 0;

    for mention in mentions {
        for config in configs {
            let decision = evaluate(mention, config);
            if !decision.fires {
                continue;
            }
            fired += 1;
            tracing::info!(
                config = %config.name,
                mention_id = mention.id,
                reasons = ?decision.reasons,
                "alert fired"
            );

            if let Err(error) = record_trigger(pool, config.id).await {
                tracing::warn!(config_id = config.id, %error, "alert statistics update failed");
            }
            let record = TriggeredAlert {
                alert_public_id: config.public_id,
                triggered_at: Utc::now(),
            };
            if let Err(error) = append_triggered_alert(pool, mention.id, &record).await {
                tracing::warn!(mention_id = mention.id, %error, "trigger record append failed");
            }

            sink.publish(PipelineEvent::AlertFired {
                mention_id: mention.id,
                config_id: config.id,
                config_public_id: config.public_id,
                config_name: config.name.clone(),
                reasons: decision.reasons.iter().map(ToString::to_string).collect(),
            })
            .await;
        }
    }

    if !configs.is_empty() {
        let ids: Vec<i64> = configs.iter().map(|config| config.id).collect();
        if let Err(error) = touch_checked(pool, &ids).await {
            tracing::warn!(%error, "alert checked-at stamp failed");
        }
    }

    fired
}

/// A plausible worst-case mention for dry-running a config: strongly
/// negative, heavily engaged, on the config's first allowed platform, naming
/// its first monitored brand and first critical keyword.
#[must_use]
pub fn synthetic_test_mention(config: &AlertConfigRow) -> MentionRow {
    let now = Utc::now();
    let brand = config
        .monitored_brands
        .first()
        .cloned()
        .unwrap_or_else(|| "your brand".to_string());
    let critical = config.critical_keywords.first().cloned().unwrap_or_default();
    let platform = config
        .platforms
        .first()
        .cloned()
        .unwrap_or_else(|| "twitter".to_string());

    MentionRow {
        id: 0,
        public_id: Uuid::nil(),
        platform,
        url: "https://example.com/alert-test".to_string(),
        text: format!("Test mention about {brand} {critical}")
            .trim()
            .to_string(),
        author: "alert-test".to_string(),
        author_profile: None,
        mention_kind: "brand_discussion".to_string(),
        published_at: now,
        collected_at: now,
        sentiment_score: -0.8,
        sentiment_label: "negative".to_string(),
        sentiment_confidence: 0.9,
        keywords: sqlx::types::Json(Vec::new()),
        likes: 500,
        shares: 120,
        comments: 80,
        views: 10_000,
        brand_mentions: vec![brand],
        processed: true,
        triggered_alerts: sqlx::types::Json(Vec::new()),
        created_at: now,
        updated_at: now,
    }
}
