//! Offline unit tests for brandtrack-db pool configuration and row types.
//! These tests do not require a live database connection.

use brandtrack_core::{AppConfig, Environment};
use brandtrack_db::{CollectionRunRow, KeywordEntry, MentionRow, PoolConfig, RunCounters, TriggeredAlert};
use chrono::Utc;
use sqlx::types::Json;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use uuid::Uuid;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        monitored_brands: vec!["Acme".to_string()],
        monitored_keywords: vec![],
        monitored_handles: vec![],
        collect_interval_minutes: 2,
        source_timeout_secs: 30,
        source_user_agent: "ua".to_string(),
        enrich_batch_size: 5,
        enrich_batch_delay_ms: 1000,
        enrich_max_attempts: 3,
        enrich_timeout_secs: 30,
        twitter_bearer_token: None,
        reddit_client_id: None,
        reddit_client_secret: None,
        reddit_user_agent: "brandtrack/0.1".to_string(),
        news_api_key: None,
        gemini_api_key: None,
        gemini_model: "gemini-1.5-flash".to_string(),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn pool_config_default_is_conservative() {
    let pool_config = PoolConfig::default();
    assert_eq!(pool_config.max_connections, 10);
    assert_eq!(pool_config.min_connections, 1);
    assert_eq!(pool_config.acquire_timeout_secs, 10);
}

/// Compile-time smoke test: confirm that [`CollectionRunRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn collection_run_row_has_expected_fields() {
    let row = CollectionRunRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        trigger_source: "cli".to_string(),
        status: "running".to_string(),
        started_at: Utc::now(),
        finished_at: None,
        fetched: 0,
        new_candidates: 0,
        duplicates: 0,
        enrichment_failed: 0,
        persist_failed: 0,
        persisted: 0,
        alerts_fired: 0,
        failed_sources: vec![],
        created_at: Utc::now(),
    };

    assert_eq!(row.id, 1);
    assert_eq!(row.trigger_source, "cli");
    assert_eq!(row.status, "running");
    assert!(row.finished_at.is_none());
    assert_eq!(row.persisted, 0);
    assert!(row.failed_sources.is_empty());
}

#[test]
fn run_counters_default_is_zeroed() {
    let counters = RunCounters::default();
    assert_eq!(counters.fetched, 0);
    assert_eq!(counters.persisted, 0);
    assert_eq!(counters.alerts_fired, 0);
    assert!(counters.failed_sources.is_empty());
}

#[test]
fn mention_row_engagement_score_weights_shares_and_comments() {
    let row = MentionRow {
        id: 1,
        public_id: Uuid::new_v4(),
        platform: "twitter".to_string(),
        url: "https://twitter.com/i/status/1".to_string(),
        text: "Acme shipped".to_string(),
        author: "user1".to_string(),
        author_profile: None,
        mention_kind: "brand_discussion".to_string(),
        published_at: Utc::now(),
        collected_at: Utc::now(),
        sentiment_score: 0.4,
        sentiment_label: "positive".to_string(),
        sentiment_confidence: 0.8,
        keywords: Json(vec![]),
        likes: 10,
        shares: 5,
        comments: 2,
        views: 100,
        brand_mentions: vec![],
        processed: true,
        triggered_alerts: Json(vec![]),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    // 10 + 2*5 + 1.5*2 + 0.1*100 = 33.0
    let score = row.engagement_score();
    assert!((score - 33.0).abs() < f64::EPSILON);
}

/// The JSONB append in `append_triggered_alert` relies on this exact serde
/// shape, so pin it down.
#[test]
fn triggered_alert_serializes_to_expected_shape() {
    let alert_id = Uuid::new_v4();
    let record = TriggeredAlert {
        alert_public_id: alert_id,
        triggered_at: Utc::now(),
    };

    let value = serde_json::to_value(&record).expect("serialize failed");
    assert_eq!(
        value["alert_public_id"],
        serde_json::json!(alert_id.to_string())
    );
    assert!(value["triggered_at"].is_string());

    let parsed: TriggeredAlert = serde_json::from_value(value).expect("deserialize failed");
    assert_eq!(parsed.alert_public_id, alert_id);
}

#[test]
fn keyword_entry_new_defaults_relevance_to_one() {
    let entry = KeywordEntry::new("launch");
    assert_eq!(entry.word, "launch");
    assert!((entry.relevance - 1.0).abs() < f64::EPSILON);

    let value = serde_json::to_value(&entry).expect("serialize failed");
    assert_eq!(value, serde_json::json!({"word": "launch", "relevance": 1.0}));
}
