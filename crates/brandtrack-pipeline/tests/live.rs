//! Live pipeline tests: full collection cycles against a fresh Postgres
//! database (via `#[sqlx::test]`) and wiremock upstreams.
//!
//! The sentiment client runs disabled here, so every verdict comes from the
//! deterministic local heuristic and assertions stay exact.

use std::sync::{Arc, Mutex};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use brandtrack_db::{
    get_alert_config_by_public_id, list_collection_runs, list_mentions, AlertConfigRow,
    MentionFilter, NewAlertConfig,
};
use brandtrack_pipeline::{Collector, CycleSummary, EventSink, PipelineEvent};
use brandtrack_sentiment::SentimentClient;
use brandtrack_sources::{NewsSource, SearchTerms, SocialSource, SourceAdapter};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingSink(Mutex<Vec<PipelineEvent>>);

impl RecordingSink {
    fn events(&self) -> Vec<PipelineEvent> {
        self.0.lock().expect("sink lock poisoned").clone()
    }
}

#[async_trait::async_trait]
impl EventSink for RecordingSink {
    async fn publish(&self, event: PipelineEvent) {
        self.0.lock().expect("sink lock poisoned").push(event);
    }
}

fn acme_terms() -> SearchTerms {
    SearchTerms {
        brands: vec!["Acme".to_string()],
        ..SearchTerms::default()
    }
}

fn disabled_sentiment() -> SentimentClient {
    SentimentClient::new(None, "gemini-1.5-flash", 5)
        .expect("client construction should not fail")
}

fn social_adapter(base_url: &str) -> Box<dyn SourceAdapter> {
    let adapter =
        SocialSource::with_base_url(Some("cycle-token".to_string()), 5, "brandtrack-test", base_url)
            .expect("adapter construction should not fail");
    Box::new(adapter)
}

fn tweet(id: &str, text: &str, likes: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "text": text,
        "author_id": "u1",
        "created_at": "2026-08-25T10:00:00Z",
        "public_metrics": {
            "like_count": likes,
            "retweet_count": 100,
            "reply_count": 50,
            "impression_count": 5000
        }
    })
}

async fn mount_tweets(server: &MockServer, tweets: Vec<serde_json::Value>) {
    let body = serde_json::json!({
        "data": tweets,
        "includes": { "users": [{ "id": "u1", "username": "some_user" }] }
    });
    Mock::given(method("GET"))
        .and(path("/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn insert_test_config(pool: &sqlx::PgPool, name: &str) -> AlertConfigRow {
    let critical = vec!["outage".to_string()];
    let platforms = vec!["twitter".to_string(), "news".to_string()];
    let brands = vec!["Acme".to_string()];
    let keywords: Vec<String> = vec![];
    let recipients: Vec<String> = vec![];
    let headers = serde_json::json!({});

    brandtrack_db::create_alert_config(
        pool,
        &NewAlertConfig {
            name,
            description: "cycle test config",
            negative_sentiment_threshold: -0.5,
            volume_spike_enabled: false,
            volume_spike_pct: 50.0,
            volume_spike_window_minutes: 60,
            engagement_threshold: 1000.0,
            critical_keywords: &critical,
            platforms: &platforms,
            monitored_brands: &brands,
            monitored_keywords: &keywords,
            email_recipients: &recipients,
            email_frequency: "immediate",
            webhook_url: None,
            webhook_headers: &headers,
            is_active: true,
        },
    )
    .await
    .unwrap_or_else(|e| panic!("create_alert_config failed for '{name}': {e}"))
}

async fn run_cycle_with(
    pool: &sqlx::PgPool,
    adapters: Vec<Box<dyn SourceAdapter>>,
    sink: Arc<RecordingSink>,
) -> CycleSummary {
    let collector = Collector::new(
        pool.clone(),
        adapters,
        disabled_sentiment(),
        sink,
        acme_terms(),
    );
    collector.run_cycle("manual").await
}

// ---------------------------------------------------------------------------
// Section 1: Cycle persistence and counters
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn cycle_persists_new_mentions_and_records_the_run(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mount_tweets(
        &server,
        vec![
            tweet("1001", "Acme shipped a great new dashboard", 40),
            tweet("1002", "Loving the new Acme workflow builder", 25),
        ],
    )
    .await;

    let sink = Arc::new(RecordingSink::default());
    let summary = run_cycle_with(&pool, vec![social_adapter(&server.uri())], sink.clone()).await;

    assert_eq!(summary.trigger_source, "manual");
    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.new_candidates, 2);
    assert_eq!(summary.persisted, 2);
    assert_eq!(summary.duplicates, 0);
    assert_eq!(summary.persist_failed, 0);
    // the disabled upstream means every verdict came from the fallback
    assert_eq!(summary.enrichment_failed, 2);
    assert!(summary.failed_sources.is_empty());
    assert_eq!(summary.per_source.len(), 1);
    assert_eq!(summary.per_source[0].source, "twitter");
    assert_eq!(summary.per_source[0].fetched, 2);

    let rows = list_mentions(&pool, &MentionFilter::default(), 10)
        .await
        .expect("list failed");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.processed));
    assert!(rows.iter().all(|row| row.sentiment_label == "positive"));
    assert!(rows
        .iter()
        .all(|row| row.brand_mentions == vec!["Acme".to_string()]));

    let runs = list_collection_runs(&pool, 5).await.expect("runs failed");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "succeeded");
    assert_eq!(runs[0].trigger_source, "manual");
    assert_eq!(runs[0].persisted, 2);
    assert!(runs[0].finished_at.is_some());

    let persisted_events = sink
        .events()
        .iter()
        .filter(|event| matches!(event, PipelineEvent::MentionPersisted { .. }))
        .count();
    assert_eq!(persisted_events, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn second_cycle_reports_duplicates_without_reinserting(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mount_tweets(
        &server,
        vec![
            tweet("1001", "Acme shipped a great new dashboard", 40),
            tweet("1002", "Loving the new Acme workflow builder", 25),
        ],
    )
    .await;

    let sink = Arc::new(RecordingSink::default());
    let first = run_cycle_with(&pool, vec![social_adapter(&server.uri())], sink.clone()).await;
    assert_eq!(first.persisted, 2);

    let second = run_cycle_with(&pool, vec![social_adapter(&server.uri())], sink.clone()).await;
    assert_eq!(second.fetched, 2);
    assert_eq!(second.duplicates, 2);
    assert_eq!(second.new_candidates, 0);
    assert_eq!(second.persisted, 0);

    let rows = list_mentions(&pool, &MentionFilter::default(), 10)
        .await
        .expect("list failed");
    assert_eq!(rows.len(), 2);
    // no new events from the duplicate-only cycle
    assert_eq!(sink.events().len(), 2);

    let runs = list_collection_runs(&pool, 5).await.expect("runs failed");
    assert_eq!(runs.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn failed_source_is_isolated_from_the_rest(pool: sqlx::PgPool) {
    let social_server = MockServer::start().await;
    mount_tweets(
        &social_server,
        vec![tweet("1001", "Acme shipped a great new dashboard", 40)],
    )
    .await;

    let news_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&news_server)
        .await;
    let news = NewsSource::with_base_url(
        Some("news-key".to_string()),
        5,
        "brandtrack-test",
        &news_server.uri(),
    )
    .expect("adapter construction should not fail");

    let sink = Arc::new(RecordingSink::default());
    let summary = run_cycle_with(
        &pool,
        vec![social_adapter(&social_server.uri()), Box::new(news)],
        sink,
    )
    .await;

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.persisted, 1);
    assert_eq!(summary.failed_sources, vec!["news"]);
    assert_eq!(summary.per_source.len(), 2);
    assert_eq!(summary.per_source[1].source, "news");
    assert_eq!(summary.per_source[1].fetched, 0);
}

// ---------------------------------------------------------------------------
// Section 2: Alerting inside the cycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn cycle_fires_alerts_and_records_triggers(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mount_tweets(
        &server,
        vec![tweet(
            "2001",
            "Acme outage: terrible, broken, awful experience for everyone",
            2000,
        )],
    )
    .await;
    let config = insert_test_config(&pool, "Acme health").await;

    let sink = Arc::new(RecordingSink::default());
    let summary = run_cycle_with(&pool, vec![social_adapter(&server.uri())], sink.clone()).await;

    assert_eq!(summary.persisted, 1);
    assert_eq!(summary.alerts_fired, 1);

    let updated = get_alert_config_by_public_id(&pool, config.public_id)
        .await
        .expect("config fetch failed");
    assert_eq!(updated.total_triggered, 1);
    assert!(updated.last_triggered_at.is_some());
    assert!(updated.last_checked_at.is_some());

    let rows = list_mentions(&pool, &MentionFilter::default(), 10)
        .await
        .expect("list failed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sentiment_label, "negative");
    assert_eq!(rows[0].triggered_alerts.0.len(), 1);
    assert_eq!(rows[0].triggered_alerts.0[0].alert_public_id, config.public_id);

    let fired: Vec<Vec<String>> = sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            PipelineEvent::AlertFired { reasons, .. } => Some(reasons),
            PipelineEvent::MentionPersisted { .. } => None,
        })
        .collect();
    assert_eq!(fired.len(), 1);
    assert_eq!(
        fired[0],
        vec![
            "negative sentiment threshold",
            "critical keyword",
            "engagement threshold"
        ]
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn inactive_config_does_not_fire_but_cycle_persists(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mount_tweets(
        &server,
        vec![tweet(
            "2002",
            "Acme outage: terrible, broken, awful experience for everyone",
            2000,
        )],
    )
    .await;
    let config = insert_test_config(&pool, "Dormant").await;
    brandtrack_db::toggle_alert_config(&pool, config.public_id)
        .await
        .expect("toggle failed");

    let sink = Arc::new(RecordingSink::default());
    let summary = run_cycle_with(&pool, vec![social_adapter(&server.uri())], sink).await;

    assert_eq!(summary.persisted, 1);
    assert_eq!(summary.alerts_fired, 0);

    let updated = get_alert_config_by_public_id(&pool, config.public_id)
        .await
        .expect("config fetch failed");
    assert_eq!(updated.total_triggered, 0);
}
