//! Command handlers, called from `main` once the pool and config exist.

use std::sync::Arc;

use brandtrack_core::AppConfig;
use brandtrack_pipeline::{dashboard_summary, Collector, NullSink, TimeWindow};
use brandtrack_sentiment::SentimentClient;
use brandtrack_sources::SearchTerms;
use chrono::Utc;

/// Run one collection cycle inline and print its summary as JSON.
///
/// Builds the same collector the server drives on a schedule, but with a
/// no-op event sink, and blocks until the cycle finishes. Per-source and
/// per-text failures are absorbed into the summary counters rather than
/// aborting the cycle.
///
/// # Errors
///
/// Returns an error if an adapter or the sentiment client cannot be built
/// from the environment.
pub(crate) async fn run_collect(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let adapters = brandtrack_sources::build_adapters(config)?;
    let sentiment = SentimentClient::from_config(config)?;
    let collector = Collector::new(
        pool.clone(),
        adapters,
        sentiment,
        Arc::new(NullSink),
        SearchTerms::from_config(config),
    );

    let summary = collector.run_cycle("cli").await;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Print the dashboard summary for one analytics window as JSON.
///
/// # Errors
///
/// Returns an error if `window` is not one of the documented values or the
/// database query fails.
pub(crate) async fn run_analytics(pool: &sqlx::PgPool, window: &str) -> anyhow::Result<()> {
    let window: TimeWindow = window.parse()?;
    let rows = brandtrack_db::list_mentions_since(pool, window.start(Utc::now())).await?;
    let summary = dashboard_summary(window, &rows);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Apply pending migrations, then load the demo dataset.
///
/// Safe to re-run: mentions dedupe on their natural key and the starter
/// alert config on its name.
///
/// # Errors
///
/// Returns an error if a migration or an insert fails.
pub(crate) async fn run_seed(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    brandtrack_db::run_migrations(pool).await?;
    let summary = brandtrack_db::seed_demo_data(pool).await?;

    if summary.mentions_inserted == 0 && summary.alert_configs_inserted == 0 {
        println!("demo data already present; nothing to insert");
    } else {
        println!(
            "seeded {} mentions and {} alert configs",
            summary.mentions_inserted, summary.alert_configs_inserted
        );
    }
    Ok(())
}

/// Show recent collection runs, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = brandtrack_db::list_collection_runs(pool, limit.clamp(1, 200)).await?;

    if runs.is_empty() {
        println!("no collection runs recorded yet; run `collect` first");
        return Ok(());
    }

    let header = format!(
        "{:<38}{:<11}{:<11}{:<9}{:<6}{:<11}{:<8}STARTED",
        "RUN", "TRIGGER", "STATUS", "FETCHED", "NEW", "PERSISTED", "ALERTS"
    );
    println!("{header}");
    for run in &runs {
        println!(
            "{:<38}{:<11}{:<11}{:<9}{:<6}{:<11}{:<8}{}",
            run.public_id,
            run.trigger_source,
            run.status,
            run.fetched,
            run.new_candidates,
            run.persisted,
            run.alerts_fired,
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    Ok(())
}
