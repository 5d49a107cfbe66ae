mod api;
mod middleware;
mod scheduler;

use std::net::SocketAddr;
use std::sync::Arc;

use brandtrack_pipeline::{BroadcastSink, Collector};
use brandtrack_sentiment::SentimentClient;
use brandtrack_sources::SearchTerms;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::RateLimitState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = brandtrack_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = ?config.env, addr = %config.bind_addr, "starting brandtrack server");

    let pool_config = brandtrack_db::PoolConfig::from_app_config(&config);
    let pool = brandtrack_db::connect_pool(&config.database_url, pool_config).await?;
    brandtrack_db::run_migrations(&pool).await?;

    let adapters = brandtrack_sources::build_adapters(&config)?;
    let sentiment = SentimentClient::from_config(&config)?;
    let sink = Arc::new(BroadcastSink::default());
    let collector = Arc::new(Collector::new(
        pool.clone(),
        adapters,
        sentiment,
        sink,
        SearchTerms::from_config(&config),
    ));

    let _scheduler =
        scheduler::build_scheduler(Arc::clone(&collector), config.collect_interval_minutes).await?;

    let app = build_app(AppState { pool, collector }, RateLimitState::default());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
