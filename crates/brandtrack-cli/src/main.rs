//! Operator command line interface.
//!
//! Thin wrappers over the pipeline and database crates. The long-running
//! server owns the collection schedule; the CLI runs the same operations
//! inline for one-off use. Every command needs `DATABASE_URL`; `collect`
//! additionally reads whichever source and sentiment credentials are set.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "brandtrack-cli")]
#[command(about = "Brand mention tracking command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one collection cycle inline and print its summary
    Collect,
    /// Print the dashboard summary for an analytics window as JSON
    Analytics {
        /// Window to aggregate over (1h, 24h, 7d or 30d)
        #[arg(long, default_value = "24h")]
        window: String,
    },
    /// Apply migrations and insert demo mentions plus a starter alert config
    Seed,
    /// Show recent collection runs
    Runs {
        /// Maximum number of runs to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = brandtrack_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let pool_config = brandtrack_db::PoolConfig::from_app_config(&config);
    let pool = brandtrack_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Collect => commands::run_collect(&pool, &config).await,
        Commands::Analytics { window } => commands::run_analytics(&pool, &window).await,
        Commands::Seed => commands::run_seed(&pool).await,
        Commands::Runs { limit } => commands::run_runs(&pool, limit).await,
    }
}
