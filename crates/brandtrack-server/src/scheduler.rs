//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring collection job.

use std::sync::Arc;
use std::time::Duration;

use brandtrack_pipeline::Collector;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Registers the recurring collection job and spawns one immediate cycle,
/// since a repeated job only fires after its first full interval. Returns
/// the running [`JobScheduler`] handle, which must be kept alive for the
/// lifetime of the process; dropping it stops future ticks but never
/// interrupts a cycle already in progress.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    collector: Arc<Collector>,
    interval_minutes: u64,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_collection_job(&scheduler, Arc::clone(&collector), interval_minutes).await?;
    scheduler.start().await?;

    tokio::spawn(async move {
        tracing::info!("scheduler: running startup collection cycle");
        collector.run_cycle("startup").await;
    });

    Ok(scheduler)
}

/// Register the repeating collection job.
async fn register_collection_job(
    scheduler: &JobScheduler,
    collector: Arc<Collector>,
    interval_minutes: u64,
) -> Result<(), JobSchedulerError> {
    let interval = Duration::from_secs(interval_minutes * 60);

    let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let collector = Arc::clone(&collector);

        Box::pin(async move {
            tracing::info!("scheduler: starting collection cycle");
            let summary = collector.run_cycle("scheduled").await;
            tracing::info!(
                persisted = summary.persisted,
                duplicates = summary.duplicates,
                alerts_fired = summary.alerts_fired,
                "scheduler: collection cycle complete"
            );
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
