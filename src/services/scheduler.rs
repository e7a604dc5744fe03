// src/services/scheduler.rs
use log::{error, info};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use super::cache::CacheGateway;

/// Schedules the expired-row purge. Keep the returned scheduler alive for as
/// long as the job should run.
pub async fn start_cache_purge(gateway: Arc<CacheGateway>, cron: &str) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_id, _scheduler| {
        let gateway = gateway.clone();
        Box::pin(async move {
            match gateway.clear_expired().await {
                Ok(deleted) => info!("Scheduled purge removed {} expired cache entries", deleted),
                Err(e) => error!("Scheduled cache purge failed: {}", e),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!("Cache purge scheduled with cron '{}'", cron);
    Ok(scheduler)
}
