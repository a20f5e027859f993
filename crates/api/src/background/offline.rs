//! Periodic offline alarm sweep.
//!
//! Systems are marked `offline` by the ingestion layer when their transport
//! drops. This task sweeps on a fixed interval and raises the deduplicated
//! offline alarm for every enabled, active system still sitting in that
//! state, so an outage surfaces even when no handler is watching. Runs
//! until `cancel` is triggered.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use sitewatch_db::repositories::SystemRepo;
use sitewatch_db::DbPool;
use sitewatch_events::EventBus;

use crate::services::alarms;

/// Run the offline detection loop.
pub async fn run(
    pool: DbPool,
    bus: Arc<EventBus>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Offline detector started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Offline detector stopping");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = sweep(&pool, &bus).await {
                    tracing::error!(error = %e, "Offline sweep failed");
                }
            }
        }
    }
}

/// One sweep pass: raise offline alarms for every offline candidate.
async fn sweep(pool: &DbPool, bus: &EventBus) -> Result<(), sqlx::Error> {
    let candidates = SystemRepo::list_offline_candidates(pool).await?;
    for system in &candidates {
        match alarms::raise_offline_alarm(pool, bus, system).await {
            Ok(Some(alarm)) => {
                tracing::warn!(
                    system_id = system.id,
                    alarm_id = alarm.id,
                    "Offline alarm raised"
                );
            }
            Ok(None) => {} // already alarmed
            Err(e) => {
                tracing::error!(system_id = system.id, error = %e, "Offline alarm failed");
            }
        }
    }
    Ok(())
}
