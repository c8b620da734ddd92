//! Scheduled proactive token renewal.

use crate::manager::CredentialManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Renew every account each `period` until `cancel` fires.
///
/// The first sweep runs one full period after start; credentials loaded at
/// startup are refreshed lazily on first use before then. Each sweep runs in
/// its own task so a slow token endpoint never delays the schedule.
pub fn spawn_renewal_task(
    manager: Arc<CredentialManager>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = period.as_secs(), "Token renewal scheduled");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Token renewal stopped");
                    break;
                }
                _ = ticker.tick() => {
                    debug!("Starting renewal sweep");
                    let manager = manager.clone();
                    tokio::spawn(async move {
                        manager.refresh_all().await;
                    });
                }
            }
        }
    })
}
