//! Background driver for scheduled syncs.
//!
//! Wakes every tick period and asks the service to run whatever schedules are due.
//! Runs are sequential, so a slow shop delays the next tick instead of
//! overlapping with it.

use std::time::Duration;
use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use crate::service::CatalogService;

pub struct SyncScheduler {
    service: CatalogService,
    period: Duration,
}

impl SyncScheduler {
    pub fn new(service: CatalogService, tick: Duration) -> Self {
        Self { service, period: tick.max(Duration::from_secs(1)) }
    }

    /// One pass over the schedules. Returns how many syncs were started.
    pub async fn tick(&self) -> usize {
        match self.service.run_due_syncs(Utc::now()).await {
            Ok(runs) => runs.len(),
            Err(err) => {
                tracing::error!(error = %err, "could not load sync schedules");
                0
            }
        }
    }

    /// Loops until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(tick_secs = self.period.as_secs(), "sync scheduler started");
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let started = self.tick().await;
                    if started > 0 { tracing::debug!(started, "scheduled syncs ran"); }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("sync scheduler stopped");
                        break;
                    }
                }
            }
        }
    }
}
