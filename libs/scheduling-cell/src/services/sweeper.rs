// libs/scheduling-cell/src/services/sweeper.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use shared_database::SchedulingStore;

use crate::clock::TimeSource;
use crate::models::SchedulingError;

/// Background loop that finalizes elapsed appointments.
///
/// Every interval it completes all appointments still scheduled past their
/// start time. The transition is idempotent and re-checked per row inside
/// the store, so an appointment cancelled in the meantime is skipped and a
/// pass interrupted mid-way leaves the remaining rows for the next cycle.
pub struct ExpirySweeper {
    store: Arc<dyn SchedulingStore>,
    time_source: Arc<dyn TimeSource>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        time_source: Arc<dyn TimeSource>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            time_source,
            interval,
        }
    }

    /// Run a single sweep pass against the current instant.
    pub async fn sweep_once(&self) -> Result<u64, SchedulingError> {
        let now = self.time_source.now_utc();
        let completed = self.store.complete_elapsed(now).await?;
        if completed > 0 {
            info!("Sweep completed {} elapsed appointments", completed);
        } else {
            debug!("Sweep found no elapsed appointments");
        }
        Ok(completed)
    }

    /// Run until the shutdown signal flips to true.
    ///
    /// A failing pass is logged and retried on the next cycle; the loop
    /// itself never terminates on a store error.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Expiry sweeper started with a {:?} interval", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately; consume it so the loop
        // sleeps a full interval before its first pass.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.sweep_once().await {
                        warn!("Sweep pass failed, retrying next cycle: {}", err);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Expiry sweeper stopped");
    }
}
