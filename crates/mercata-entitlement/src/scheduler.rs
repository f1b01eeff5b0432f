//! Time-triggered driver for the expiration sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mercata_core::repository::{PlanRepository, TenantRepository};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::lifecycle::LifecycleManager;

/// Periodic trigger for [`LifecycleManager::sweep_expirations`].
///
/// Holds an explicit reference to the lifecycle service — there is no
/// module-level singleton to reach through. Construct one and spawn
/// [`run`](SweepScheduler::run) as a background task.
pub struct SweepScheduler<T: TenantRepository, P: PlanRepository> {
    lifecycle: Arc<LifecycleManager<T, P>>,
    cadence: Duration,
}

impl<T: TenantRepository, P: PlanRepository> SweepScheduler<T, P> {
    pub fn new(lifecycle: Arc<LifecycleManager<T, P>>, cadence: Duration) -> Self {
        Self { lifecycle, cadence }
    }

    /// Sweep once per cadence interval, forever.
    ///
    /// The first sweep runs immediately on startup. A failed run is
    /// logged and retried on the next tick; the loop itself never exits.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.lifecycle.sweep_expirations(Utc::now()).await {
                Ok(outcome) => {
                    info!(
                        deactivated = outcome.deactivated_count,
                        "scheduled expiration sweep finished"
                    );
                }
                Err(e) => {
                    error!(error = %e, "scheduled expiration sweep failed");
                }
            }
        }
    }
}
