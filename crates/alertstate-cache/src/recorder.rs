//! Periodic metrics recording.
//!
//! [`spawn_metrics_recorder`] runs [`StateCache::record_metrics`] on a fixed
//! interval until told to stop, so gauges follow the cache contents
//! without the evaluation loop having to report them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::StateCache;

/// Spawn a task that records cache metrics every `interval`.
///
/// The task exits when `shutdown` changes to `true` or its sender is dropped.
pub fn spawn_metrics_recorder(
    cache: Arc<StateCache>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = interval.as_millis(), "metrics recorder started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = cache.record_metrics();
                    debug!(
                        orgs = snapshot.rules_per_org.len(),
                        instances = snapshot.totals.total(),
                        "recorded state cache metrics"
                    );
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("metrics recorder stopped");
    })
}
