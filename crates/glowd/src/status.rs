//! Periodic status heartbeat.
//!
//! Read-only: takes a snapshot on a timer and logs the aggregate figures
//! shown in the dashboard header. Never mutates, so it cannot race the
//! store's writers.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::store::Store;
use crate::store::lights;

const STATUS_INTERVAL: Duration = Duration::from_secs(5);

/// Spawn the status task on the current runtime.
pub fn spawn(store: Arc<Store>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(STATUS_INTERVAL);
        loop {
            ticker.tick().await;

            let snapshot = store.snapshot();
            let lit = snapshot.lights.iter().filter(|l| l.is_on).count();
            debug!(
                total_power = snapshot.total_power,
                lit,
                fault = lights::has_fault(&snapshot.lights),
                "status",
            );
        }
    })
}
