use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::DynamicAttributesManager;

/// Reloads `manager` every `period`, starting one period from now.
///
/// A failed reload is logged and the previous snapshot keeps being served
/// until a later tick succeeds.
///
/// # Panics
/// If `period` is zero.
pub fn spawn_refresh(manager: Arc<DynamicAttributesManager>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match manager.reload().await {
                Ok(timestamp) => debug!(%timestamp, "Scheduled cache refresh"),
                Err(e) => warn!(error = %e, "Scheduled cache refresh failed"),
            }
        }
    })
}
