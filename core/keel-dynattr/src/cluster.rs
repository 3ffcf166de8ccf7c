//! Cross-node cache invalidation.
//!
//! After a node reloads on explicit request it announces the new generation
//! on the [`InvalidationBus`]. Listener tasks on the other nodes reload in
//! response. The bus is an in-process broadcast channel; carrying messages
//! between processes is up to the host (see the server's peer forwarding).

use std::sync::Arc;

use keel_types::{HybridTimestamp, NodeId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::DynamicAttributesManager;

const DEFAULT_CAPACITY: usize = 64;

/// Announcement that `origin` published a snapshot stamped `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheInvalidation {
    pub origin: NodeId,
    pub timestamp: HybridTimestamp,
}

#[derive(Debug, Clone)]
pub struct InvalidationBus {
    sender: broadcast::Sender<CacheInvalidation>,
}

impl InvalidationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Broadcasts `message`. Returns how many listeners will receive it;
    /// zero when nobody is subscribed.
    pub fn publish(&self, message: CacheInvalidation) -> usize {
        self.sender.send(message).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheInvalidation> {
        self.sender.subscribe()
    }
}

impl Default for InvalidationBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Reloads `manager` whenever another node announces a new generation.
///
/// Own announcements are ignored. If the receiver lags behind, one reload
/// covers everything that was missed. The task ends when the bus closes.
pub fn spawn_invalidation_listener(
    node: NodeId,
    manager: Arc<DynamicAttributesManager>,
    mut receiver: broadcast::Receiver<CacheInvalidation>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(message) if message.origin == node => {
                    debug!(timestamp = %message.timestamp, "Ignoring own invalidation");
                }
                Ok(message) => {
                    info!(
                        origin = %message.origin,
                        timestamp = %message.timestamp,
                        "Cache invalidated by peer, reloading"
                    );
                    manager.observe(message.timestamp);
                    if let Err(e) = manager.reload().await {
                        warn!(error = %e, "Reload after peer invalidation failed");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Invalidation listener lagged, reloading");
                    if let Err(e) = manager.reload().await {
                        warn!(error = %e, "Reload after lag failed");
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Invalidation bus closed");
                    break;
                }
            }
        }
    })
}
