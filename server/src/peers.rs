//! Forwarding of local cache invalidations to other nodes.

use keel_dynattr::CacheInvalidation;
use keel_types::NodeId;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::INVALIDATE_ROUTE;

/// Posts every invalidation originating on `node` to each peer's
/// invalidation route.
///
/// Invalidations received from other nodes are not forwarded again. Peers
/// that cannot be reached are logged and skipped; they catch up on their
/// next scheduled refresh.
pub fn spawn_peer_forwarder(
    node: NodeId,
    mut receiver: broadcast::Receiver<CacheInvalidation>,
    peers: Vec<String>,
    client: reqwest::Client,
) -> JoinHandle<()> {
    let targets: Vec<String> = peers
        .iter()
        .map(|peer| format!("{}{}", peer.trim_end_matches('/'), INVALIDATE_ROUTE))
        .collect();

    tokio::spawn(async move {
        loop {
            let message = match receiver.recv().await {
                Ok(message) if message.origin == node => message,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Peer forwarder lagged, dropping invalidations");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            for target in &targets {
                match client.post(target).json(&message).send().await {
                    Ok(resp) if resp.status().is_success() => {
                        debug!(peer = %target, timestamp = %message.timestamp, "Forwarded invalidation");
                    }
                    Ok(resp) => {
                        warn!(peer = %target, status = %resp.status(), "Peer rejected invalidation");
                    }
                    Err(e) => {
                        warn!(peer = %target, error = %e, "Failed to forward invalidation");
                    }
                }
            }
        }
    })
}
