//! Request/response boundary over the cache manager.

use std::sync::Arc;

use keel_types::{HybridTimestamp, NodeId};
use tracing::debug;

use crate::cluster::{CacheInvalidation, InvalidationBus};
use crate::snapshot::CacheUpdate;
use crate::{CacheError, DynamicAttributesManager};

/// What local and remote callers may do with the cache.
pub trait DynamicAttributesCacheService: Send + Sync {
    /// Reloads the cache. Failures are reported; the previous snapshot
    /// stays in service.
    fn load_cache(&self) -> Result<(), CacheError>;

    /// The current snapshot if it is newer than `since`.
    fn get_cache_if_newer(&self, since: HybridTimestamp) -> CacheUpdate;
}

/// In-process service backed by a [`DynamicAttributesManager`].
///
/// When attached to an [`InvalidationBus`], a successful `load_cache`
/// announces the new generation to the other nodes.
#[derive(Clone)]
pub struct LocalCacheService {
    manager: Arc<DynamicAttributesManager>,
    node: NodeId,
    bus: Option<InvalidationBus>,
}

impl LocalCacheService {
    pub fn new(manager: Arc<DynamicAttributesManager>) -> Self {
        Self {
            manager,
            node: NodeId::new(),
            bus: None,
        }
    }

    pub fn with_bus(manager: Arc<DynamicAttributesManager>, node: NodeId, bus: InvalidationBus) -> Self {
        Self {
            manager,
            node,
            bus: Some(bus),
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn manager(&self) -> &Arc<DynamicAttributesManager> {
        &self.manager
    }
}

impl DynamicAttributesCacheService for LocalCacheService {
    fn load_cache(&self) -> Result<(), CacheError> {
        let timestamp = self.manager.load_cache()?;
        if let Some(bus) = &self.bus {
            let listeners = bus.publish(CacheInvalidation {
                origin: self.node,
                timestamp,
            });
            debug!(%timestamp, listeners, "Announced cache reload");
        }
        Ok(())
    }

    fn get_cache_if_newer(&self, since: HybridTimestamp) -> CacheUpdate {
        self.manager.get_cache_if_newer(since)
    }
}
