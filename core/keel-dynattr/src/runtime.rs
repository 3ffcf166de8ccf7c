use std::sync::Arc;
use std::time::Duration;

use keel_types::NodeId;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cluster::{InvalidationBus, spawn_invalidation_listener};
use crate::scheduler::spawn_refresh;
use crate::service::LocalCacheService;
use crate::{CacheError, DynamicAttributesManager};

/// Configuration for the cache runtime.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Period of the scheduled refresh. `None` disables it.
    pub refresh_interval: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Some(Duration::from_secs(300)),
        }
    }
}

/// A started cache: the manager, its service facade, and the background
/// reload triggers.
///
/// Dropping the runtime stops the triggers.
pub struct CacheRuntime {
    node: NodeId,
    manager: Arc<DynamicAttributesManager>,
    service: LocalCacheService,
    bus: InvalidationBus,
    tasks: Vec<JoinHandle<()>>,
}

impl CacheRuntime {
    /// Loads the cache for the first time and starts the triggers.
    ///
    /// A failing initial load is returned and nothing is started.
    pub async fn start(
        manager: Arc<DynamicAttributesManager>,
        bus: InvalidationBus,
        config: CacheConfig,
    ) -> Result<Self, CacheError> {
        let node = NodeId::new();
        // Subscribe first so announcements made during the initial load are
        // not lost.
        let receiver = bus.subscribe();
        let timestamp = manager.reload().await?;

        let mut tasks = vec![spawn_invalidation_listener(
            node,
            Arc::clone(&manager),
            receiver,
        )];
        if let Some(period) = config.refresh_interval.filter(|p| !p.is_zero()) {
            tasks.push(spawn_refresh(Arc::clone(&manager), period));
        }

        info!(
            %node,
            %timestamp,
            refresh_secs = config.refresh_interval.map(|p| p.as_secs()),
            "Dynamic attributes cache started"
        );

        let service = LocalCacheService::with_bus(Arc::clone(&manager), node, bus.clone());
        Ok(Self {
            node,
            manager,
            service,
            bus,
            tasks,
        })
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn manager(&self) -> &Arc<DynamicAttributesManager> {
        &self.manager
    }

    pub fn service(&self) -> &LocalCacheService {
        &self.service
    }

    pub fn bus(&self) -> &InvalidationBus {
        &self.bus
    }

    /// Stops the background triggers.
    pub fn shutdown(self) {
        info!(node = %self.node, "Dynamic attributes cache stopping");
    }
}

impl Drop for CacheRuntime {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
