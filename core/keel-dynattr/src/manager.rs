//! Owner of the published snapshot.
//!
//! Reloads build the next snapshot privately and publish it with a single
//! atomic pointer swap. Readers never lock and always see one complete
//! generation. A failed reload publishes nothing.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use arc_swap::ArcSwapOption;
use keel_metadata::MetadataLoader;
use keel_types::HybridTimestamp;
use tracing::{info, warn};

use crate::introspect::SchemaIntrospector;
use crate::snapshot::{AttributeIndex, CacheSnapshot, CacheUpdate};
use crate::CacheError;

pub struct DynamicAttributesManager {
    loader: MetadataLoader,
    introspector: Arc<dyn SchemaIntrospector>,
    current: ArcSwapOption<CacheSnapshot>,
    /// Last stamp issued. Held only while stamping and swapping.
    clock: Mutex<HybridTimestamp>,
}

impl DynamicAttributesManager {
    /// Creates an empty manager. Nothing is served until the first
    /// successful [`load_cache`](Self::load_cache).
    pub fn new(loader: MetadataLoader, introspector: Arc<dyn SchemaIntrospector>) -> Self {
        Self {
            loader,
            introspector,
            current: ArcSwapOption::empty(),
            clock: Mutex::new(HybridTimestamp::EPOCH),
        }
    }

    /// Recomputes every definition and publishes a new snapshot.
    ///
    /// Returns the new snapshot's timestamp. On error the previously
    /// published snapshot stays in place.
    pub fn load_cache(&self) -> Result<HybridTimestamp, CacheError> {
        let started = Instant::now();

        let index = self.build_index().inspect_err(|e| {
            warn!(error = %e, "Dynamic attributes reload failed, keeping previous snapshot");
        })?;
        let attributes = index.len();
        let snapshot = self.publish(index);

        info!(
            timestamp = %snapshot.timestamp(),
            attributes,
            entity_types = snapshot.entity_types().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dynamic attributes cache loaded"
        );
        Ok(snapshot.timestamp())
    }

    /// Runs [`load_cache`](Self::load_cache) on the blocking pool.
    pub async fn reload(self: &Arc<Self>) -> Result<HybridTimestamp, CacheError> {
        let manager = Arc::clone(self);
        tokio::task::spawn_blocking(move || manager.load_cache())
            .await
            .map_err(|e| CacheError::TaskFailed(e.to_string()))?
    }

    /// Returns the current snapshot if it is strictly newer than `since`.
    ///
    /// Never triggers a reload. Before the first successful load this is
    /// always [`CacheUpdate::Unchanged`].
    pub fn get_cache_if_newer(&self, since: HybridTimestamp) -> CacheUpdate {
        match self.current.load_full() {
            Some(snapshot) if snapshot.timestamp() > since => CacheUpdate::Newer(snapshot),
            _ => CacheUpdate::Unchanged,
        }
    }

    pub fn current(&self) -> Option<Arc<CacheSnapshot>> {
        self.current.load_full()
    }

    /// Folds a stamp seen on another node into the local clock, so the next
    /// local snapshot is stamped after it.
    pub fn observe(&self, remote: HybridTimestamp) {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        *clock = clock.receive(&remote);
    }

    fn build_index(&self) -> Result<AttributeIndex, CacheError> {
        let namespaces = self.loader.entity_namespaces()?;
        let definitions = self.introspector.introspect(&namespaces)?;
        AttributeIndex::build(&namespaces, definitions)
    }

    fn publish(&self, index: AttributeIndex) -> Arc<CacheSnapshot> {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        let timestamp = clock.tick();
        *clock = timestamp;

        let snapshot = Arc::new(CacheSnapshot::new(timestamp, index));
        self.current.store(Some(Arc::clone(&snapshot)));
        snapshot
    }
}
