//! Dynamic-attributes cache for Keel.
//!
//! The cache holds every dynamic attribute definition, grouped by entity
//! type, as one immutable [`CacheSnapshot`] stamped with a
//! [`HybridTimestamp`](keel_types::HybridTimestamp):
//! - [`DynamicAttributesManager`] rebuilds and atomically republishes the
//!   snapshot, and answers conditional fetches without locking
//! - [`DynamicAttributesCacheService`] is the facade callers use, locally or
//!   behind a remote boundary
//! - reloads are triggered explicitly, on a schedule ([`spawn_refresh`]) or
//!   by another node's announcement ([`InvalidationBus`])
//! - [`CacheRuntime`] ties the pieces together for an application's lifetime

mod cluster;
mod error;
mod introspect;
mod manager;
mod runtime;
mod scheduler;
mod service;
mod snapshot;

pub use cluster::{CacheInvalidation, InvalidationBus, spawn_invalidation_listener};
pub use error::CacheError;
pub use introspect::{DeclaredAttributeSource, SchemaIntrospector};
pub use manager::DynamicAttributesManager;
pub use runtime::{CacheConfig, CacheRuntime};
pub use scheduler::spawn_refresh;
pub use service::{DynamicAttributesCacheService, LocalCacheService};
pub use snapshot::{AttributeIndex, CacheSnapshot, CacheUpdate};
