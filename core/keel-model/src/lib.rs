//! Core entity model for Keel.
//!
//! Defines the types the metadata and cache layers share:
//! - [`Entity`]: a generic instance (id, type, JSON payload, dynamic attribute values)
//! - [`AttributeDefinition`]: a dynamic attribute attached to an entity type at runtime
//! - [`PropertyPath`]: dotted attribute paths, with `+code` for dynamic attributes
//! - [`EntityComparator`]: ordering of entities by an attribute path
//! - [`ActionsNotifier`]: role-based fan-out of datasource events to actions

mod attribute;
mod comparator;
mod entity;
mod notifier;
mod path;

pub use attribute::{AttributeDefinition, AttributeType};
pub use comparator::{EntityComparator, NullOrdering};
pub use entity::Entity;
pub use notifier::{
    ActionHandler, ActionsNotifier, CollectionOperation, DatasourceEvent, DatasourceState,
    ListenerRole,
};
pub use path::{PropertyPath, DYNAMIC_ATTRIBUTE_PREFIX};

/// Errors raised by model operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("invalid attribute '{code}' of {entity_type}: {reason}")]
    InvalidAttribute {
        entity_type: String,
        code: String,
        reason: String,
    },
}
