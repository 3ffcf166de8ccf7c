//! Error types for the dynamic-attributes cache.

use keel_metadata::MetadataError;
use keel_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("schema introspection failed: {0}")]
    Introspection(String),

    #[error(transparent)]
    InvalidAttribute(#[from] ModelError),

    #[error("attribute '{code}' is declared for unknown entity type {entity_type}")]
    UnknownEntityType { entity_type: String, code: String },

    #[error("attribute '{code}' is declared twice for {entity_type}")]
    DuplicateAttribute { entity_type: String, code: String },

    #[error("reload task failed: {0}")]
    TaskFailed(String),
}

impl CacheError {
    /// True when the failure comes from the configuration rather than from
    /// reading it or from the runtime.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            CacheError::Metadata(e) => e.is_configuration_error(),
            CacheError::InvalidAttribute(_)
            | CacheError::UnknownEntityType { .. }
            | CacheError::DuplicateAttribute { .. } => true,
            CacheError::Introspection(_) | CacheError::TaskFailed(_) => false,
        }
    }
}
