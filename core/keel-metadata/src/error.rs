//! Error types for metadata loading.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("resource not found: {path}")]
    ResourceNotFound { path: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl MetadataError {
    /// True for semantic and structural problems in the configuration
    /// itself, as opposed to documents that could not be read.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            MetadataError::Configuration(_) | MetadataError::Malformed { .. }
        )
    }
}

/// Semantic violations found while merging configuration documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("{property} property is not defined")]
    MissingProperty { property: String },

    #[error("metadata_models/root_package is empty in {path}")]
    BlankRootPackage { path: String },

    #[error("document {path} has no persistence_unit")]
    MissingPersistenceUnit { path: String },

    #[error("class {member} is already included into model {namespace}")]
    DuplicateMember { member: String, namespace: String },

    #[error(
        "can not find a model for class {member}: the class's package must be inside of some model's root package"
    )]
    NoOwningNamespace { member: String },

    #[error("cyclic include of {path} ({chain})")]
    CyclicInclude { path: String, chain: String },

    #[error("include '{include}' in {path} points outside the resource root")]
    InvalidInclude { path: String, include: String },
}
