//! Core type definitions for Keel.
//!
//! Small, dependency-light types shared by every other crate:
//! - Hybrid Logical Clock timestamps used to stamp cache generations
//! - Node identifiers for cluster-wide cache invalidation

mod ids;
mod timestamp;

pub use ids::NodeId;
pub use timestamp::HybridTimestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid node id: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid timestamp: '{0}'")]
    InvalidTimestamp(String),
}
