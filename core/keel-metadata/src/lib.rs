//! Entity metadata configuration for Keel.
//!
//! Two kinds of JSON documents describe which entity classes exist:
//! - metadata documents declare root namespaces (`metadata_models`), their
//!   classes, per-entity annotation overrides, and may `include` other
//!   metadata documents
//! - persistence descriptors list persisted classes, each of which is
//!   attached to the declared namespace that owns its package
//!
//! [`MetadataLoader`] merges them into a [`NamespaceMap`] in which every class
//! belongs to exactly one namespace. Documents are read through a
//! [`ResourceResolver`] supplied by the host.

mod document;
mod error;
mod loader;
mod namespace;
mod resources;
mod sources;

pub use error::{ConfigurationError, MetadataError};
pub use loader::{EntityAnnotations, MetadataLoader};
pub use namespace::{Namespace, NamespaceMap};
pub use resources::{FsResources, InMemoryResources, ResourceResolver, ResourceStream};
pub use sources::{METADATA_CONFIG, MetadataSources, PERSISTENCE_CONFIG};
