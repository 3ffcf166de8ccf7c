//! Sources of dynamic attribute definitions.

use std::sync::Arc;

use keel_metadata::{MetadataError, NamespaceMap, ResourceResolver};
use keel_model::AttributeDefinition;
use serde::Deserialize;
use tracing::debug;

use crate::CacheError;

/// Supplies the live set of dynamic attribute definitions.
///
/// Called on every reload with the freshly merged namespace map. Must not
/// depend on the currently published snapshot.
pub trait SchemaIntrospector: Send + Sync {
    fn introspect(&self, namespaces: &NamespaceMap) -> Result<Vec<AttributeDefinition>, CacheError>;
}

/// Fixed definitions, for embedding and tests.
impl SchemaIntrospector for Vec<AttributeDefinition> {
    fn introspect(&self, _: &NamespaceMap) -> Result<Vec<AttributeDefinition>, CacheError> {
        Ok(self.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AttributesDocument {
    #[serde(default)]
    attributes: Vec<AttributeDefinition>,
}

/// Reads definitions from `{ "attributes": [...] }` documents.
///
/// Documents are re-read on every reload, so edits take effect on the next
/// `load_cache`.
#[derive(Clone)]
pub struct DeclaredAttributeSource {
    resources: Arc<dyn ResourceResolver>,
    paths: Vec<String>,
}

impl DeclaredAttributeSource {
    pub fn new(resources: Arc<dyn ResourceResolver>, paths: Vec<String>) -> Self {
        Self { resources, paths }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    fn read(&self, path: &str) -> Result<AttributesDocument, MetadataError> {
        let stream = self.resources.resolve(path)?;
        serde_json::from_reader(stream).map_err(|source| {
            if source.is_io() {
                MetadataError::Io {
                    path: path.into(),
                    source: source.into(),
                }
            } else {
                MetadataError::Malformed {
                    path: path.into(),
                    source,
                }
            }
        })
    }
}

impl SchemaIntrospector for DeclaredAttributeSource {
    fn introspect(&self, namespaces: &NamespaceMap) -> Result<Vec<AttributeDefinition>, CacheError> {
        let mut definitions = Vec::new();
        for path in &self.paths {
            let doc = self.read(path)?;
            debug!(
                path = %path,
                attributes = doc.attributes.len(),
                entity_types = namespaces.member_count(),
                "Read attribute definitions"
            );
            definitions.extend(doc.attributes);
        }
        Ok(definitions)
    }
}
