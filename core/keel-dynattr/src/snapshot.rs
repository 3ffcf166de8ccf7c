//! Immutable, timestamped views of the dynamic attribute definitions.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use keel_metadata::NamespaceMap;
use keel_model::AttributeDefinition;
use keel_types::HybridTimestamp;
use serde::{Deserialize, Serialize};

use crate::CacheError;

/// Validated attribute definitions grouped by entity type, not yet stamped.
///
/// Within an entity type, definitions are ordered by `(order_no, code)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeIndex {
    by_entity: BTreeMap<String, Vec<AttributeDefinition>>,
}

impl AttributeIndex {
    /// Validates and groups `definitions`.
    ///
    /// Every definition must be internally consistent, belong to an entity
    /// type known to `namespaces`, and have a code unique within its type.
    pub fn build(
        namespaces: &NamespaceMap,
        definitions: Vec<AttributeDefinition>,
    ) -> Result<Self, CacheError> {
        let mut by_entity: BTreeMap<String, Vec<AttributeDefinition>> = BTreeMap::new();

        for definition in definitions {
            definition.validate()?;
            if !namespaces.contains_member(&definition.entity_type) {
                return Err(CacheError::UnknownEntityType {
                    entity_type: definition.entity_type,
                    code: definition.code,
                });
            }

            match by_entity.entry(definition.entity_type.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(vec![definition]);
                }
                Entry::Occupied(mut slot) => {
                    if slot.get().iter().any(|d| d.code == definition.code) {
                        return Err(CacheError::DuplicateAttribute {
                            entity_type: definition.entity_type,
                            code: definition.code,
                        });
                    }
                    slot.get_mut().push(definition);
                }
            }
        }

        for list in by_entity.values_mut() {
            list.sort_by(|a, b| a.order_no.cmp(&b.order_no).then_with(|| a.code.cmp(&b.code)));
        }

        Ok(Self { by_entity })
    }

    pub fn len(&self) -> usize {
        self.by_entity.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}

/// One published generation of the dynamic attribute definitions.
///
/// Never mutated after construction; a reload publishes a new snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    timestamp: HybridTimestamp,
    attributes: BTreeMap<String, Vec<AttributeDefinition>>,
}

impl CacheSnapshot {
    pub fn new(timestamp: HybridTimestamp, index: AttributeIndex) -> Self {
        Self {
            timestamp,
            attributes: index.by_entity,
        }
    }

    pub fn timestamp(&self) -> HybridTimestamp {
        self.timestamp
    }

    /// Definitions for `entity_type`, in display order. Empty for entity
    /// types without dynamic attributes.
    pub fn attributes_for(&self, entity_type: &str) -> &[AttributeDefinition] {
        self.attributes
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn attribute(&self, entity_type: &str, code: &str) -> Option<&AttributeDefinition> {
        self.attributes_for(entity_type).iter().find(|d| d.code == code)
    }

    /// Entity types that have at least one dynamic attribute, sorted.
    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Total number of definitions.
    pub fn len(&self) -> usize {
        self.attributes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Result of a conditional fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheUpdate {
    /// The current snapshot is newer than the caller's.
    Newer(Arc<CacheSnapshot>),
    /// The caller's snapshot is current, or nothing has been loaded yet.
    Unchanged,
}

impl CacheUpdate {
    pub fn snapshot(&self) -> Option<&Arc<CacheSnapshot>> {
        match self {
            CacheUpdate::Newer(snapshot) => Some(snapshot),
            CacheUpdate::Unchanged => None,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, CacheUpdate::Unchanged)
    }
}
