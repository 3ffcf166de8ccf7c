use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path::PropertyPath;

/// A generic entity instance.
///
/// Static attributes live in `data` as JSON; values of runtime-attached
/// dynamic attributes live in `dynamic_attributes`, keyed by attribute code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub entity_type: String,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub dynamic_attributes: Map<String, Value>,
}

impl Entity {
    /// Creates an entity with no dynamic attribute values.
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            data,
            dynamic_attributes: Map::new(),
        }
    }

    /// Value of a direct (top-level) static attribute.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Value of a dynamic attribute by code.
    pub fn dynamic_value(&self, code: &str) -> Option<&Value> {
        self.dynamic_attributes.get(code)
    }

    pub fn set_dynamic_value(&mut self, code: impl Into<String>, value: Value) {
        self.dynamic_attributes.insert(code.into(), value);
    }

    /// Resolves a possibly nested property path.
    ///
    /// A first segment of the form `+code` reads the dynamic attribute
    /// `code`; remaining segments descend into nested JSON objects. Any
    /// missing link yields `None`.
    pub fn value_ex(&self, path: &PropertyPath) -> Option<&Value> {
        let mut segments = path.segments().iter();
        let first = segments.next()?;
        let root = match PropertyPath::dynamic_code(first) {
            Some(code) => self.dynamic_value(code)?,
            None => self.value(first)?,
        };
        segments.try_fold(root, |current, segment| current.get(segment.as_str()))
    }
}
