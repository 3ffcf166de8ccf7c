//! On-disk shape of metadata documents and persistence descriptors.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MetadataDocument {
    pub include: Vec<IncludeRef>,
    pub metadata_models: Vec<MetadataModel>,
    pub annotations: Vec<EntityAnnotationsDecl>,
}

/// `"other.json"` or `{ "file": "other.json" }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum IncludeRef {
    Path(String),
    File { file: String },
}

impl IncludeRef {
    pub fn file(&self) -> &str {
        match self {
            IncludeRef::Path(file) | IncludeRef::File { file } => file.trim(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MetadataModel {
    #[serde(default)]
    pub root_package: String,
    #[serde(default)]
    pub classes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EntityAnnotationsDecl {
    pub class: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub properties: Vec<PropertyAnnotationsDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PropertyAnnotationsDecl {
    pub name: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PersistenceDocument {
    pub persistence_unit: Option<PersistenceUnit>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PersistenceUnit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
}
