//! Builds the entity namespace map and annotation overrides from the
//! configured documents.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::document::{MetadataDocument, PersistenceDocument};
use crate::{ConfigurationError, MetadataError, MetadataSources, NamespaceMap, ResourceResolver};

/// Annotation overrides declared for an entity class, or for one of its
/// properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityAnnotations {
    /// Entity class name, or property name for property entries.
    pub name: String,
    pub annotations: BTreeMap<String, String>,
    pub attribute_annotations: Vec<EntityAnnotations>,
}

impl EntityAnnotations {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Reads metadata documents and persistence descriptors through a
/// [`ResourceResolver`].
///
/// Holds no state between calls; every operation reads the documents afresh.
#[derive(Clone)]
pub struct MetadataLoader {
    resources: Arc<dyn ResourceResolver>,
    sources: MetadataSources,
}

/// Include bookkeeping for one load.
#[derive(Default)]
struct IncludeWalk {
    /// Documents currently being expanded, outermost first.
    active: Vec<String>,
    /// Documents already merged in this load.
    done: HashSet<String>,
}

impl MetadataLoader {
    pub fn new(resources: Arc<dyn ResourceResolver>, sources: MetadataSources) -> Self {
        Self { resources, sources }
    }

    pub fn sources(&self) -> &MetadataSources {
        &self.sources
    }

    /// Merges every metadata document (includes first) and then every
    /// persistence descriptor into a fresh [`NamespaceMap`].
    pub fn entity_namespaces(&self) -> Result<NamespaceMap, MetadataError> {
        let mut map = NamespaceMap::new();

        self.for_each_metadata_document(|path, doc| {
            for model in &doc.metadata_models {
                let root = model.root_package.trim();
                if root.is_empty() {
                    return Err(ConfigurationError::BlankRootPackage { path: path.into() }.into());
                }
                let idx = map.declare(root);
                for class in model.classes.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
                    map.insert_member(idx, class)?;
                }
            }
            Ok(())
        })?;

        for path in &self.sources.persistence_files {
            self.merge_persistence(path, &mut map)?;
        }

        info!(
            namespaces = map.len(),
            members = map.member_count(),
            "Entity namespaces loaded"
        );
        Ok(map)
    }

    /// Annotation overrides from every metadata document, in encounter order.
    pub fn entity_annotations(&self) -> Result<Vec<EntityAnnotations>, MetadataError> {
        let mut result = Vec::new();
        self.for_each_metadata_document(|_, doc| {
            for entity in &doc.annotations {
                let mut entry = EntityAnnotations::new(entity.class.trim());
                entry.annotations = entity.annotations.clone();
                entry.attribute_annotations = entity
                    .properties
                    .iter()
                    .map(|p| EntityAnnotations {
                        name: p.name.trim().to_string(),
                        annotations: p.annotations.clone(),
                        attribute_annotations: Vec::new(),
                    })
                    .collect();
                result.push(entry);
            }
            Ok(())
        })?;
        Ok(result)
    }

    /// Declared root namespaces, de-duplicated, in encounter order.
    /// Blank declarations are skipped rather than rejected.
    pub fn root_packages(&self) -> Result<Vec<String>, MetadataError> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        self.for_each_metadata_document(|_, doc| {
            for model in &doc.metadata_models {
                let root = model.root_package.trim();
                if !root.is_empty() && seen.insert(root.to_string()) {
                    result.push(root.to_string());
                }
            }
            Ok(())
        })?;
        Ok(result)
    }

    fn merge_persistence(&self, path: &str, map: &mut NamespaceMap) -> Result<(), MetadataError> {
        let doc: PersistenceDocument = self.read_document(path)?;
        let unit = doc
            .persistence_unit
            .ok_or_else(|| ConfigurationError::MissingPersistenceUnit { path: path.into() })?;
        debug!(
            path,
            unit = unit.name.as_deref().unwrap_or("<unnamed>"),
            classes = unit.classes.len(),
            "Merging persistence descriptor"
        );

        for class in unit.classes.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
            let owner = map
                .owning_namespace_for(class)
                .ok_or_else(|| ConfigurationError::NoOwningNamespace {
                    member: class.into(),
                })?;
            map.insert_member(owner, class)?;
        }
        Ok(())
    }

    /// Visits each configured metadata document once, includes before the
    /// including document, depth first.
    fn for_each_metadata_document<F>(&self, mut visit: F) -> Result<(), MetadataError>
    where
        F: FnMut(&str, &MetadataDocument) -> Result<(), MetadataError>,
    {
        let mut walk = IncludeWalk::default();
        for path in &self.sources.metadata_files {
            let path = normalize(path).ok_or_else(|| ConfigurationError::InvalidInclude {
                path: path.clone(),
                include: path.clone(),
            })?;
            self.walk_document(&path, &mut walk, &mut visit)?;
        }
        Ok(())
    }

    fn walk_document<F>(
        &self,
        path: &str,
        walk: &mut IncludeWalk,
        visit: &mut F,
    ) -> Result<(), MetadataError>
    where
        F: FnMut(&str, &MetadataDocument) -> Result<(), MetadataError>,
    {
        if walk.active.iter().any(|p| p == path) {
            let mut chain = walk.active.clone();
            chain.push(path.to_string());
            return Err(ConfigurationError::CyclicInclude {
                path: path.into(),
                chain: chain.join(" -> "),
            }
            .into());
        }
        if walk.done.contains(path) {
            debug!(path, "Document already merged, skipping");
            return Ok(());
        }

        let doc: MetadataDocument = self.read_document(path)?;
        debug!(
            path,
            includes = doc.include.len(),
            models = doc.metadata_models.len(),
            "Reading metadata document"
        );

        walk.active.push(path.to_string());
        for include in &doc.include {
            let file = include.file();
            if file.is_empty() {
                continue;
            }
            let target = resolve_include(path, file).ok_or_else(|| {
                ConfigurationError::InvalidInclude {
                    path: path.into(),
                    include: file.into(),
                }
            })?;
            self.walk_document(&target, walk, visit)?;
        }
        walk.active.pop();

        walk.done.insert(path.to_string());
        visit(path, &doc)
    }

    fn read_document<T: DeserializeOwned>(&self, path: &str) -> Result<T, MetadataError> {
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

/// Resolves an include against the directory of the including document.
/// A leading `/` makes the include relative to the resolver root instead.
fn resolve_include(base: &str, include: &str) -> Option<String> {
    if let Some(absolute) = include.strip_prefix('/') {
        return normalize(absolute);
    }
    match base.rsplit_once('/') {
        Some((dir, _)) => normalize(&format!("{dir}/{include}")),
        None => normalize(include),
    }
}

/// Collapses `.` and `..` segments. Returns `None` if the path climbs above
/// the root.
fn normalize(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}
