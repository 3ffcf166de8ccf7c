//! Resource resolution: turning a configuration path into a byte stream.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::PathBuf;

use crate::MetadataError;

pub type ResourceStream = Box<dyn Read + Send>;

/// Supplies configuration documents by path.
///
/// Paths use `/` separators and are relative to the resolver's root; a
/// leading `/` is ignored.
pub trait ResourceResolver: Send + Sync {
    fn resolve(&self, path: &str) -> Result<ResourceStream, MetadataError>;
}

/// Resolves paths against a directory on disk.
#[derive(Debug, Clone)]
pub struct FsResources {
    root: PathBuf,
}

impl FsResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl ResourceResolver for FsResources {
    fn resolve(&self, path: &str) -> Result<ResourceStream, MetadataError> {
        let relative = path.trim_start_matches('/');
        if relative.split('/').any(|segment| segment == "..") {
            return Err(MetadataError::ResourceNotFound { path: path.into() });
        }

        match File::open(self.root.join(relative)) {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(MetadataError::ResourceNotFound { path: path.into() })
            }
            Err(source) => Err(MetadataError::Io {
                path: path.into(),
                source,
            }),
        }
    }
}

/// In-memory documents, for embedding defaults and for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResources {
    documents: HashMap<String, Vec<u8>>,
}

impl InMemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a document.
    pub fn with(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: &str, contents: impl Into<Vec<u8>>) {
        self.documents
            .insert(path.trim_start_matches('/').to_string(), contents.into());
    }
}

impl ResourceResolver for InMemoryResources {
    fn resolve(&self, path: &str) -> Result<ResourceStream, MetadataError> {
        self.documents
            .get(path.trim_start_matches('/'))
            .map(|bytes| Box::new(Cursor::new(bytes.clone())) as ResourceStream)
            .ok_or_else(|| MetadataError::ResourceNotFound { path: path.into() })
    }
}
