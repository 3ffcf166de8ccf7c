use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// Prefix marking a path segment that addresses a dynamic attribute.
pub const DYNAMIC_ATTRIBUTE_PREFIX: char = '+';

/// A dotted attribute path such as `customer.address.city` or `+rating`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    /// Parses a dotted path. Empty paths and empty segments are rejected.
    pub fn parse(path: &str) -> Result<Self, ModelError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(ModelError::UnsupportedOperation(
                "empty property path".into(),
            ));
        }

        let segments: Vec<String> = path.split('.').map(|s| s.trim().to_string()).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ModelError::UnsupportedOperation(format!(
                "property path '{path}' has an empty segment"
            )));
        }
        if segments.iter().skip(1).any(|s| s.starts_with(DYNAMIC_ATTRIBUTE_PREFIX)) {
            return Err(ModelError::UnsupportedOperation(format!(
                "property path '{path}': dynamic attributes are only addressable at the root"
            )));
        }
        if segments[0].as_str() == "+" {
            return Err(ModelError::UnsupportedOperation(format!(
                "property path '{path}' names no dynamic attribute"
            )));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// A parsed path always has at least one segment.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True when the path names a single attribute of the entity itself.
    pub fn is_direct(&self) -> bool {
        self.segments.len() == 1
    }

    /// Returns the attribute code when `segment` is of the form `+code`.
    pub fn dynamic_code(segment: &str) -> Option<&str> {
        segment.strip_prefix(DYNAMIC_ATTRIBUTE_PREFIX)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for PropertyPath {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
