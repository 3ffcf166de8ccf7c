//! Which documents make up the metadata configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ConfigurationError;

/// Property listing metadata documents, whitespace separated.
pub const METADATA_CONFIG: &str = "metadata_config";
/// Property listing persistence descriptors, whitespace separated.
pub const PERSISTENCE_CONFIG: &str = "persistence_config";

/// Locations of the metadata documents and persistence descriptors, in load
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSources {
    pub metadata_files: Vec<String>,
    pub persistence_files: Vec<String>,
}

impl MetadataSources {
    pub fn new(metadata_files: Vec<String>, persistence_files: Vec<String>) -> Self {
        Self {
            metadata_files,
            persistence_files,
        }
    }

    /// Builds sources from the two location-list property values.
    ///
    /// Both lists are required; a missing or blank value is a configuration
    /// error naming the property.
    pub fn from_config(
        metadata_config: Option<&str>,
        persistence_config: Option<&str>,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            metadata_files: tokenize(METADATA_CONFIG, metadata_config)?,
            persistence_files: tokenize(PERSISTENCE_CONFIG, persistence_config)?,
        })
    }

    /// Reads [`METADATA_CONFIG`] and [`PERSISTENCE_CONFIG`] from a property map.
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, ConfigurationError> {
        Self::from_config(
            properties.get(METADATA_CONFIG).map(String::as_str),
            properties.get(PERSISTENCE_CONFIG).map(String::as_str),
        )
    }
}

fn tokenize(property: &str, value: Option<&str>) -> Result<Vec<String>, ConfigurationError> {
    let files: Vec<String> = value
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if files.is_empty() {
        return Err(ConfigurationError::MissingProperty {
            property: property.into(),
        });
    }
    Ok(files)
}
