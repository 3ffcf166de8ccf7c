//! Node configuration, read from `keel.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use keel_dynattr::CacheConfig;
use keel_metadata::{ConfigurationError, MetadataSources};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::logging::LogThreshold;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Configuration of one cache node.
///
/// Every field is optional in the file; missing fields take the defaults
/// below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Whitespace-separated metadata document locations.
    pub metadata_config: String,
    /// Whitespace-separated persistence descriptor locations.
    pub persistence_config: String,
    /// Documents declaring the dynamic attributes.
    pub attribute_files: Vec<String>,
    /// Directory all document locations are resolved against.
    pub resource_root: PathBuf,
    pub bind_address: String,
    pub http_port: u16,
    /// Scheduled refresh period. Zero disables it.
    pub refresh_interval_secs: u64,
    /// Base URLs of the other nodes, e.g. `http://10.0.0.2:8080`.
    pub peers: Vec<String>,
    pub log_level: LogThreshold,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            metadata_config: "metadata.json".to_string(),
            persistence_config: "persistence.json".to_string(),
            attribute_files: vec!["attributes.json".to_string()],
            resource_root: PathBuf::from("conf"),
            bind_address: "0.0.0.0".to_string(),
            http_port: 8080,
            refresh_interval_secs: 300,
            peers: Vec::new(),
            log_level: LogThreshold::Info,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from `path`, or returns the defaults when no
    /// path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn metadata_sources(&self) -> Result<MetadataSources, ConfigurationError> {
        MetadataSources::from_config(
            Some(self.metadata_config.as_str()),
            Some(self.persistence_config.as_str()),
        )
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            refresh_interval: (self.refresh_interval_secs > 0)
                .then(|| Duration::from_secs(self.refresh_interval_secs)),
        }
    }
}
