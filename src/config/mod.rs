//! Configuration capability
//!
//! The engine only needs two reads from its configuration source: whether a
//! key is present and the value of a named section. Sections are addressed by
//! dotted paths (`service.app_name`) and deserialized into caller types.

mod yaml;

pub use yaml::{ConfigOptions, YamlConfig};

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Config key not set: {0}")]
    MissingKey(String),

    #[error("Failed to read config section {key}: {source}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read access to a resolved configuration source.
pub trait Config: Send + Sync {
    /// Whether `key` is present and not null.
    fn is_set(&self, key: &str) -> bool;

    /// Raw value of the section at `key`.
    fn section(&self, key: &str) -> Result<Value, ConfigError>;
}

impl dyn Config + '_ {
    /// Deserialize the section at `key` into `T`.
    ///
    /// Fails if the section is absent or does not match the shape of `T`.
    pub fn get_value<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let section = self.section(key)?;
        serde_json::from_value(section).map_err(|source| ConfigError::Deserialize {
            key: key.to_string(),
            source,
        })
    }
}

/// In-memory configuration, handy for tests and for embedding programs that
/// already hold their settings.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    root: Value,
}

impl StaticConfig {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn empty() -> Self {
        Self::new(Value::Null)
    }
}

impl Config for StaticConfig {
    fn is_set(&self, key: &str) -> bool {
        lookup(&self.root, key).is_some()
    }

    fn section(&self, key: &str) -> Result<Value, ConfigError> {
        lookup(&self.root, key)
            .cloned()
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }
}

/// Walk a dotted path through nested objects. Null leaves count as unset.
pub(crate) fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = root;
    for part in key.split('.') {
        current = current.as_object()?.get(part)?;
    }
    (!current.is_null()).then_some(current)
}
