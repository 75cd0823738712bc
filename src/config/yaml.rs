use super::{Config, ConfigError, lookup};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_DIR: &str = "./";

/// Where to look for the YAML config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    /// Directory holding the file. Defaults to `./`.
    pub dir: Option<PathBuf>,
    /// File name. Defaults to `app.<app_env>.yaml`, or `app.yaml` when no
    /// environment is set.
    pub file: Option<String>,
}

impl ConfigOptions {
    pub fn is_default(&self) -> bool {
        self.dir.is_none() && self.file.is_none()
    }

    pub fn path(&self) -> PathBuf {
        let dir = self
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DIR));
        let file = self.file.clone().unwrap_or_else(default_file_name);
        dir.join(file)
    }
}

fn default_file_name() -> String {
    let app_env = env::var("app_env")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_default();
    if app_env.is_empty() {
        "app.yaml".to_string()
    } else {
        format!("app.{}.yaml", app_env)
    }
}

/// Configuration read from a single YAML file.
#[derive(Debug, Clone)]
pub struct YamlConfig {
    path: PathBuf,
    root: Value,
}

impl YamlConfig {
    /// Read and parse the file named by `options`.
    pub fn load(options: &ConfigOptions) -> Result<Self, ConfigError> {
        Self::from_path(options.path())
    }

    /// Like [`YamlConfig::load`] for the default location, except that a
    /// missing default file yields an empty config.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::from_path_or_empty(ConfigOptions::default().path())
    }

    fn from_path_or_empty(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!(
                "Default config file {} not found, continuing with empty config",
                path.display()
            );
            return Ok(Self {
                path,
                root: Value::Null,
            });
        }
        Self::from_path(path)
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let root = Self::parse(&path, &content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(Self { path, root })
    }

    fn parse(path: &Path, content: &str) -> Result<Value, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Config for YamlConfig {
    fn is_set(&self, key: &str) -> bool {
        lookup(&self.root, key).is_some()
    }

    fn section(&self, key: &str) -> Result<Value, ConfigError> {
        lookup(&self.root, key)
            .cloned()
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }
}
