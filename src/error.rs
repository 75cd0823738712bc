use crate::config::ConfigError;
use crate::lifecycle::{LifecycleError, Signal};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EnsembleError>;

#[derive(Debug, Error)]
pub enum EnsembleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider {provider} failed to produce a value: {message}")]
    Provider { provider: String, message: String },

    #[error("Config provider failed: {message}")]
    ConfigProvider { message: String },

    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Duplicate value for {type_name} (name: {name:?})")]
    DuplicateValue {
        type_name: String,
        name: Option<String>,
    },

    #[error("Invoke target #{index} failed: {message}")]
    Invoke { index: usize, message: String },

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("Engine has already been started")]
    AlreadyStarted,

    #[error("Failed to install {signal} handler: {source}")]
    Signal {
        signal: Signal,
        #[source]
        source: std::io::Error,
    },
}

impl EnsembleError {
    /// Build a provider failure from any displayable error, keeping its cause chain.
    pub fn provider(provider: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: format!("{:#}", err),
        }
    }

    pub fn dependency_not_found<T: ?Sized>() -> Self {
        Self::DependencyNotFound {
            type_name: std::any::type_name::<T>().to_string(),
        }
    }
}
