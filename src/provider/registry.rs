use super::{ConfigProvider, Provider};
use crate::config::Config;
use crate::di::InjectValue;
use crate::error::{EnsembleError, Result};

/// Ordered collection of provider output
///
/// The registry keeps only the values providers produce, never the providers
/// themselves. Nothing is deduplicated.
#[derive(Debug, Default)]
pub struct Registry {
    values: Vec<InjectValue>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from plain providers followed by config providers.
    ///
    /// Any failure discards everything produced so far.
    pub fn load(
        providers: &[Box<dyn Provider>],
        config_providers: &[Box<dyn ConfigProvider>],
        config: &dyn Config,
    ) -> Result<Self> {
        let mut registry = Self::new();
        for provider in providers {
            registry.register(provider.as_ref())?;
        }
        for config_provider in config_providers {
            registry.register_from_config(config_provider.as_ref(), config)?;
        }
        tracing::info!("Loaded {} provided values", registry.len());
        Ok(registry)
    }

    /// Call `provider` and append its value.
    pub fn register(&mut self, provider: &dyn Provider) -> Result<()> {
        let label = provider.describe();
        let mut value = provider.provide().map_err(|e| {
            tracing::error!("Provider {} failed: {:#}", label, e);
            EnsembleError::provider(&label, e)
        })?;

        if let Some(name) = provider.name() {
            value = value.named(name);
        }
        if let Some(group) = provider.group() {
            value = value.grouped(group);
        }

        tracing::debug!("Registered: {}", value.label());
        self.values.push(value);
        Ok(())
    }

    /// Ask `config_provider` for providers and register each of them.
    pub fn register_from_config(
        &mut self,
        config_provider: &dyn ConfigProvider,
        config: &dyn Config,
    ) -> Result<()> {
        let providers = config_provider.provide(config).map_err(|e| {
            tracing::error!("Config provider failed: {:#}", e);
            EnsembleError::ConfigProvider {
                message: format!("{:#}", e),
            }
        })?;
        for provider in &providers {
            self.register(provider.as_ref())?;
        }
        Ok(())
    }

    /// The accumulated values, in registration order.
    ///
    /// Does not consume anything; repeated calls return the same values.
    pub fn drain(&self) -> Vec<InjectValue> {
        self.values.clone()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
