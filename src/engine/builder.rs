use super::{Engine, StartParts};
use crate::config::{Config, ConfigOptions, YamlConfig};
use crate::di::{Container, InjectValue, Injector, InvokeFn, Resolver};
use crate::error::Result;
use crate::lifecycle::Signal;
use crate::provider::{ConfigProvider, Provider};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default time budget for stop hooks
pub const DEFAULT_GRACEFUL_WAIT: Duration = Duration::from_secs(5);

/// Builder for [`Engine`]
///
/// Everything the engine needs is set here; the built engine exposes no way
/// to change it afterwards.
///
/// # Example
///
/// ```rust,ignore
/// let engine = Engine::builder()
///     .graceful_wait(Duration::from_secs(2))
///     .inject_value(InjectValue::component(App::default()))
///     .provider(ProviderFn::new(|| Ok(InjectValue::new(Metrics::new()))).named("metrics"))
///     .config_file("app.local.yaml")
///     .build()?;
/// ```
pub struct EngineBuilder {
    graceful_wait: Duration,
    signals: Vec<Signal>,
    inject_values: Vec<InjectValue>,
    invoke_targets: Vec<InvokeFn>,
    injector: Option<Box<dyn Injector>>,
    providers: Vec<Box<dyn Provider>>,
    config_providers: Vec<Box<dyn ConfigProvider>>,
    config: Option<Arc<dyn Config>>,
    config_options: ConfigOptions,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            graceful_wait: DEFAULT_GRACEFUL_WAIT,
            signals: Signal::DEFAULTS.to_vec(),
            inject_values: Vec::new(),
            invoke_targets: Vec::new(),
            injector: None,
            providers: Vec::new(),
            config_providers: Vec::new(),
            config: None,
            config_options: ConfigOptions::default(),
        }
    }

    /// Set the time budget for stop hooks
    pub fn graceful_wait(mut self, wait: Duration) -> Self {
        self.graceful_wait = wait;
        self
    }

    /// Replace the set of signals that end the run
    pub fn signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.signals = signals.into_iter().collect();
        self
    }

    /// Add one signal to the set that ends the run
    pub fn signal(mut self, signal: Signal) -> Self {
        if !self.signals.contains(&signal) {
            self.signals.push(signal);
        }
        self
    }

    /// Inject a value directly, ahead of any provider output
    pub fn inject_value(mut self, value: InjectValue) -> Self {
        self.inject_values.push(value);
        self
    }

    pub fn inject_values(mut self, values: impl IntoIterator<Item = InjectValue>) -> Self {
        self.inject_values.extend(values);
        self
    }

    /// Add a target for the invoke phase
    pub fn invoke<F>(mut self, target: F) -> Self
    where
        F: FnOnce(&dyn Resolver) -> Result<()> + Send + 'static,
    {
        self.invoke_targets.push(Box::new(target));
        self
    }

    /// Use a custom injection boundary instead of the default [`Container`]
    pub fn injector(mut self, injector: impl Injector + 'static) -> Self {
        self.injector = Some(Box::new(injector));
        self
    }

    pub fn provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn providers(mut self, providers: impl IntoIterator<Item = Box<dyn Provider>>) -> Self {
        self.providers.extend(providers);
        self
    }

    pub fn config_provider(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.config_providers.push(Box::new(provider));
        self
    }

    /// Directory of the YAML config file. Takes precedence over [`EngineBuilder::config`].
    pub fn config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_options.dir = Some(dir.into());
        self
    }

    /// Name of the YAML config file. Takes precedence over [`EngineBuilder::config`].
    pub fn config_file(mut self, file: impl Into<String>) -> Self {
        self.config_options.file = Some(file.into());
        self
    }

    /// Use an already resolved configuration source
    pub fn config(mut self, config: Arc<dyn Config>) -> Self {
        self.config = Some(config);
        self
    }

    /// Resolve the configuration source and build the engine
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named config file cannot be read or
    /// parsed, or if the default config file exists but is malformed.
    pub fn build(self) -> Result<Engine> {
        let config = self.resolve_config()?;
        let injector = self
            .injector
            .unwrap_or_else(|| Box::new(Container::new()) as Box<dyn Injector>);

        Ok(Engine::new(
            self.graceful_wait,
            self.signals,
            config,
            StartParts {
                inject_values: self.inject_values,
                invoke_targets: self.invoke_targets,
                injector,
                providers: self.providers,
                config_providers: self.config_providers,
            },
        ))
    }

    // Directory/file options win over an explicit config.
    fn resolve_config(&self) -> Result<Arc<dyn Config>> {
        if !self.config_options.is_default() {
            return Ok(Arc::new(YamlConfig::load(&self.config_options)?));
        }
        match &self.config {
            Some(config) => Ok(Arc::clone(config)),
            None => Ok(Arc::new(YamlConfig::load_default()?)),
        }
    }
}
