//! Providers
//!
//! A provider is a factory for one injected value. Config providers exist for
//! values that cannot be built until configuration has been resolved.

mod registry;

pub use registry::Registry;

use crate::config::Config;
use crate::di::InjectValue;

/// Factory producing exactly one value to inject
///
/// Tags returned by [`Provider::name`] and [`Provider::group`] override any
/// tags already set on the produced value.
pub trait Provider: Send + Sync {
    fn provide(&self) -> anyhow::Result<InjectValue>;

    fn name(&self) -> Option<&str> {
        None
    }

    fn group(&self) -> Option<&str> {
        None
    }

    /// Label used in logs and errors
    fn describe(&self) -> String {
        match (self.name(), self.group()) {
            (Some(name), _) => name.to_string(),
            (None, Some(group)) => format!("<{}>", group),
            (None, None) => std::any::type_name::<Self>().to_string(),
        }
    }
}

/// Builds providers from the resolved configuration
///
/// ```rust,ignore
/// let redis = |config: &dyn Config| -> anyhow::Result<Vec<Box<dyn Provider>>> {
///     let settings: RedisSettings = config.get_value("redis")?;
///     Ok(vec![Box::new(ProviderFn::new(move || {
///         Ok(InjectValue::component(RedisPool::new(&settings)?))
///     }))])
/// };
/// Engine::builder().config_provider(redis);
/// ```
pub trait ConfigProvider: Send + Sync {
    fn provide(&self, config: &dyn Config) -> anyhow::Result<Vec<Box<dyn Provider>>>;
}

impl<F> ConfigProvider for F
where
    F: Fn(&dyn Config) -> anyhow::Result<Vec<Box<dyn Provider>>> + Send + Sync,
{
    fn provide(&self, config: &dyn Config) -> anyhow::Result<Vec<Box<dyn Provider>>> {
        self(config)
    }
}

/// Closure-backed [`Provider`] with optional name and group tags
pub struct ProviderFn<F> {
    factory: F,
    name: Option<String>,
    group: Option<String>,
}

impl<F> ProviderFn<F>
where
    F: Fn() -> anyhow::Result<InjectValue> + Send + Sync,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            name: None,
            group: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn grouped(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

impl<F> Provider for ProviderFn<F>
where
    F: Fn() -> anyhow::Result<InjectValue> + Send + Sync,
{
    fn provide(&self) -> anyhow::Result<InjectValue> {
        (self.factory)()
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    fn describe(&self) -> String {
        match (&self.name, &self.group) {
            (Some(name), _) => name.clone(),
            (None, Some(group)) => format!("<{}>", group),
            (None, None) => "anonymous provider".to_string(),
        }
    }
}
