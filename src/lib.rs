//! # Ensemble
//!
//! A process lifecycle orchestrator with built-in dependency injection.
//!
//! Ensemble turns a declarative set of providers and injected values into a
//! running process: values are loaded and injected, components are
//! initialized and started in registration order, and on SIGINT/SIGTERM (or a
//! programmatic stop) every component gets a bounded window to stop.
//!
//! ## Features
//!
//! - **Phased startup**: Load → Inject → Invoke → Initialize → Start, fail-fast
//! - **Graceful shutdown**: stop hooks bounded by a configurable deadline
//! - **Dependency Injection**: type-directed container with names and groups
//! - **Config providers**: build values from YAML configuration sections
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ensemble::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Service {
//!     app_name: String,
//! }
//!
//! struct App;
//!
//! #[async_trait]
//! impl Starter for App {
//!     async fn start(&self) -> std::result::Result<(), LifecycleError> {
//!         tracing::info!("app startup successful");
//!         Ok(())
//!     }
//! }
//!
//! impl Component for App {
//!     fn as_starter(&self) -> Option<&dyn Starter> {
//!         Some(self)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let engine = Engine::builder()
//!         .graceful_wait(Duration::from_secs(1))
//!         .inject_value(InjectValue::component(App))
//!         .build()?;
//!
//!     let service: Service = engine.load_conf("service")?;
//!     tracing::info!("app_name: {}", service.app_name);
//!
//!     engine.start().await?;
//!     Ok(())
//! }
//! ```

// Lets `#[derive(Injectable)]` expand to `::ensemble::..` paths inside this crate.
extern crate self as ensemble;

pub mod config;
pub mod di;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod provider;

// Re-export core types
pub use config::{Config, ConfigError, StaticConfig, YamlConfig};
pub use di::{Container, InjectValue, Injectable, Injector, Resolver};
pub use engine::{Engine, EngineBuilder, load_conf, start, stop};
pub use error::{EnsembleError, Result};
pub use lifecycle::{Component, Signal, State, StopHandle, Trigger};
pub use provider::{ConfigProvider, Provider, ProviderFn};

// Re-export macros
pub use ensemble_macro::Injectable as DeriveInjectable;

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;

/// Prelude module for convenient imports
///
/// ```
/// use ensemble::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Config, ConfigError, StaticConfig, YamlConfig};
    pub use crate::di::{Container, InjectValue, Injectable, Injector, InvokeFn, Resolver};
    pub use crate::engine::{Engine, EngineBuilder};
    pub use crate::error::{EnsembleError, Result};
    pub use crate::lifecycle::{
        Component, Initializer, LifecycleError, Signal, Starter, State, StopHandle, Stoppable,
        Trigger,
    };
    pub use crate::provider::{ConfigProvider, Provider, ProviderFn};
    pub use crate::DeriveInjectable as Injectable;
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
    pub use std::time::Duration;
    pub use tokio::time::Instant;
}
