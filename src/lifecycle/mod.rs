//! Lifecycle Hooks Module
//!
//! This module provides the hooks, state and termination plumbing the engine
//! uses to bring injected values up and take them down again.
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. Load (providers, config providers)
//!    ↓
//! 2. Inject (Injector::provide)
//!    ↓
//! 3. Invoke (Injector::invoke)
//!    ↓
//! 4. Initializer::init (each component)   ← Lifecycle Hook
//!    ↓
//! 5. Starter::start (each component)      ← Lifecycle Hook
//!    ↓
//! [Running...]
//!    ↓
//! 6. Termination trigger (SIGTERM/SIGINT or StopHandle::stop)
//!    ↓
//! 7. Stoppable::stop (each component)     ← Lifecycle Hook, bounded by the graceful wait
//!    ↓
//! 8. Stopped
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use ensemble::lifecycle::{Component, Initializer, Stoppable, LifecycleError};
//! use async_trait::async_trait;
//! use tokio::time::Instant;
//!
//! pub struct DatabaseService {
//!     config: Arc<DatabaseConfig>,
//! }
//!
//! #[async_trait]
//! impl Initializer for DatabaseService {
//!     async fn init(&self) -> Result<(), LifecycleError> {
//!         tracing::info!("Initializing database connection");
//!         Ok(())
//!     }
//! }
//!
//! #[async_trait]
//! impl Stoppable for DatabaseService {
//!     async fn stop(&self, _deadline: Instant) {
//!         tracing::info!("Closing database connections");
//!     }
//! }
//!
//! impl Component for DatabaseService {
//!     fn as_initializer(&self) -> Option<&dyn Initializer> {
//!         Some(self)
//!     }
//!     fn as_stoppable(&self) -> Option<&dyn Stoppable> {
//!         Some(self)
//!     }
//! }
//! ```

mod error;
mod manager;
mod shutdown;
mod state;
mod traits;

pub use error::{LifecycleError, Result};
pub use manager::LifecycleManager;
pub use shutdown::{Signal, StopHandle, TerminationListener, Trigger};
pub use state::State;
pub use traits::{Component, Initializer, Starter, Stoppable};
