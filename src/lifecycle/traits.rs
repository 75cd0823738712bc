//! Lifecycle hook traits
//!
//! An injected value takes part in the lifecycle by implementing
//! [`Component`] and returning itself from the accessors for the hooks it
//! supports. The engine checks each value for each capability separately.

use super::LifecycleError;
use async_trait::async_trait;
use tokio::time::Instant;

/// Called after injection, before any value is started
///
/// Use this hook to prepare internal state:
/// - Read configuration sections
/// - Open database connection pools
/// - Warm up caches
///
/// # Example
///
/// ```rust,ignore
/// use ensemble::lifecycle::{Initializer, LifecycleError};
/// use async_trait::async_trait;
///
/// #[async_trait]
/// impl Initializer for DatabaseService {
///     async fn init(&self) -> Result<(), LifecycleError> {
///         let pool = create_pool(&self.config).await
///             .map_err(|e| LifecycleError::init_failed(e.to_string()))?;
///         *self.pool.lock().await = Some(pool);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Initializer: Send + Sync {
    async fn init(&self) -> Result<(), LifecycleError>;
}

/// Called once every initializer has succeeded
///
/// Use this hook to begin externally visible activity such as binding a
/// listener, polling a queue or spawning background workers.
#[async_trait]
pub trait Starter: Send + Sync {
    async fn start(&self) -> Result<(), LifecycleError>;
}

/// Called when the engine shuts down
///
/// Stop hooks cannot fail: report problems through logging. `deadline` is the
/// end of the graceful shutdown window; hooks that wait on in-flight work
/// should give up by then.
///
/// # Example
///
/// ```rust,ignore
/// #[async_trait]
/// impl Stoppable for HttpServer {
///     async fn stop(&self, deadline: Instant) {
///         self.shutdown.notify_waiters();
///         if tokio::time::timeout_at(deadline, self.drained()).await.is_err() {
///             tracing::warn!("HTTP server did not drain before the deadline");
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Stoppable: Send + Sync {
    async fn stop(&self, deadline: Instant);
}

/// Lifecycle capabilities of an injected value
///
/// Every accessor defaults to `None`; override the ones the type supports.
///
/// ```rust,ignore
/// impl Component for App {
///     fn as_initializer(&self) -> Option<&dyn Initializer> {
///         Some(self)
///     }
///     fn as_stoppable(&self) -> Option<&dyn Stoppable> {
///         Some(self)
///     }
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    fn as_initializer(&self) -> Option<&dyn Initializer> {
        None
    }

    fn as_starter(&self) -> Option<&dyn Starter> {
        None
    }

    fn as_stoppable(&self) -> Option<&dyn Stoppable> {
        None
    }
}
