//! Lifecycle Manager
//!
//! Runs the hooks of injected values, phase by phase, in registration order.

use super::{Component, LifecycleError, Result};
use crate::di::InjectValue;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A component together with the label used for logging
struct LifecycleHook {
    component: Arc<dyn Component>,
    name: String,
}

/// Drives the lifecycle hooks of every injected component
///
/// The manager is built once from the full injected-value set and is
/// immutable afterwards. Values that were not registered as components are
/// skipped.
///
/// # Example
///
/// ```rust,ignore
/// use ensemble::lifecycle::LifecycleManager;
///
/// let manager = Arc::new(LifecycleManager::from_values(&values));
///
/// manager.call_initializers().await?;
/// manager.call_starters().await?;
/// // ... application runs ...
/// manager.call_stop_hooks_with_timeout(Duration::from_secs(5)).await?;
/// ```
pub struct LifecycleManager {
    hooks: Vec<LifecycleHook>,
}

impl LifecycleManager {
    /// Collect the components among `values`, keeping their order
    pub fn from_values(values: &[InjectValue]) -> Self {
        let hooks = values
            .iter()
            .filter_map(|value| {
                value.as_component().map(|component| LifecycleHook {
                    component: Arc::clone(component),
                    name: value.label(),
                })
            })
            .collect();
        Self { hooks }
    }

    /// Execute all initializers
    ///
    /// Stops at the first failure; later initializers are not called.
    pub async fn call_initializers(&self) -> Result<()> {
        tracing::info!("Calling initializers...");

        let mut executed = 0;
        for hook in &self.hooks {
            let Some(initializer) = hook.component.as_initializer() else {
                continue;
            };
            tracing::debug!("Initializing: {}", hook.name);
            initializer.init().await.map_err(|e| {
                tracing::error!("Initializer failed for {}: {}", hook.name, e);
                LifecycleError::hook_failed(&hook.name, "Init", e.to_string())
            })?;
            executed += 1;
            tracing::debug!("Initialized: {}", hook.name);
        }

        tracing::info!("Initializers complete ({} hooks executed)", executed);
        Ok(())
    }

    /// Execute all starters
    ///
    /// Stops at the first failure; later starters are not called.
    pub async fn call_starters(&self) -> Result<()> {
        tracing::info!("Calling starters...");

        let mut executed = 0;
        for hook in &self.hooks {
            let Some(starter) = hook.component.as_starter() else {
                continue;
            };
            tracing::debug!("Starting: {}", hook.name);
            starter.start().await.map_err(|e| {
                tracing::error!("Starter failed for {}: {}", hook.name, e);
                LifecycleError::hook_failed(&hook.name, "Start", e.to_string())
            })?;
            executed += 1;
            tracing::debug!("Started: {}", hook.name);
        }

        tracing::info!("Starters complete ({} hooks executed)", executed);
        Ok(())
    }

    /// Execute all stop hooks, handing each the shutdown deadline
    pub async fn call_stop_hooks(&self, deadline: Instant) {
        tracing::info!("Calling stop hooks...");

        let mut executed = 0;
        for hook in &self.hooks {
            let Some(stoppable) = hook.component.as_stoppable() else {
                continue;
            };
            tracing::debug!("Stopping: {}", hook.name);
            stoppable.stop(deadline).await;
            executed += 1;
            tracing::debug!("Stopped: {}", hook.name);
        }

        tracing::info!("Stop hooks complete ({} hooks executed)", executed);
    }

    /// Execute all stop hooks on a separate task, waiting at most `timeout`
    ///
    /// Returns as soon as the hooks finish. On timeout the task is left to
    /// finish on its own and a timeout error is returned.
    pub async fn call_stop_hooks_with_timeout(self: &Arc<Self>, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let manager = Arc::clone(self);
        let task = tokio::spawn(async move { manager.call_stop_hooks(deadline).await });

        match tokio::time::timeout_at(deadline, task).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(LifecycleError::hook_failed(
                "stop task",
                "Stop",
                e.to_string(),
            )),
            Err(_) => Err(LifecycleError::timeout(
                "Stop",
                format!("Timeout after {:?}", timeout),
            )),
        }
    }

    /// Get the number of values exposing an initializer
    pub fn init_hook_count(&self) -> usize {
        self.count(|c| c.as_initializer().is_some())
    }

    /// Get the number of values exposing a starter
    pub fn start_hook_count(&self) -> usize {
        self.count(|c| c.as_starter().is_some())
    }

    /// Get the number of values exposing a stop hook
    pub fn stop_hook_count(&self) -> usize {
        self.count(|c| c.as_stoppable().is_some())
    }

    fn count(&self, has: impl Fn(&dyn Component) -> bool) -> usize {
        self.hooks.iter().filter(|hook| has(hook.component.as_ref())).count()
    }
}
