//! Termination triggers
//!
//! A run ends on the first of two triggers: one of the configured OS signals,
//! or a programmatic stop through a [`StopHandle`].

use crate::error::{EnsembleError, Result};
use std::fmt;
use std::sync::Arc;
use strum_macros::Display;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// OS signals the engine can treat as a termination request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Signal {
    /// SIGINT (Ctrl+C)
    Interrupt,
    /// SIGTERM
    Terminate,
    /// SIGHUP
    Hangup,
    /// SIGQUIT
    Quit,
    /// SIGUSR1
    User1,
    /// SIGUSR2
    User2,
}

impl Signal {
    /// The signals honored when none are configured explicitly
    pub const DEFAULTS: [Signal; 2] = [Signal::Interrupt, Signal::Terminate];

    #[cfg(unix)]
    fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;
        match self {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::Quit => SignalKind::quit(),
            Signal::User1 => SignalKind::user_defined1(),
            Signal::User2 => SignalKind::user_defined2(),
        }
    }
}

/// What ended the running state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Signal(Signal),
    Stop,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Signal(signal) => write!(f, "{} signal", signal),
            Trigger::Stop => f.write_str("stop request"),
        }
    }
}

/// One-shot programmatic stop request
///
/// Cloning shares the latch. The first [`StopHandle::stop`] closes it; later
/// calls change nothing.
///
/// # Example
///
/// ```rust,ignore
/// let stop = engine.stop_handle();
/// tokio::spawn(async move {
///     tokio::time::sleep(Duration::from_secs(5)).await;
///     stop.stop();
/// });
/// engine.start().await?;
/// ```
#[derive(Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request termination. Returns `true` only for the call that closed the latch.
    pub fn stop(&self) -> bool {
        self.tx.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        })
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the latch is closed, immediately if it already is.
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        // `self` keeps the sender alive, so this only returns once stopped.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscription to the configured signals plus the stop latch
///
/// Signal forwarding tasks are aborted when the listener is dropped.
pub struct TerminationListener {
    forwarders: Vec<JoinHandle<()>>,
    signals: mpsc::Receiver<Signal>,
    stop: StopHandle,
}

impl TerminationListener {
    /// Install handlers for `signals`.
    ///
    /// An empty set is allowed; only the stop latch can end the wait then.
    pub fn install(signals: &[Signal], stop: StopHandle) -> Result<Self> {
        let (tx, rx) = mpsc::channel(signals.len().max(1));
        let mut listener = Self {
            forwarders: Vec::with_capacity(signals.len()),
            signals: rx,
            stop,
        };

        for &signal in signals {
            if let Some(forwarder) = Self::forward(signal, tx.clone())? {
                listener.forwarders.push(forwarder);
            }
        }

        Ok(listener)
    }

    #[cfg(unix)]
    fn forward(signal: Signal, tx: mpsc::Sender<Signal>) -> Result<Option<JoinHandle<()>>> {
        let mut stream = tokio::signal::unix::signal(signal.kind())
            .map_err(|source| EnsembleError::Signal { signal, source })?;
        tracing::debug!("Listening for {} signal", signal);
        Ok(Some(tokio::spawn(async move {
            if stream.recv().await.is_some() {
                let _ = tx.send(signal).await;
            }
        })))
    }

    #[cfg(not(unix))]
    fn forward(signal: Signal, tx: mpsc::Sender<Signal>) -> Result<Option<JoinHandle<()>>> {
        if signal != Signal::Interrupt {
            tracing::warn!("{} signal is not supported on this platform, ignoring", signal);
            return Ok(None);
        }
        Ok(Some(tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(signal).await;
            }
        })))
    }

    /// Block until the first trigger arrives.
    pub async fn wait(&mut self) -> Trigger {
        tokio::select! {
            Some(signal) = self.signals.recv() => Trigger::Signal(signal),
            () = self.stop.stopped() => Trigger::Stop,
        }
    }
}

impl Drop for TerminationListener {
    fn drop(&mut self) {
        for forwarder in &self.forwarders {
            forwarder.abort();
        }
    }
}
