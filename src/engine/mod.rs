//! Engine
//!
//! Ties the registry, the injector and the lifecycle hooks into a single run:
//! load, inject, invoke, initialize, start, wait for a termination trigger,
//! then stop within the graceful wait.

mod builder;

pub use builder::{DEFAULT_GRACEFUL_WAIT, EngineBuilder};

use crate::config::Config;
use crate::di::{InjectValue, Injector, InvokeFn};
use crate::error::{EnsembleError, Result};
use crate::lifecycle::{
    LifecycleManager, Signal, State, StopHandle, TerminationListener, Trigger,
};
use crate::provider::{ConfigProvider, Provider, Registry};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

/// Everything consumed by the first call to [`Engine::start`]
pub(crate) struct StartParts {
    pub(crate) inject_values: Vec<InjectValue>,
    pub(crate) invoke_targets: Vec<InvokeFn>,
    pub(crate) injector: Box<dyn Injector>,
    pub(crate) providers: Vec<Box<dyn Provider>>,
    pub(crate) config_providers: Vec<Box<dyn ConfigProvider>>,
}

/// Process lifecycle orchestrator
///
/// An engine runs once. [`Engine::start`] drives every startup phase, blocks
/// until a configured signal arrives or [`Engine::stop`] is called, and then
/// runs stop hooks for at most the graceful wait.
///
/// # Example
///
/// ```rust,ignore
/// use ensemble::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let engine = Engine::builder()
///         .graceful_wait(Duration::from_secs(2))
///         .inject_value(InjectValue::component(App::default()))
///         .build()?;
///
///     let service: Service = engine.load_conf("service")?;
///     tracing::info!("Starting {}", service.app_name);
///
///     engine.start().await?;
///     Ok(())
/// }
/// ```
pub struct Engine {
    run_id: Uuid,
    graceful_wait: Duration,
    signals: Vec<Signal>,
    config: Arc<dyn Config>,
    parts: Mutex<Option<StartParts>>,
    state: watch::Sender<State>,
    stop: StopHandle,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub(crate) fn new(
        graceful_wait: Duration,
        signals: Vec<Signal>,
        config: Arc<dyn Config>,
        parts: StartParts,
    ) -> Self {
        let (state, _) = watch::channel(State::Configured);
        Self {
            run_id: Uuid::new_v4(),
            graceful_wait,
            signals,
            config,
            parts: Mutex::new(Some(parts)),
            state,
            stop: StopHandle::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn graceful_wait(&self) -> Duration {
        self.graceful_wait
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn state(&self) -> State {
        *self.state.borrow()
    }

    /// Watch state transitions. `Running` and `Stopped` mark the started and
    /// stopped events.
    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &Arc<dyn Config> {
        &self.config
    }

    /// Read the config section at `key` into `T`
    pub fn load_conf<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        Ok(self.config.get_value(key)?)
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.config.is_set(key)
    }

    /// Request termination of the run
    ///
    /// Only the first call has an effect; it returns `true`. A stop requested
    /// before the engine reaches `Running` ends the run as soon as startup
    /// completes.
    pub fn stop(&self) -> bool {
        let requested = self.stop.stop();
        if !requested {
            tracing::debug!("Stop already requested, ignoring");
        }
        requested
    }

    /// A cloneable handle for stopping the engine from other tasks
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run the engine until a termination trigger, then shut down
    ///
    /// # Errors
    ///
    /// Any provider, injection, invoke, initializer or starter failure aborts
    /// startup and is returned here; no later phase runs. Calling `start` a
    /// second time returns [`EnsembleError::AlreadyStarted`].
    pub async fn start(&self) -> Result<Trigger> {
        let parts = self
            .parts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(EnsembleError::AlreadyStarted)?;

        let span = tracing::info_span!("engine", run_id = %self.run_id);
        self.run(parts).instrument(span).await
    }

    async fn run(&self, parts: StartParts) -> Result<Trigger> {
        let _guard = RunGuard { engine: self };
        let StartParts {
            mut inject_values,
            invoke_targets,
            injector,
            providers,
            config_providers,
        } = parts;

        self.transition(State::Loading);
        let registry = Registry::load(&providers, &config_providers, self.config.as_ref())?;
        inject_values.extend(registry.drain());

        self.transition(State::Injecting);
        tracing::info!("Injecting {} values", inject_values.len());
        injector.provide(&inject_values)?;
        tracing::info!("Invoking {} targets", invoke_targets.len());
        injector.invoke(invoke_targets)?;

        let manager = Arc::new(LifecycleManager::from_values(&inject_values));
        let mut listener = TerminationListener::install(&self.signals, self.stop.clone())?;

        self.transition(State::Initializing);
        manager.call_initializers().await?;

        self.transition(State::Starting);
        manager.call_starters().await?;

        self.transition(State::Running);
        tracing::info!("Engine started successfully");

        let trigger = listener.wait().await;
        drop(listener);
        tracing::info!("Received {}, shutting down", trigger);

        self.transition(State::ShuttingDown);
        if let Err(e) = manager
            .call_stop_hooks_with_timeout(self.graceful_wait)
            .await
        {
            tracing::warn!("Graceful shutdown incomplete: {}", e);
        }

        self.transition(State::Stopped);
        tracing::info!("Engine stopped");
        Ok(trigger)
    }

    fn transition(&self, next: State) {
        self.state.send_modify(|state| {
            debug_assert!(next > *state, "state moved backwards: {} -> {}", state, next);
            *state = next;
        });
        tracing::debug!("Engine state: {}", next);
    }
}

/// Releases the run on every exit path: an unfinished run is marked
/// `Failed` and the stop latch is closed.
struct RunGuard<'a> {
    engine: &'a Engine,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.engine.state().is_terminal() {
            tracing::error!("Engine startup aborted in {} phase", self.engine.state());
            self.engine.transition(State::Failed);
        }
        self.engine.stop.stop();
    }
}

/// Run `engine` to completion; see [`Engine::start`]
pub async fn start(engine: &Engine) -> Result<Trigger> {
    engine.start().await
}

/// Request termination of `engine`; see [`Engine::stop`]
pub fn stop(engine: &Engine) -> bool {
    engine.stop()
}

/// Read a config section through `engine`; see [`Engine::load_conf`]
pub fn load_conf<T: DeserializeOwned>(engine: &Engine, key: &str) -> Result<T> {
    engine.load_conf(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticConfig;
    use crate::di::Resolver;
    use crate::lifecycle::{Component, Initializer, LifecycleError, Starter, Stoppable};
    use crate::provider::ProviderFn;
    use serde_json::json;
    use std::time::Instant;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        id: &'static str,
        log: Log,
        fail_init: bool,
        fail_start: bool,
        stop_delay: Duration,
    }

    impl Recorder {
        fn new(id: &'static str, log: &Log) -> Self {
            Self {
                id,
                log: Arc::clone(log),
                fail_init: false,
                fail_start: false,
                stop_delay: Duration::ZERO,
            }
        }

        fn failing(mut self) -> Self {
            self.fail_init = true;
            self
        }

        fn failing_start(mut self) -> Self {
            self.fail_start = true;
            self
        }

        fn record(&self, event: &str) {
            self.log.lock().unwrap().push(format!("{}:{}", event, self.id));
        }
    }

    #[async_trait::async_trait]
    impl Initializer for Recorder {
        async fn init(&self) -> std::result::Result<(), LifecycleError> {
            self.record("init");
            if self.fail_init {
                return Err(LifecycleError::init_failed("refused"));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl Starter for Recorder {
        async fn start(&self) -> std::result::Result<(), LifecycleError> {
            self.record("start");
            if self.fail_start {
                return Err(LifecycleError::start_failed("port already in use"));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl Stoppable for Recorder {
        async fn stop(&self, _deadline: tokio::time::Instant) {
            tokio::time::sleep(self.stop_delay).await;
            self.record("stop");
        }
    }

    impl Component for Recorder {
        fn as_initializer(&self) -> Option<&dyn Initializer> {
            Some(self)
        }

        fn as_starter(&self) -> Option<&dyn Starter> {
            Some(self)
        }

        fn as_stoppable(&self) -> Option<&dyn Stoppable> {
            Some(self)
        }
    }

    fn new_log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    fn recorder_provider(id: &'static str, log: &Log) -> impl Provider + use<> {
        let log = Arc::clone(log);
        ProviderFn::new(move || Ok(InjectValue::component(Recorder::new(id, &log)))).named(id)
    }

    fn builder() -> EngineBuilder {
        Engine::builder()
            .signals([])
            .config(Arc::new(StaticConfig::empty()))
    }

    #[tokio::test]
    async fn test_two_providers_start_then_stop() {
        let log = new_log();
        let engine = Arc::new(
            builder()
                .graceful_wait(Duration::from_secs(2))
                .provider(recorder_provider("a", &log))
                .provider(recorder_provider("b", &log))
                .build()
                .unwrap(),
        );

        let started = Instant::now();
        let run = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.start().await }
        });
        assert!(engine.stop());

        let trigger = run.await.unwrap().unwrap();
        assert_eq!(trigger, Trigger::Stop);
        assert_eq!(engine.state(), State::Stopped);
        assert_eq!(
            entries(&log),
            vec!["init:a", "init:b", "start:a", "start:b", "stop:a", "stop:b"]
        );
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_failing_provider_runs_no_hooks() {
        let log = new_log();
        let engine = builder()
            .inject_value(InjectValue::component(Recorder::new("direct", &log)))
            .provider(ProviderFn::new(|| Err(anyhow::anyhow!("connection refused"))).named("a"))
            .provider(recorder_provider("b", &log))
            .build()
            .unwrap();

        let err = engine.start().await.unwrap_err();
        assert!(matches!(err, EnsembleError::Provider { ref provider, .. } if provider == "a"));
        assert!(entries(&log).is_empty());
        assert_eq!(engine.state(), State::Failed);
    }

    #[tokio::test]
    async fn test_failing_initializer_stops_startup() {
        let log = new_log();
        let failing = Arc::clone(&log);
        let engine = builder()
            .provider(recorder_provider("a", &log))
            .provider(ProviderFn::new(move || {
                Ok(InjectValue::component(Recorder::new("b", &failing).failing()))
            }))
            .provider(recorder_provider("c", &log))
            .build()
            .unwrap();
        engine.stop();

        let err = engine.start().await.unwrap_err();
        assert!(matches!(
            err,
            EnsembleError::Lifecycle(LifecycleError::HookFailed { .. })
        ));
        assert_eq!(entries(&log), vec!["init:a", "init:b"]);
        assert_eq!(engine.state(), State::Failed);
    }

    #[tokio::test]
    async fn test_failing_starter_stops_startup() {
        let log = new_log();
        let failing = Arc::clone(&log);
        let engine = builder()
            .provider(recorder_provider("a", &log))
            .provider(ProviderFn::new(move || {
                Ok(InjectValue::component(
                    Recorder::new("b", &failing).failing_start(),
                ))
            }))
            .provider(recorder_provider("c", &log))
            .build()
            .unwrap();
        engine.stop();

        match engine.start().await {
            Err(EnsembleError::Lifecycle(LifecycleError::HookFailed { phase, message, .. })) => {
                assert_eq!(phase, "Start");
                assert!(message.contains("port already in use"));
            }
            other => panic!("expected starter failure, got {:?}", other),
        }
        assert_eq!(
            entries(&log),
            vec!["init:a", "init:b", "init:c", "start:a", "start:b"]
        );
        assert_eq!(engine.state(), State::Failed);
    }

    #[tokio::test]
    async fn test_empty_engine_stops_immediately() {
        let engine = builder().build().unwrap();
        let mut states = engine.subscribe();
        engine.stop();

        let trigger = start(&engine).await.unwrap();
        assert_eq!(trigger, Trigger::Stop);
        assert_eq!(*states.borrow_and_update(), State::Stopped);
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let engine = builder().build().unwrap();
        engine.stop();
        engine.start().await.unwrap();

        assert!(matches!(
            engine.start().await,
            Err(EnsembleError::AlreadyStarted)
        ));
        assert_eq!(engine.state(), State::Stopped);
    }

    #[tokio::test]
    async fn test_second_stop_is_a_no_op() {
        let engine = Arc::new(builder().build().unwrap());
        let run = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.start().await }
        });

        let mut states = engine.subscribe();
        states.wait_for(|s| *s == State::Running).await.unwrap();
        assert!(stop(&engine));
        assert!(!stop(&engine));
        assert!(!engine.stop_handle().stop());

        run.await.unwrap().unwrap();
        assert_eq!(engine.state(), State::Stopped);
    }

    #[tokio::test]
    async fn test_invoke_runs_after_injection_and_before_init() {
        let log = new_log();
        let invoked = Arc::clone(&log);
        let engine = builder()
            .inject_value(InjectValue::new(String::from("hello")).named("greeting"))
            .provider(recorder_provider("a", &log))
            .invoke(move |resolver: &dyn Resolver| {
                let greeting = resolver.resolve_named::<String>("greeting")?;
                let recorder = resolver.resolve_named::<Recorder>("a")?;
                invoked
                    .lock()
                    .unwrap()
                    .push(format!("invoke:{}:{}", greeting, recorder.id));
                Ok(())
            })
            .build()
            .unwrap();
        engine.stop();

        engine.start().await.unwrap();
        assert_eq!(
            entries(&log),
            vec!["invoke:hello:a", "init:a", "start:a", "stop:a"]
        );
    }

    #[tokio::test]
    async fn test_unresolvable_invoke_aborts_startup() {
        let log = new_log();
        let engine = builder()
            .provider(recorder_provider("a", &log))
            .invoke(|resolver: &dyn Resolver| {
                resolver.resolve::<u64>()?;
                Ok(())
            })
            .build()
            .unwrap();

        let err = engine.start().await.unwrap_err();
        assert!(matches!(err, EnsembleError::Invoke { index: 0, .. }));
        assert!(entries(&log).is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_values_abort_injection() {
        let engine = builder()
            .inject_values([InjectValue::new(1u8), InjectValue::new(2u8)])
            .build()
            .unwrap();

        let err = engine.start().await.unwrap_err();
        assert!(matches!(err, EnsembleError::DuplicateValue { .. }));
        assert_eq!(engine.state(), State::Failed);
    }

    #[tokio::test]
    async fn test_slow_stop_hook_is_bounded_by_graceful_wait() {
        let log = new_log();
        let mut slow = Recorder::new("slow", &log);
        slow.stop_delay = Duration::from_secs(30);
        let engine = builder()
            .graceful_wait(Duration::from_millis(100))
            .inject_value(InjectValue::component(slow))
            .build()
            .unwrap();
        engine.stop();

        let started = Instant::now();
        engine.start().await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(engine.state(), State::Stopped);
        assert_eq!(entries(&log), vec!["init:slow", "start:slow"]);
    }

    #[tokio::test]
    async fn test_config_is_proxied() {
        let engine = Engine::builder()
            .signals([])
            .config(Arc::new(StaticConfig::new(json!({
                "service": { "app_name": "demo", "port": 8080 }
            }))))
            .build()
            .unwrap();

        assert!(engine.is_set("service.app_name"));
        assert!(!engine.is_set("service.missing"));
        let name: String = load_conf(&engine, "service.app_name").unwrap();
        assert_eq!(name, "demo");
        assert!(matches!(
            engine.load_conf::<String>("nope"),
            Err(EnsembleError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_config_file_overrides_explicit_config() {
        let dir = std::env::temp_dir().join(format!("ensemble-engine-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("test.yaml"), "app_name: from-file\n").unwrap();

        let engine = Engine::builder()
            .config_dir(&dir)
            .config_file("test.yaml")
            .config(Arc::new(StaticConfig::new(json!({ "app_name": "from-memory" }))))
            .build()
            .unwrap();

        let name: String = engine.load_conf("app_name").unwrap();
        assert_eq!(name, "from-file");
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_missing_config_file_fails_build() {
        let result = Engine::builder()
            .config_dir(std::env::temp_dir())
            .config_file(format!("missing-{}.yaml", Uuid::new_v4()))
            .build();
        assert!(matches!(result, Err(EnsembleError::Config(_))));
    }

    #[test]
    fn test_builder_defaults() {
        let engine = builder().build().unwrap();
        assert_eq!(engine.graceful_wait(), DEFAULT_GRACEFUL_WAIT);
        assert_eq!(engine.state(), State::Configured);

        let engine = Engine::builder()
            .config(Arc::new(StaticConfig::empty()))
            .signal(Signal::Hangup)
            .signal(Signal::Interrupt)
            .build()
            .unwrap();
        assert_eq!(
            engine.signals(),
            &[Signal::Interrupt, Signal::Terminate, Signal::Hangup]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_and_stop_shut_down_the_same_way() {
        async fn run(trigger_with_signal: bool) -> (Trigger, Vec<String>) {
            let log = new_log();
            let engine = Arc::new(
                Engine::builder()
                    .signals([Signal::User1])
                    .config(Arc::new(StaticConfig::empty()))
                    .provider(recorder_provider("a", &log))
                    .provider(recorder_provider("b", &log))
                    .build()
                    .unwrap(),
            );
            let run = tokio::spawn({
                let engine = Arc::clone(&engine);
                async move { engine.start().await }
            });

            let mut states = engine.subscribe();
            states.wait_for(|s| *s == State::Running).await.unwrap();
            if trigger_with_signal {
                let status = std::process::Command::new("kill")
                    .arg("-USR1")
                    .arg(std::process::id().to_string())
                    .status()
                    .unwrap();
                assert!(status.success());
            } else {
                engine.stop();
            }

            let trigger = tokio::time::timeout(Duration::from_secs(5), run)
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            assert_eq!(engine.state(), State::Stopped);
            (trigger, entries(&log))
        }

        let (by_stop, stop_log) = run(false).await;
        let (by_signal, signal_log) = run(true).await;

        assert_eq!(by_stop, Trigger::Stop);
        assert_eq!(by_signal, Trigger::Signal(Signal::User1));
        assert_eq!(stop_log, signal_log);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_during_startup_ends_run_after_start() {
        struct SignalsItself;

        #[async_trait::async_trait]
        impl Initializer for SignalsItself {
            async fn init(&self) -> std::result::Result<(), LifecycleError> {
                let status = std::process::Command::new("kill")
                    .arg("-USR2")
                    .arg(std::process::id().to_string())
                    .status()
                    .map_err(|e| LifecycleError::init_failed(e.to_string()))?;
                assert!(status.success());
                Ok(())
            }
        }

        impl Component for SignalsItself {
            fn as_initializer(&self) -> Option<&dyn Initializer> {
                Some(self)
            }
        }

        let log = new_log();
        let engine = Engine::builder()
            .signals([Signal::User2])
            .config(Arc::new(StaticConfig::empty()))
            .inject_value(InjectValue::component(SignalsItself))
            .provider(recorder_provider("a", &log))
            .build()
            .unwrap();

        let trigger = tokio::time::timeout(Duration::from_secs(5), engine.start())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(trigger, Trigger::Signal(Signal::User2));
        assert_eq!(entries(&log), vec!["init:a", "start:a", "stop:a"]);
        assert_eq!(engine.state(), State::Stopped);
    }
}
