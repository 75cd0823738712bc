use ensemble::prelude::*;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Deserialize)]
struct Service {
    app_name: String,
    greeting: String,
}

struct Greeter {
    greeting: String,
}

struct Worker {
    name: String,
    ticks: AtomicU64,
}

#[async_trait]
impl Starter for Worker {
    async fn start(&self) -> std::result::Result<(), LifecycleError> {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        tracing::info!("worker {} started", self.name);
        Ok(())
    }
}

#[async_trait]
impl Stoppable for Worker {
    async fn stop(&self, deadline: Instant) {
        let left = deadline.saturating_duration_since(Instant::now());
        tracing::info!("worker {} stopping ({:?} left)", self.name, left);
    }
}

impl Component for Worker {
    fn as_starter(&self) -> Option<&dyn Starter> {
        Some(self)
    }

    fn as_stoppable(&self) -> Option<&dyn Stoppable> {
        Some(self)
    }
}

#[derive(Injectable)]
struct Report {
    greeter: Arc<Greeter>,
    #[inject(group = "workers")]
    workers: Vec<Arc<Worker>>,
}

#[derive(Default)]
struct App;

#[async_trait]
impl Initializer for App {
    async fn init(&self) -> std::result::Result<(), LifecycleError> {
        tracing::info!("app initialized");
        Ok(())
    }
}

#[async_trait]
impl Starter for App {
    async fn start(&self) -> std::result::Result<(), LifecycleError> {
        tracing::info!("app startup successful");
        Ok(())
    }
}

#[async_trait]
impl Stoppable for App {
    async fn stop(&self, _deadline: Instant) {
        tracing::info!("app stopped");
    }
}

impl Component for App {
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

fn greeter_from_config(config: &dyn Config) -> anyhow::Result<Vec<Box<dyn Provider>>> {
    let service: Service = config.get_value("service")?;
    let greeting = service.greeting;
    let provider = ProviderFn::new(move || {
        Ok(InjectValue::new(Greeter {
            greeting: greeting.clone(),
        }))
    });
    Ok(vec![Box::new(provider) as Box<dyn Provider>])
}

fn workers_from_config(config: &dyn Config) -> anyhow::Result<Vec<Box<dyn Provider>>> {
    let names: Vec<String> = config.get_value("workers")?;
    Ok(names
        .into_iter()
        .map(|name| {
            Box::new(
                ProviderFn::new(move || {
                    Ok(InjectValue::component(Worker {
                        name: name.clone(),
                        ticks: AtomicU64::new(0),
                    }))
                })
                .grouped("workers"),
            ) as Box<dyn Provider>
        })
        .collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let engine = Engine::builder()
        .graceful_wait(Duration::from_secs(2))
        .config_dir(env!("CARGO_MANIFEST_DIR"))
        .inject_value(InjectValue::component(App))
        .config_provider(greeter_from_config)
        .config_provider(workers_from_config)
        .invoke(|resolver| {
            let report = Report::inject(resolver)?;
            for worker in &report.workers {
                tracing::info!("{}, {}", report.greeter.greeting, worker.name);
            }
            Ok(())
        })
        .build()?;

    let service: Service = engine.load_conf("service")?;
    tracing::info!("app_name: {}", service.app_name);

    let mut states = engine.subscribe();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            tracing::debug!("engine state: {}", *states.borrow());
        }
    });

    let trigger = engine.start().await?;
    tracing::info!("shut down after {}", trigger);
    Ok(())
}
