use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex as AsyncMutex, Semaphore};
use tracing::debug;

use assetdag::environment::EnvName;
use assetdag::exec::{Producer, ProducerReport, ProducerRequest};

/// One observation made by a fake producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Finished(String),
}

/// One invocation of a fake producer.
#[derive(Debug, Clone)]
pub struct Call {
    pub task: String,
    pub env: EnvName,
    pub source_glob: Option<String>,
    pub output_path: Option<PathBuf>,
    pub app_artifact: String,
}

/// Shared log of calls and start/finish events across fake producers.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Task names in the order they started.
    pub fn started(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.task).collect()
    }

    pub fn count(&self, task: &str) -> usize {
        self.calls().iter().filter(|c| c.task == task).count()
    }

    /// Position of an event in the log.
    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    fn start(&self, request: &ProducerRequest) {
        debug!(task = %request.task, env = %request.environment.name(), "fake producer called");
        self.calls.lock().unwrap().push(Call {
            task: request.task.clone(),
            env: request.environment.name(),
            source_glob: request.source_glob.clone(),
            output_path: request.output_path.clone(),
            app_artifact: request.environment.app_artifact().to_string(),
        });
        self.events
            .lock()
            .unwrap()
            .push(Event::Started(request.task.clone()));
    }

    fn finish(&self, task: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Finished(task.to_string()));
    }
}

/// File a [`RecordingProducer`] writes into its output path.
#[derive(Debug, Clone)]
pub enum ArtifactName {
    /// The environment's app artifact name.
    App,
    /// The environment's lib artifact name.
    Lib,
    Fixed(String),
}

#[derive(Debug, Clone)]
enum Behaviour {
    Succeed,
    Fail(String),
    Panic,
}

/// A fake producer that:
/// - records each invocation in a [`CallLog`]
/// - optionally sleeps, writes one artifact, fails or panics.
#[derive(Debug, Clone)]
pub struct RecordingProducer {
    log: CallLog,
    behaviour: Behaviour,
    delay: Option<Duration>,
    artifact: Option<(ArtifactName, String)>,
}

impl RecordingProducer {
    pub fn succeeding(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            behaviour: Behaviour::Succeed,
            delay: None,
            artifact: None,
        }
    }

    pub fn failing(log: &CallLog, diagnostic: &str) -> Self {
        Self {
            behaviour: Behaviour::Fail(diagnostic.to_string()),
            ..Self::succeeding(log)
        }
    }

    pub fn panicking(log: &CallLog) -> Self {
        Self {
            behaviour: Behaviour::Panic,
            ..Self::succeeding(log)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Write `contents` to `<output>/<name>` before reporting.
    pub fn writing(mut self, name: ArtifactName, contents: &str) -> Self {
        self.artifact = Some((name, contents.to_string()));
        self
    }

    pub fn shared(self) -> Arc<dyn Producer> {
        Arc::new(self)
    }
}

impl Producer for RecordingProducer {
    fn describe(&self) -> String {
        "recording fake".to_string()
    }

    fn produce(
        &self,
        request: ProducerRequest,
    ) -> Pin<Box<dyn Future<Output = ProducerReport> + Send + '_>> {
        Box::pin(async move {
            self.log.start(&request);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if let (Some((name, contents)), Some(out)) = (&self.artifact, &request.output_path) {
                let env = &request.environment;
                let file = match name {
                    ArtifactName::App => env.app_artifact().to_string(),
                    ArtifactName::Lib => env.lib_artifact().to_string(),
                    ArtifactName::Fixed(f) => f.clone(),
                };
                std::fs::create_dir_all(out).unwrap();
                std::fs::write(out.join(file), contents).unwrap();
            }

            self.log.finish(&request.task);

            match &self.behaviour {
                Behaviour::Succeed => ProducerReport::Success,
                Behaviour::Fail(diagnostic) => ProducerReport::failure(diagnostic.clone()),
                Behaviour::Panic => panic!("fake producer panicked in {}", request.task),
            }
        })
    }
}

/// Test-side handle of a [`ControllableProducer`].
pub struct Gate {
    permits: Arc<Semaphore>,
    started_rx: AsyncMutex<mpsc::UnboundedReceiver<String>>,
}

impl Gate {
    /// Let `n` blocked invocations finish.
    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    /// Wait until an invocation has started; returns its task name.
    pub async fn wait_started(&self) -> Option<String> {
        self.started_rx.lock().await.recv().await
    }

    /// Invocations that started and were not yet observed.
    pub async fn drain_started(&self) -> Vec<String> {
        let mut rx = self.started_rx.lock().await;
        let mut names = Vec::new();
        while let Ok(name) = rx.try_recv() {
            names.push(name);
        }
        names
    }
}

/// A producer that blocks each invocation until the test releases it.
pub struct ControllableProducer {
    permits: Arc<Semaphore>,
    started_tx: mpsc::UnboundedSender<String>,
}

impl ControllableProducer {
    pub fn new() -> (Self, Gate) {
        let permits = Arc::new(Semaphore::new(0));
        let (started_tx, started_rx) = mpsc::unbounded_channel();
        (
            Self {
                permits: Arc::clone(&permits),
                started_tx,
            },
            Gate {
                permits,
                started_rx: AsyncMutex::new(started_rx),
            },
        )
    }
}

impl Producer for ControllableProducer {
    fn describe(&self) -> String {
        "controllable fake".to_string()
    }

    fn produce(
        &self,
        request: ProducerRequest,
    ) -> Pin<Box<dyn Future<Output = ProducerReport> + Send + '_>> {
        Box::pin(async move {
            debug!(task = %request.task, "controllable producer waiting for release");
            let _ = self.started_tx.send(request.task.clone());
            match self.permits.acquire().await {
                Ok(permit) => {
                    permit.forget();
                    ProducerReport::Success
                }
                Err(_) => ProducerReport::failure("gate closed"),
            }
        })
    }
}
