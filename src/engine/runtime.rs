// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::environment::Environment;
use crate::errors::Result;

use super::core::{CoreCommand, DispatcherCore};
use super::executor::Executor;
use super::{RuntimeEvent, TaskName};

/// What happened during a watch session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    /// Runs that settled.
    pub runs: u64,
    /// Runs that ended with a blocking failure or could not be carried out.
    pub failed_runs: u64,
}

/// Drives the [`DispatcherCore`] in response to `RuntimeEvent`s and starts
/// runs on a shared [`Executor`].
///
/// This is a pure IO shell around the core, which contains all dispatch
/// semantics. Runs execute on spawned tasks and report back with
/// `RunFinished` on the same channel.
pub struct WatchRuntime {
    core: DispatcherCore,
    executor: Arc<Executor>,
    env: Arc<Environment>,
    event_tx: mpsc::Sender<RuntimeEvent>,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    summary: WatchSummary,
}

impl fmt::Debug for WatchRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRuntime")
            .field("core", &self.core)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

impl WatchRuntime {
    /// `event_tx` must feed `event_rx`; the runtime uses it to report
    /// finished runs to itself.
    pub fn new(
        executor: Arc<Executor>,
        env: Arc<Environment>,
        event_tx: mpsc::Sender<RuntimeEvent>,
        event_rx: mpsc::Receiver<RuntimeEvent>,
    ) -> Self {
        Self {
            core: DispatcherCore::new(),
            executor,
            env,
            event_tx,
            event_rx,
            summary: WatchSummary::default(),
        }
    }

    /// Main event loop. Returns once shutdown was requested and the
    /// in-flight run, if any, has settled.
    pub async fn run(mut self) -> Result<WatchSummary> {
        info!(env = %self.env.name(), "watch runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            if let RuntimeEvent::RunFinished { outcome } = &event {
                self.summary.runs += 1;
                let failed = match outcome {
                    Some(outcome) => outcome.has_blocking_failure(self.executor.mode()),
                    None => true,
                };
                if failed {
                    self.summary.failed_runs += 1;
                }
            }

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command);
            }

            if !step.keep_running {
                info!("dispatcher requested exit; stopping runtime");
                break;
            }
        }

        info!(
            runs = self.summary.runs,
            failed_runs = self.summary.failed_runs,
            "watch runtime exiting"
        );
        Ok(self.summary)
    }

    fn execute_command(&self, command: CoreCommand) {
        match command {
            CoreCommand::StartRun(tasks) => self.spawn_run(tasks),
        }
    }

    fn spawn_run(&self, tasks: Vec<TaskName>) {
        let executor = Arc::clone(&self.executor);
        let env = Arc::clone(&self.env);
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let outcome = match executor.run_tasks(&tasks, env).await {
                Ok(outcome) => {
                    crate::report::print_outcome(&outcome, executor.mode());
                    Some(outcome)
                }
                Err(err) => {
                    error!(error = %err, ?tasks, "run could not be started");
                    None
                }
            };
            let _ = tx.send(RuntimeEvent::RunFinished { outcome }).await;
        });
    }
}
