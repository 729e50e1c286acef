// src/engine/executor.rs

//! Drives one run of the task graph to completion.
//!
//! The [`Scheduler`] decides what is ready; this module spawns each ready
//! task's producer on the Tokio runtime and feeds completions back to the
//! scheduler over an mpsc channel until the run settles.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::{ScheduledTask, Scheduler, TaskGraph};
use crate::engine::{RunOutcome, TaskName, TaskOutcome};
use crate::environment::Environment;
use crate::errors::Result;
use crate::exec::{Producer, ProducerReport, ProducerRequest};
use crate::types::ValidationMode;

/// Where a task writes, relative to the environment's output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Validators write nothing.
    None,
    /// The output root itself.
    Root,
    /// A subpath of the output root.
    Sub(String),
}

impl OutputTarget {
    pub fn resolve(&self, env: &Environment) -> Option<PathBuf> {
        match self {
            OutputTarget::None => None,
            OutputTarget::Root => Some(env.output_root().to_path_buf()),
            OutputTarget::Sub(sub) => Some(env.output_path(sub)),
        }
    }
}

/// What a task does when it runs.
#[derive(Clone)]
pub struct TaskAction {
    pub producer: Arc<dyn Producer>,
    pub source_glob: Option<String>,
    pub output: OutputTarget,
}

impl TaskAction {
    pub fn new(producer: Arc<dyn Producer>, source_glob: Option<String>, output: OutputTarget) -> Self {
        Self {
            producer,
            source_glob,
            output,
        }
    }
}

impl fmt::Debug for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskAction")
            .field("producer", &self.producer.describe())
            .field("source_glob", &self.source_glob)
            .field("output", &self.output)
            .finish()
    }
}

/// Runs tasks of a [`TaskGraph`] with their registered actions.
///
/// The executor holds no per-run state other than a run counter, so one
/// instance can be shared (`Arc<Executor>`) by the watch runtime.
pub struct Executor {
    graph: TaskGraph,
    actions: BTreeMap<TaskName, TaskAction>,
    mode: ValidationMode,
    run_counter: AtomicU64,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("graph", &self.graph)
            .field("actions", &self.actions)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Executor {
    pub fn new(graph: TaskGraph, mode: ValidationMode) -> Self {
        Self {
            graph,
            actions: BTreeMap::new(),
            mode,
            run_counter: AtomicU64::new(0),
        }
    }

    /// Register the action of `task`. Group tasks need none.
    pub fn with_action(mut self, task: impl Into<TaskName>, action: TaskAction) -> Self {
        self.actions.insert(task.into(), action);
        self
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn action(&self, task: &str) -> Option<&TaskAction> {
        self.actions.get(task)
    }

    /// Run `entry` and everything it transitively depends on.
    pub async fn run(&self, entry: &str, env: Arc<Environment>) -> Result<RunOutcome> {
        let run_id = self.next_run_id();
        let scheduler = Scheduler::for_entry(&self.graph, entry, self.mode, run_id)?;
        info!(run_id, entry = %entry, env = %env.name(), "starting run");
        self.drive(scheduler, env).await
    }

    /// Run exactly `names`; edges to tasks outside the set count as
    /// satisfied.
    pub async fn run_tasks<S: AsRef<str>>(
        &self,
        names: &[S],
        env: Arc<Environment>,
    ) -> Result<RunOutcome> {
        let run_id = self.next_run_id();
        let scheduler = Scheduler::for_tasks(&self.graph, names, self.mode, run_id)?;
        info!(
            run_id,
            tasks = ?scheduler.planned_order(),
            env = %env.name(),
            "starting partial run"
        );
        self.drive(scheduler, env).await
    }

    fn next_run_id(&self) -> u64 {
        self.run_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn drive(&self, mut scheduler: Scheduler, env: Arc<Environment>) -> Result<RunOutcome> {
        let run_id = scheduler.run_id();
        let (tx, mut rx) = mpsc::unbounded_channel::<(TaskName, TaskOutcome)>();

        let step = scheduler.start();
        let mut in_flight = self.dispatch(step.newly_scheduled, &env, &tx);

        while in_flight > 0 {
            let Some((task, outcome)) = rx.recv().await else {
                break;
            };
            in_flight -= 1;

            let step = scheduler.handle_completion(&task, outcome);
            if !step.newly_skipped.is_empty() {
                debug!(run_id, skipped = ?step.newly_skipped, "tasks skipped");
            }
            in_flight += self.dispatch(step.newly_scheduled, &env, &tx);
        }

        if !scheduler.is_finished() {
            warn!(run_id, "run ended with unsettled tasks");
        }

        let outcome = scheduler.into_outcome();
        info!(
            run_id,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            skipped = outcome.skipped.len(),
            "run settled"
        );
        Ok(outcome)
    }

    /// Spawn every task in `tasks`; returns how many completions to expect.
    fn dispatch(
        &self,
        tasks: Vec<ScheduledTask>,
        env: &Arc<Environment>,
        tx: &mpsc::UnboundedSender<(TaskName, TaskOutcome)>,
    ) -> usize {
        let count = tasks.len();

        for task in tasks {
            let action = self.actions.get(&task.name).cloned();
            let env = Arc::clone(env);
            let tx = tx.clone();

            let name = task.name.clone();
            let run_id = task.run_id;
            let handle = tokio::spawn(run_action(task, action, env));

            tokio::spawn(async move {
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(err) if err.is_panic() => {
                        let msg = panic_message(err.into_panic());
                        error!(task = %name, run_id, panic = %msg, "task action panicked");
                        TaskOutcome::Failed(format!("task panicked: {msg}"))
                    }
                    Err(err) => TaskOutcome::Failed(format!("task aborted: {err}")),
                };
                let _ = tx.send((name, outcome));
            });
        }

        count
    }
}

async fn run_action(
    task: ScheduledTask,
    action: Option<TaskAction>,
    env: Arc<Environment>,
) -> TaskOutcome {
    let Some(action) = action else {
        error!(task = %task.name, run_id = task.run_id, "no action registered for task");
        return TaskOutcome::Failed(format!("no action registered for task '{}'", task.name));
    };

    let request = ProducerRequest {
        task: task.name.clone(),
        source_glob: action.source_glob.clone(),
        output_path: action.output.resolve(&env),
        environment: env,
    };

    info!(
        task = %task.name,
        run_id = task.run_id,
        producer = %action.producer.describe(),
        "starting task"
    );

    match action.producer.produce(request).await {
        ProducerReport::Success => {
            info!(task = %task.name, run_id = task.run_id, "task finished");
            TaskOutcome::Success
        }
        ProducerReport::Failure { diagnostic } => {
            warn!(
                task = %task.name,
                run_id = task.run_id,
                diagnostic = %diagnostic,
                "task failed"
            );
            TaskOutcome::Failed(diagnostic)
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
