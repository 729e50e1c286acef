// src/engine/mod.rs

//! Orchestration engine for assetdag.
//!
//! This module ties together:
//! - the [`executor`], which drives one run of the task graph to completion
//! - the trigger queue (what happens when changes arrive while a run is active)
//! - the watch-mode event loop that reacts to:
//!   - file-watch changes
//!   - run completion
//!   - shutdown signals
//!
//! The pure dispatcher state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::collections::{BTreeMap, BTreeSet};

use crate::types::ValidationMode;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a single task action for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// Carries the producer's diagnostic.
    Failed(String),
}

/// Settled state of one task after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Per-task results of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub run_id: u64,
    pub succeeded: BTreeSet<TaskName>,
    /// Task name to the first diagnostic its producer reported.
    pub failed: BTreeMap<TaskName, String>,
    /// Task name to the upstream task whose failure blocked it.
    pub skipped: BTreeMap<TaskName, TaskName>,
    /// Which of the tasks above are validators.
    pub validators: BTreeSet<TaskName>,
}

impl RunOutcome {
    pub fn new(run_id: u64) -> Self {
        Self {
            run_id,
            ..Self::default()
        }
    }

    /// True when every task of the run succeeded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    pub fn status_of(&self, task: &str) -> Option<TaskStatus> {
        if self.succeeded.contains(task) {
            Some(TaskStatus::Succeeded)
        } else if self.failed.contains_key(task) {
            Some(TaskStatus::Failed)
        } else if self.skipped.contains_key(task) {
            Some(TaskStatus::Skipped)
        } else {
            None
        }
    }

    /// Whether the outcome should fail the invocation.
    ///
    /// Any failed or skipped non-validator counts. Failed validators count
    /// only in strict mode.
    pub fn has_blocking_failure(&self, mode: ValidationMode) -> bool {
        let is_validator = |name: &TaskName| self.validators.contains(name);

        let failed_blocking = self
            .failed
            .keys()
            .any(|name| !is_validator(name) || mode == ValidationMode::Strict);
        let skipped_blocking = self.skipped.keys().any(|name| !is_validator(name));

        failed_blocking || skipped_blocking
    }

    /// Total number of tasks that took part in the run.
    pub fn task_count(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.skipped.len()
    }
}

/// Events flowing into the watch runtime from the watcher, finished runs
/// and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A watched file changed; `tasks` are the tasks bound to it.
    ChangeDetected {
        tasks: BTreeSet<TaskName>,
        path: String,
    },
    /// The in-flight run settled. `None` when the run could not be carried
    /// out at all.
    RunFinished { outcome: Option<RunOutcome> },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod executor;
pub mod queue;
pub mod runtime;

pub use core::{CoreCommand, CoreStep, DispatcherCore};
pub use executor::{Executor, OutputTarget, TaskAction};
pub use queue::TriggerQueue;
pub use runtime::{WatchRuntime, WatchSummary};
