// src/dag/task_info.rs

//! Task metadata and per-run state.

use crate::dag::graph::TaskKind;
use crate::engine::TaskName;

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Part of this run, waiting on dependencies.
    Pending,
    /// Handed to its producer.
    Running,
    /// Completed successfully.
    Succeeded,
    /// Its producer reported failure.
    Failed,
    /// Never started because an upstream task failed.
    Skipped,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Succeeded | RunState::Failed | RunState::Skipped
        )
    }
}

/// Public, read-only view of a task's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not participating in this run.
    NotInRun,
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::Succeeded) => TaskRunState::Succeeded,
            Some(RunState::Failed) => TaskRunState::Failed,
            Some(RunState::Skipped) => TaskRunState::Skipped,
        }
    }
}

/// Static task information for one run, plus its state in that run.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    pub kind: TaskKind,
    /// Direct dependencies that are part of this run.
    pub deps: Vec<TaskName>,
    pub run_state: RunState,
    /// First diagnostic reported by the producer, if it failed.
    pub failure: Option<String>,
    /// Upstream task whose failure skipped this one.
    pub blocked_by: Option<TaskName>,
}

impl TaskInfo {
    pub fn new(name: TaskName, kind: TaskKind, deps: Vec<TaskName>) -> Self {
        Self {
            name,
            kind,
            deps,
            run_state: RunState::Pending,
            failure: None,
            blocked_by: None,
        }
    }
}

/// Description of a task that the scheduler wants the executor to run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub kind: TaskKind,
    /// Identifier shared by every task of the same run.
    pub run_id: u64,
}

impl ScheduledTask {
    pub fn from_task_info(info: &TaskInfo, run_id: u64) -> Self {
        Self {
            name: info.name.clone(),
            kind: info.kind,
            run_id,
        }
    }
}
