// src/dag/state_manager.rs

//! Per-run state management for tasks in the scheduler.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::dag::graph::TaskKind;
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::engine::{TaskName, TaskOutcome};
use crate::types::ValidationMode;

/// What the dependencies of a pending task allow right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Every in-run dependency is satisfied.
    Ready,
    /// At least one dependency has not settled yet.
    Waiting,
    /// A dependency can never be satisfied in this run; carries the task
    /// whose failure caused it.
    Blocked(TaskName),
}

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    tasks: &'a mut BTreeMap<TaskName, TaskInfo>,
    mode: ValidationMode,
    run_id: u64,
}

impl<'a> StateManager<'a> {
    pub fn new(
        tasks: &'a mut BTreeMap<TaskName, TaskInfo>,
        mode: ValidationMode,
        run_id: u64,
    ) -> Self {
        Self {
            tasks,
            mode,
            run_id,
        }
    }

    /// Record the outcome of a running task.
    ///
    /// Returns `false` if the task is unknown or was not running.
    pub fn record_completion(&mut self, task: &str, outcome: TaskOutcome) -> bool {
        let Some(info) = self.tasks.get_mut(task) else {
            warn!(task = %task, run_id = self.run_id, "completion for task not in this run");
            return false;
        };

        if info.run_state != RunState::Running {
            warn!(
                task = %task,
                run_id = self.run_id,
                state = ?info.run_state,
                "completion for task that is not running; ignoring"
            );
            return false;
        }

        match outcome {
            TaskOutcome::Success => {
                info.run_state = RunState::Succeeded;
                debug!(task = %task, run_id = self.run_id, "task succeeded");
            }
            TaskOutcome::Failed(diagnostic) => {
                info.run_state = RunState::Failed;
                debug!(task = %task, run_id = self.run_id, "task failed");
                info.failure = Some(diagnostic);
            }
        }
        true
    }

    /// Walk the pending tasks in `order` until nothing changes:
    /// blocked tasks become `Skipped`, ready groups complete on the spot,
    /// and ready actions become `Running` and are returned for dispatch.
    pub fn advance(&mut self, order: &[TaskName]) -> (Vec<ScheduledTask>, Vec<TaskName>) {
        let mut scheduled = Vec::new();
        let mut skipped = Vec::new();

        loop {
            let mut changed = false;

            for name in order {
                let readiness = match self.tasks.get(name) {
                    Some(info) if info.run_state == RunState::Pending => self.readiness_of(info),
                    _ => continue,
                };

                let Some(info) = self.tasks.get_mut(name) else {
                    continue;
                };

                match readiness {
                    Readiness::Waiting => {}
                    Readiness::Blocked(blocker) => {
                        info!(
                            task = %name,
                            run_id = self.run_id,
                            blocked_by = %blocker,
                            "skipping task due to upstream failure"
                        );
                        info.run_state = RunState::Skipped;
                        info.blocked_by = Some(blocker);
                        skipped.push(name.clone());
                        changed = true;
                    }
                    Readiness::Ready if info.kind == TaskKind::Group => {
                        debug!(task = %name, run_id = self.run_id, "group settled");
                        info.run_state = RunState::Succeeded;
                        changed = true;
                    }
                    Readiness::Ready => {
                        info!(task = %name, run_id = self.run_id, "scheduling task");
                        info.run_state = RunState::Running;
                        scheduled.push(ScheduledTask::from_task_info(info, self.run_id));
                        changed = true;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        (scheduled, skipped)
    }

    pub fn readiness_of(&self, info: &TaskInfo) -> Readiness {
        ReadOnlyStateManager::new(self.tasks, self.mode).readiness_of(info)
    }

    /// Check if all tasks are in a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks.values().all(|info| info.run_state.is_terminal())
    }
}

/// A read-only view of the state manager for checking dependency satisfaction.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a BTreeMap<TaskName, TaskInfo>,
    mode: ValidationMode,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a BTreeMap<TaskName, TaskInfo>, mode: ValidationMode) -> Self {
        Self { tasks, mode }
    }

    /// Whether the in-run dependencies of `info` are satisfied.
    ///
    /// A dependency outside the run counts as satisfied. A failed validator
    /// counts as satisfied in advisory mode.
    pub fn readiness_of(&self, info: &TaskInfo) -> Readiness {
        let mut waiting = false;

        for dep_name in &info.deps {
            let Some(dep) = self.tasks.get(dep_name) else {
                continue;
            };

            match dep.run_state {
                RunState::Succeeded => {}
                RunState::Failed
                    if dep.kind == TaskKind::Validator && self.mode == ValidationMode::Advisory => {}
                RunState::Failed => return Readiness::Blocked(dep.name.clone()),
                RunState::Skipped => {
                    let root = dep.blocked_by.clone().unwrap_or_else(|| dep.name.clone());
                    return Readiness::Blocked(root);
                }
                RunState::Pending | RunState::Running => waiting = true,
            }
        }

        if waiting {
            Readiness::Waiting
        } else {
            Readiness::Ready
        }
    }
}
