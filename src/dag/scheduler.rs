// src/dag/scheduler.rs

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::dag::graph::TaskGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, Readiness, StateManager};
use crate::dag::task_info::{RunState, TaskInfo, TaskRunState};
use crate::engine::{RunOutcome, TaskName, TaskOutcome};
use crate::errors::{AssetdagError, Result};
use crate::types::ValidationMode;

/// Scheduler for a single run over a subset of the task graph.
///
/// It is responsible for:
/// - remembering which tasks are part of the run
/// - deciding when a task is ready (in-run deps satisfied)
/// - completing group tasks without dispatching them
/// - skipping dependents of blocking failures
///
/// It performs no IO; the executor feeds it completions.
#[derive(Debug)]
pub struct Scheduler {
    tasks: BTreeMap<TaskName, TaskInfo>,
    /// Topological order of the run, used to order dispatch.
    order: Vec<TaskName>,
    mode: ValidationMode,
    run_id: u64,
}

impl Scheduler {
    /// Plan a run of `entry` plus everything it depends on.
    pub fn for_entry(
        graph: &TaskGraph,
        entry: &str,
        mode: ValidationMode,
        run_id: u64,
    ) -> Result<Self> {
        let members = graph.dependency_closure(entry)?;
        Self::with_members(graph, members, mode, run_id)
    }

    /// Plan a run of exactly `names`. Dependencies outside the set are
    /// treated as satisfied.
    pub fn for_tasks<S: AsRef<str>>(
        graph: &TaskGraph,
        names: &[S],
        mode: ValidationMode,
        run_id: u64,
    ) -> Result<Self> {
        let mut members = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            if !graph.contains(name) {
                return Err(AssetdagError::TaskNotFound(name.to_string()));
            }
            members.insert(name.to_string());
        }
        Self::with_members(graph, members, mode, run_id)
    }

    fn with_members(
        graph: &TaskGraph,
        members: BTreeSet<TaskName>,
        mode: ValidationMode,
        run_id: u64,
    ) -> Result<Self> {
        let order = graph.topological_order(&members)?;

        let mut tasks = BTreeMap::new();
        for name in members.iter() {
            let kind = graph
                .kind_of(name)
                .ok_or_else(|| AssetdagError::TaskNotFound(name.clone()))?;
            let deps = graph
                .dependencies_of(name)
                .iter()
                .filter(|n| members.contains(*n))
                .cloned()
                .collect();
            let info = TaskInfo::new(name.clone(), kind, deps);
            tasks.insert(name.clone(), info);
        }

        debug!(run_id, ?order, %mode, "planned run");

        Ok(Self {
            tasks,
            order,
            mode,
            run_id,
        })
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Names of the tasks in this run, in dispatch order.
    pub fn planned_order(&self) -> &[TaskName] {
        &self.order
    }

    /// Schedule the tasks that have no unsettled in-run dependencies.
    pub fn start(&mut self) -> SchedulerStep {
        self.advance()
    }

    /// Record a completion and return what became ready or skipped.
    pub fn handle_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let recorded = StateManager::new(&mut self.tasks, self.mode, self.run_id)
            .record_completion(task, outcome);
        if !recorded {
            return SchedulerStep::default();
        }
        self.advance()
    }

    fn advance(&mut self) -> SchedulerStep {
        let mut mgr = StateManager::new(&mut self.tasks, self.mode, self.run_id);
        let (newly_scheduled, newly_skipped) = mgr.advance(&self.order);
        let finished = mgr.all_tasks_terminal();

        SchedulerStep {
            newly_scheduled,
            newly_skipped,
            run_just_finished: finished,
        }
    }

    /// True once every task of the run is terminal.
    pub fn is_finished(&self) -> bool {
        self.tasks.values().all(|info| info.run_state.is_terminal())
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> TaskRunState {
        self.tasks.get(task).map(|info| info.run_state).into()
    }

    /// Whether the in-run dependencies of `task` are satisfied.
    ///
    /// Returns `None` if the task is not part of this run.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let info = self.tasks.get(task)?;
        let ro = ReadOnlyStateManager::new(&self.tasks, self.mode);
        Some(ro.readiness_of(info) == Readiness::Ready)
    }

    /// Collapse per-task state into a [`RunOutcome`].
    ///
    /// Tasks that never reached a terminal state are reported as skipped
    /// by themselves.
    pub fn into_outcome(self) -> RunOutcome {
        let mut outcome = RunOutcome::new(self.run_id);

        for (name, info) in self.tasks {
            if info.kind == crate::dag::TaskKind::Validator {
                outcome.validators.insert(name.clone());
            }
            match info.run_state {
                RunState::Succeeded => {
                    outcome.succeeded.insert(name);
                }
                RunState::Failed => {
                    let diagnostic = info.failure.unwrap_or_default();
                    outcome.failed.insert(name, diagnostic);
                }
                RunState::Skipped => {
                    let blocker = info.blocked_by.unwrap_or_else(|| name.clone());
                    outcome.skipped.insert(name, blocker);
                }
                RunState::Pending | RunState::Running => {
                    outcome.skipped.insert(name.clone(), name);
                }
            }
        }

        outcome
    }
}
