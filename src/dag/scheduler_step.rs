// src/dag/scheduler_step.rs

use crate::dag::task_info::ScheduledTask;
use crate::engine::TaskName;

/// What changed after the scheduler started a run or absorbed a completion.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks to hand to their producers now.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks that will never run in this run.
    pub newly_skipped: Vec<TaskName>,
    /// Every task of the run is now terminal.
    pub run_just_finished: bool,
}
