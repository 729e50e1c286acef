// src/dag/mod.rs

//! Task graph and per-run scheduling.
//!
//! [`TaskGraph`] is the validated, immutable dependency structure shared by
//! every run. A [`Scheduler`] is created per run over a subset of it and
//! tracks pending, running and settled tasks; it performs no IO.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::{TaskGraph, TaskGraphBuilder, TaskKind};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{ScheduledTask, TaskRunState};
