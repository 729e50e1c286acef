// src/engine/core.rs

//! Pure watch-dispatcher state machine.
//!
//! This module contains a synchronous, deterministic core that consumes
//! [`RuntimeEvent`]s and produces:
//! - an updated dispatcher state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::WatchRuntime`) is responsible for:
//! - reading events from channels
//! - starting runs on the executor
//! - handling Ctrl+C / shutdown
//!
//! The core has no Tokio types, no channels and performs no IO, so it can be
//! unit tested directly.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, TaskName};

/// Whether a run is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Triggered,
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start a run of exactly these tasks.
    StartRun(Vec<TaskName>),
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn keep(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    fn stop() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: false,
        }
    }
}

/// Idle/triggered dispatcher with a single coalescing pending batch.
#[derive(Debug)]
pub struct DispatcherCore {
    state: DispatchState,
    queue: TriggerQueue,
    shutting_down: bool,
}

impl Default for DispatcherCore {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherCore {
    pub fn new() -> Self {
        Self {
            state: DispatchState::Idle,
            queue: TriggerQueue::new(),
            shutting_down: false,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == DispatchState::Idle
    }

    /// Expose queue emptiness (for tests).
    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// A change arrived. Returns the tasks to run now when idle; otherwise
    /// merges them into the pending batch and returns `None`.
    pub fn on_change<I>(&mut self, tasks: I) -> Option<Vec<TaskName>>
    where
        I: IntoIterator<Item = TaskName>,
    {
        let tasks: BTreeSet<TaskName> = tasks.into_iter().collect();
        if tasks.is_empty() {
            return None;
        }

        match self.state {
            DispatchState::Idle => {
                self.state = DispatchState::Triggered;
                Some(tasks.into_iter().collect())
            }
            DispatchState::Triggered => {
                self.queue.record(tasks);
                None
            }
        }
    }

    /// The in-flight run settled. Returns the pending batch as the next run
    /// (staying triggered), or goes idle when nothing is pending.
    pub fn on_run_finished(&mut self) -> Option<Vec<TaskName>> {
        match self.queue.drain_pending() {
            Some(batch) => {
                self.state = DispatchState::Triggered;
                Some(batch.into_iter().collect())
            }
            None => {
                self.state = DispatchState::Idle;
                None
            }
        }
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::ChangeDetected { tasks, path } => {
                if self.shutting_down {
                    debug!(path = %path, "ignoring change during shutdown");
                    return CoreStep::keep(Vec::new());
                }
                match self.on_change(tasks) {
                    Some(run) => {
                        info!(path = %path, tasks = ?run, "change detected; starting run");
                        CoreStep::keep(vec![CoreCommand::StartRun(run)])
                    }
                    None => {
                        debug!(path = %path, "change detected while running; coalesced");
                        CoreStep::keep(Vec::new())
                    }
                }
            }
            RuntimeEvent::RunFinished { .. } => {
                if self.shutting_down {
                    self.state = DispatchState::Idle;
                    return CoreStep::stop();
                }
                match self.on_run_finished() {
                    Some(run) => {
                        info!(tasks = ?run, "starting queued run");
                        CoreStep::keep(vec![CoreCommand::StartRun(run)])
                    }
                    None => CoreStep::keep(Vec::new()),
                }
            }
            RuntimeEvent::ShutdownRequested => {
                self.shutting_down = true;
                let dropped = self.queue.clear();
                if dropped > 0 {
                    info!(dropped, "discarding pending batch on shutdown");
                }
                if self.is_idle() {
                    CoreStep::stop()
                } else {
                    info!("waiting for in-flight run before shutting down");
                    CoreStep::keep(Vec::new())
                }
            }
        }
    }
}
