// src/engine/queue.rs

use std::collections::BTreeSet;

use tracing::debug;

use super::TaskName;

/// Batch of tasks that arrived while a run was in flight.
///
/// Semantics:
/// - There is at most one pending batch. Every change recorded while a run
///   is active is merged into it, so any number of changes during one run
///   yields at most one follow-up run.
/// - When the in-flight run settles, the dispatcher calls `drain_pending()`
///   and starts the batch as the next run.
#[derive(Debug, Default)]
pub struct TriggerQueue {
    pending: Option<BTreeSet<TaskName>>,
}

impl TriggerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are no queued triggers.
    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }

    /// Merge `tasks` into the pending batch, creating it if needed.
    pub fn record<I>(&mut self, tasks: I)
    where
        I: IntoIterator<Item = TaskName>,
    {
        let batch = self.pending.get_or_insert_with(BTreeSet::new);
        let before = batch.len();
        batch.extend(tasks);
        debug!(
            pending = batch.len(),
            added = batch.len() - before,
            "merged change into pending batch"
        );
    }

    /// Take the pending batch, leaving the queue empty.
    pub fn drain_pending(&mut self) -> Option<BTreeSet<TaskName>> {
        let batch = self.pending.take();
        if let Some(batch) = &batch {
            debug!(drained = batch.len(), "drained pending batch into new run");
        }
        batch
    }

    /// Drop the pending batch without running it.
    pub fn clear(&mut self) -> usize {
        self.pending.take().map(|b| b.len()).unwrap_or(0)
    }
}
