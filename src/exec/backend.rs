// src/exec/backend.rs

//! Pluggable producer abstraction.
//!
//! The executor talks to a `Producer` instead of spawning processes itself.
//! This makes it easy to swap in fake producers in tests while keeping the
//! real implementations in [`command`](super::command),
//! [`copy`](super::copy) and [`clean`](super::clean).

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use tracing::info;

use crate::engine::TaskName;
use crate::environment::Environment;

/// Everything a producer is told about one invocation.
#[derive(Debug, Clone)]
pub struct ProducerRequest {
    pub task: TaskName,
    /// Project-relative source glob, if the task reads sources.
    pub source_glob: Option<String>,
    /// Absolute output location; `None` for validators.
    pub output_path: Option<PathBuf>,
    /// Snapshot shared by every task of the run.
    pub environment: Arc<Environment>,
}

/// Result of one producer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducerReport {
    Success,
    Failure { diagnostic: String },
}

impl ProducerReport {
    pub fn failure(diagnostic: impl Into<String>) -> Self {
        ProducerReport::Failure {
            diagnostic: diagnostic.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProducerReport::Success)
    }
}

/// Trait abstracting how a task's work is done.
///
/// Production code uses external commands and the built-in file producers;
/// tests can provide implementations that don't touch processes at all.
pub trait Producer: Send + Sync {
    /// Short human-readable description for logs and dry runs.
    fn describe(&self) -> String;

    /// Do the work. Failures are reported, never raised.
    fn produce(
        &self,
        request: ProducerRequest,
    ) -> Pin<Box<dyn Future<Output = ProducerReport> + Send + '_>>;
}

/// Producer for tasks with nothing configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProducer;

impl Producer for NoopProducer {
    fn describe(&self) -> String {
        "nothing configured".to_string()
    }

    fn produce(
        &self,
        request: ProducerRequest,
    ) -> Pin<Box<dyn Future<Output = ProducerReport> + Send + '_>> {
        Box::pin(async move {
            info!(task = %request.task, "no producer configured; nothing to do");
            ProducerReport::Success
        })
    }
}
