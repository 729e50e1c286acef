// src/exec/clean.rs

//! Built-in producer that removes the environment's output root.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{info, warn};

use crate::exec::backend::{Producer, ProducerReport, ProducerRequest};
use crate::fs::{normalize_lexically, FileSystem};

/// Removes the request's output path recursively. A missing directory is
/// success; an output path that contains the project root is refused.
#[derive(Debug, Clone)]
pub struct CleanProducer {
    fs: Arc<dyn FileSystem>,
    project_root: PathBuf,
}

impl CleanProducer {
    pub fn new(fs: Arc<dyn FileSystem>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            project_root: project_root.into(),
        }
    }
}

impl Producer for CleanProducer {
    fn describe(&self) -> String {
        "built-in clean".to_string()
    }

    fn produce(
        &self,
        request: ProducerRequest,
    ) -> Pin<Box<dyn Future<Output = ProducerReport> + Send + '_>> {
        Box::pin(async move {
            let Some(target) = request.output_path else {
                return ProducerReport::failure("clean needs an output path");
            };

            let target = normalize_lexically(&target);
            if normalize_lexically(&self.project_root).starts_with(&target) {
                warn!(target = %target.display(), "refusing to remove project root");
                return ProducerReport::failure(format!(
                    "refusing to remove {:?}: it contains the project root",
                    target
                ));
            }

            let fs = Arc::clone(&self.fs);
            let path = target.clone();
            match tokio::task::spawn_blocking(move || fs.remove_dir_all(&path)).await {
                Ok(Ok(())) => {
                    info!(task = %request.task, target = %target.display(), "removed output root");
                    ProducerReport::Success
                }
                Ok(Err(err)) => ProducerReport::failure(format!("{err:#}")),
                Err(err) => ProducerReport::failure(format!("clean worker failed: {err}")),
            }
        })
    }
}
