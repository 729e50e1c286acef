// src/exec/copy.rs

//! Built-in producer that copies matching source files into the output.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::exec::backend::{Producer, ProducerReport, ProducerRequest};
use crate::fs::{walk_files, FileSystem};
use crate::watch::patterns::path_glob;

/// Copies every file matching the request's source glob into the output
/// path, keeping paths relative to the glob's literal base directory.
#[derive(Debug, Clone)]
pub struct CopyProducer {
    fs: Arc<dyn FileSystem>,
    project_root: PathBuf,
}

impl CopyProducer {
    pub fn new(fs: Arc<dyn FileSystem>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            project_root: project_root.into(),
        }
    }
}

/// Directory part of `glob` before the first wildcard, e.g.
/// `src/resources/` for `src/resources/*.*`.
pub fn glob_base(glob: &str) -> &str {
    let wildcard = glob
        .find(|c| matches!(c, '*' | '?' | '[' | '{'))
        .unwrap_or(glob.len());
    match glob[..wildcard].rfind('/') {
        Some(slash) => &glob[..=slash],
        None => "",
    }
}

/// Copy the files and return how many were copied.
fn copy_matching(
    fs: &dyn FileSystem,
    project_root: &Path,
    glob: &str,
    output: &Path,
) -> Result<usize> {
    let matcher = path_glob(glob)
        .with_context(|| format!("invalid glob pattern: {glob}"))?
        .compile_matcher();
    let base = project_root.join(glob_base(glob));

    let mut copied = 0;
    for path in walk_files(fs, &base)? {
        let Ok(rel_to_root) = path.strip_prefix(project_root) else {
            continue;
        };
        let rel_str = rel_to_root.to_string_lossy().replace('\\', "/");
        if !matcher.is_match(&rel_str) {
            continue;
        }

        let rel_to_base = path
            .strip_prefix(&base)
            .map_err(|_| anyhow!("{:?} is outside {:?}", path, base))?;
        let dest = output.join(rel_to_base);
        fs.copy(&path, &dest)?;
        debug!(from = %rel_str, to = %dest.display(), "copied resource");
        copied += 1;
    }

    Ok(copied)
}

impl Producer for CopyProducer {
    fn describe(&self) -> String {
        "built-in copy".to_string()
    }

    fn produce(
        &self,
        request: ProducerRequest,
    ) -> Pin<Box<dyn Future<Output = ProducerReport> + Send + '_>> {
        let fs = Arc::clone(&self.fs);
        let project_root = self.project_root.clone();

        Box::pin(async move {
            let (Some(glob), Some(output)) = (request.source_glob.clone(), request.output_path.clone())
            else {
                return ProducerReport::failure(format!(
                    "task '{}' needs a source glob and an output path to copy",
                    request.task
                ));
            };

            let joined = tokio::task::spawn_blocking(move || {
                copy_matching(fs.as_ref(), &project_root, &glob, &output)
            })
            .await;

            match joined {
                Ok(Ok(copied)) => {
                    info!(task = %request.task, copied, "copied resources");
                    ProducerReport::Success
                }
                Ok(Err(err)) => ProducerReport::failure(format!("{err:#}")),
                Err(err) => ProducerReport::failure(format!("copy worker failed: {err}")),
            }
        })
    }
}
