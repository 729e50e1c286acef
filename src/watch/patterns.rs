// src/watch/patterns.rs

use std::collections::BTreeSet;
use std::fmt;

use globset::{Glob, GlobBuilder, GlobMatcher};

use crate::config::model::WatchBindingConfig;
use crate::dag::TaskGraph;
use crate::engine::TaskName;
use crate::errors::{AssetdagError, Result};

/// Parse a project-relative glob. `*` and `?` stay within one path
/// component; only `**` crosses directories.
pub fn path_glob(glob: &str) -> std::result::Result<Glob, globset::Error> {
    GlobBuilder::new(glob).literal_separator(true).build()
}

/// A compiled watch binding: one project-relative glob and the tasks it
/// re-runs.
///
/// The patterns are assumed to be relative to the project root. The watcher
/// passes relative paths (e.g. `"src/styles/main.styl"`) into `matches`.
#[derive(Clone)]
pub struct WatchBinding {
    glob: String,
    matcher: GlobMatcher,
    tasks: BTreeSet<TaskName>,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("glob", &self.glob)
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn compile(cfg: &WatchBindingConfig) -> Result<Self> {
        if cfg.tasks.is_empty() {
            return Err(AssetdagError::ConfigError(format!(
                "watch binding '{}' must name at least one task",
                cfg.glob
            )));
        }

        let matcher = path_glob(&cfg.glob)
            .map_err(|e| {
                AssetdagError::ConfigError(format!("invalid watch glob '{}': {e}", cfg.glob))
            })?
            .compile_matcher();

        Ok(Self {
            glob: cfg.glob.clone(),
            matcher,
            tasks: cfg.tasks.iter().cloned().collect(),
        })
    }

    pub fn glob(&self) -> &str {
        &self.glob
    }

    pub fn tasks(&self) -> &BTreeSet<TaskName> {
        &self.tasks
    }

    /// Returns true if this binding is interested in the given path
    /// (relative to project root).
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}

/// Every compiled binding of a watch session.
#[derive(Debug, Clone, Default)]
pub struct WatchBindings {
    bindings: Vec<WatchBinding>,
}

impl WatchBindings {
    pub fn compile(configs: &[WatchBindingConfig]) -> Result<Self> {
        let bindings = configs
            .iter()
            .map(WatchBinding::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { bindings })
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchBinding> {
        self.bindings.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Union of the tasks of every binding matching `rel_path`.
    pub fn tasks_for(&self, rel_path: &str) -> BTreeSet<TaskName> {
        self.bindings
            .iter()
            .filter(|b| b.matches(rel_path))
            .flat_map(|b| b.tasks.iter().cloned())
            .collect()
    }

    /// Fail if any binding names a task the graph does not declare.
    pub fn validate_against(&self, graph: &TaskGraph) -> Result<()> {
        for binding in &self.bindings {
            if let Some(missing) = binding.tasks.iter().find(|t| !graph.contains(t)) {
                return Err(AssetdagError::ConfigError(format!(
                    "watch binding '{}' has unknown task '{}'",
                    binding.glob, missing
                )));
            }
        }
        Ok(())
    }
}
