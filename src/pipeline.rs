// src/pipeline.rs

//! The fixed asset pipeline: task names, topology, per-task sources and
//! outputs, and the wiring of configured producers into an [`Executor`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::model::{ConfigFile, DirsSection, WatchBindingConfig};
use crate::dag::{TaskGraph, TaskKind};
use crate::engine::{Executor, OutputTarget, TaskAction, TaskName};
use crate::errors::{AssetdagError, Result};
use crate::exec::{CleanProducer, CommandProducer, CopyProducer, NoopProducer, Producer};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::ValidationMode;
use crate::watch::WatchBindings;

pub const CLEAN: &str = "clean";
pub const LINT: &str = "lint";
pub const TEST: &str = "test";
pub const LIBRARIES: &str = "libraries";
pub const SCRIPTS: &str = "scripts";
pub const STYLES: &str = "styles";
pub const VIEWS: &str = "views";
pub const RESOURCES: &str = "resources";
pub const BUILD: &str = "build";

/// Tasks that accept a `[producer.<task>]` section and may be watched.
pub const CONFIGURABLE_TASKS: [&str; 7] = [LINT, TEST, LIBRARIES, SCRIPTS, STYLES, VIEWS, RESOURCES];

/// Tasks that run concurrently once `lint` settles.
pub const PARALLEL_GROUP: [&str; 6] = [LIBRARIES, SCRIPTS, STYLES, VIEWS, RESOURCES, TEST];

/// Module name the runtime configuration is published under. Reserved:
/// no vendor library may use it.
pub const RUNTIME_CONFIG_MODULE_NAME: &str = "appconfiguration";

/// `clean` -> `lint` -> {libraries, scripts, styles, views, resources, test} -> `build`.
pub fn standard_graph() -> Result<TaskGraph> {
    let mut builder = TaskGraph::builder()
        .declare(CLEAN, TaskKind::Clean, Vec::<TaskName>::new())
        .declare(LINT, TaskKind::Validator, [CLEAN]);

    for task in PARALLEL_GROUP {
        let kind = if task == TEST {
            TaskKind::Validator
        } else {
            TaskKind::Producer
        };
        builder = builder.declare(task, kind, [LINT]);
    }

    builder.declare(BUILD, TaskKind::Group, PARALLEL_GROUP).build()
}

/// Project-relative glob of the sources a task reads.
pub fn source_glob(task: &str, dirs: &DirsSection) -> Option<String> {
    let src = &dirs.source;
    match task {
        SCRIPTS | LINT => Some(format!("{}**/*.{{js,jsx}}", dirs.source_dir(&src.scripts))),
        STYLES => Some(format!("{}[!_]*.styl", dirs.source_dir(&src.styles))),
        VIEWS => Some(format!("{}[!_]*.jade", dirs.source_dir(&src.views))),
        RESOURCES => Some(format!("{}*.*", dirs.source_dir(&src.resources))),
        TEST => Some(format!("{}**/*.test.js", dirs.test_dir())),
        _ => None,
    }
}

/// Where a task writes, relative to the output root.
pub fn output_target(task: &str, dirs: &DirsSection) -> OutputTarget {
    let dest = &dirs.destination;
    match task {
        CLEAN => OutputTarget::Root,
        LIBRARIES | SCRIPTS => OutputTarget::Sub(dest.js.clone()),
        STYLES => OutputTarget::Sub(dest.css.clone()),
        VIEWS => OutputTarget::Sub(dest.html.clone()),
        RESOURCES => OutputTarget::Sub(dest.assets.clone()),
        _ => OutputTarget::None,
    }
}

/// Bindings used when the config has no `[[watch]]` entries.
pub fn default_watch_bindings(dirs: &DirsSection) -> Vec<WatchBindingConfig> {
    let src = &dirs.source;
    let scripts = format!("{}**/*.{{js,jsx}}", dirs.source_dir(&src.scripts));

    vec![
        WatchBindingConfig::new(scripts.clone(), [LINT, SCRIPTS]),
        WatchBindingConfig::new(scripts, [TEST]),
        WatchBindingConfig::new(format!("{}**/*.test.js", dirs.test_dir()), [TEST]),
        WatchBindingConfig::new(format!("{}*.styl", dirs.source_dir(&src.styles)), [STYLES]),
        WatchBindingConfig::new(format!("{}*.jade", dirs.source_dir(&src.views)), [VIEWS]),
        WatchBindingConfig::new(format!("{}*.*", dirs.source_dir(&src.resources)), [RESOURCES]),
    ]
}

/// The standard graph plus one action per non-group task.
#[derive(Debug)]
pub struct Pipeline {
    graph: TaskGraph,
    actions: BTreeMap<TaskName, TaskAction>,
    watch: Vec<WatchBindingConfig>,
}

impl Pipeline {
    /// Wire producers from `cfg`, running commands in `project_root`.
    pub fn from_config(cfg: &ConfigFile, project_root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_fs(cfg, project_root, Arc::new(RealFileSystem))
    }

    /// Like [`Pipeline::from_config`], with the filesystem the built-in
    /// producers use.
    pub fn with_fs(
        cfg: &ConfigFile,
        project_root: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let project_root = project_root.into();
        let graph = standard_graph()?;
        let dirs = cfg.dirs();

        let mut actions = BTreeMap::new();
        for task in graph.tasks() {
            if graph.kind_of(task) == Some(TaskKind::Group) {
                continue;
            }
            let producer = Self::producer_for(task, cfg, &project_root, &fs);
            debug!(task = %task, producer = %producer.describe(), "wired producer");
            actions.insert(
                task.to_string(),
                TaskAction::new(producer, source_glob(task, dirs), output_target(task, dirs)),
            );
        }

        let watch = match cfg.watch_bindings() {
            Some(bindings) => bindings.to_vec(),
            None => default_watch_bindings(dirs),
        };

        Ok(Self {
            graph,
            actions,
            watch,
        })
    }

    fn producer_for(
        task: &str,
        cfg: &ConfigFile,
        project_root: &Path,
        fs: &Arc<dyn FileSystem>,
    ) -> Arc<dyn Producer> {
        if task == CLEAN {
            return Arc::new(CleanProducer::new(Arc::clone(fs), project_root.to_path_buf()));
        }

        let configured = cfg.producer(task);
        match configured.and_then(|p| p.cmd.as_deref()) {
            Some(cmd) => {
                let inject = configured
                    .map(|p| p.effective_inject_runtime_config(task))
                    .unwrap_or(false);
                Arc::new(
                    CommandProducer::new(cmd, project_root.to_path_buf())
                        .with_libraries(cfg.libraries())
                        .with_script_dir(cfg.dirs().destination.js.clone())
                        .with_runtime_config(inject),
                )
            }
            None if task == RESOURCES => {
                Arc::new(CopyProducer::new(Arc::clone(fs), project_root.to_path_buf()))
            }
            None => Arc::new(NoopProducer),
        }
    }

    /// Replace the producer of `task`, keeping its sources and output.
    pub fn with_producer(mut self, task: &str, producer: Arc<dyn Producer>) -> Result<Self> {
        let action = self
            .actions
            .get_mut(task)
            .ok_or_else(|| AssetdagError::TaskNotFound(task.to_string()))?;
        action.producer = producer;
        Ok(self)
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn action(&self, task: &str) -> Option<&TaskAction> {
        self.actions.get(task)
    }

    pub fn watch_config(&self) -> &[WatchBindingConfig] {
        &self.watch
    }

    /// Build an executor over the pipeline's graph and actions.
    pub fn executor(&self, mode: ValidationMode) -> Executor {
        self.actions
            .iter()
            .fold(Executor::new(self.graph.clone(), mode), |exec, (task, action)| {
                exec.with_action(task.clone(), action.clone())
            })
    }

    /// Compile the watch bindings and check them against the graph.
    pub fn watch_bindings(&self) -> Result<WatchBindings> {
        let bindings = WatchBindings::compile(&self.watch)?;
        bindings.validate_against(&self.graph)?;
        Ok(bindings)
    }

    /// Dispatch order of a full `build`.
    pub fn plan(&self) -> Result<Vec<TaskName>> {
        let closure: BTreeSet<TaskName> = self.graph.dependency_closure(BUILD)?;
        self.graph.topological_order(&closure)
    }
}
