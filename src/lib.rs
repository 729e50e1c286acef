// src/lib.rs

pub mod cachebust;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod environment;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_and_validate;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::engine::{RuntimeEvent, WatchRuntime};
use crate::environment::{Environment, EnvironmentResolver, OverrideFlags, Target};
use crate::pipeline::{Pipeline, BUILD};
use crate::types::ValidationMode;
use crate::watch::WatchBindings;

/// How an invocation ended, for the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// The build had a blocking failure.
    Failed,
}

impl RunStatus {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunStatus::Success => 0,
            RunStatus::Failed => 1,
        }
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - environment resolution
/// - the pipeline and its executor
/// - (watch mode) file watcher, dispatcher runtime and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<RunStatus> {
    let (config_path, explicit) = args.config_path();
    let cfg = load_config(&config_path, explicit)?;
    let project_root = config_root_dir(&config_path);

    let mode = args.validation.unwrap_or(cfg.config().validation);
    let command = args.command();
    let (target, flags) = invocation(&args, command);

    let resolver = EnvironmentResolver::from_config(&cfg, &project_root);
    let env = Arc::new(resolver.resolve(target, &flags)?);

    let pipeline = Pipeline::from_config(&cfg, &project_root)?;
    let bindings = pipeline.watch_bindings()?;

    if args.dry_run {
        print_dry_run(&env, &pipeline, &bindings, mode, command)?;
        return Ok(RunStatus::Success);
    }

    let executor = Arc::new(pipeline.executor(mode));

    info!(env = %env.name(), root = %env.output_root().display(), %mode, "building");
    let outcome = executor.run(BUILD, Arc::clone(&env)).await?;
    report::print_outcome(&outcome, mode);
    let status = if outcome.has_blocking_failure(mode) {
        RunStatus::Failed
    } else {
        RunStatus::Success
    };

    if command != Command::Watch {
        return Ok(status);
    }

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let _watcher_handle = watch::spawn_watcher(&project_root, bindings, rt_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let runtime = WatchRuntime::new(executor, env, rt_tx, rt_rx);
    let summary = runtime.run().await?;
    info!(runs = summary.runs, failed_runs = summary.failed_runs, "watch session ended");

    Ok(RunStatus::Success)
}

/// Load and validate the config. A missing default config file means
/// "all defaults"; a missing explicit one is an error.
fn load_config(path: &Path, explicit: bool) -> Result<ConfigFile> {
    if !explicit && !path.exists() {
        info!(path = %path.display(), "no config file found; using defaults");
        return Ok(ConfigFile::try_from(RawConfigFile::default())?);
    }
    load_and_validate(path).with_context(|| format!("loading config {}", path.display()))
}

/// Base target and override flags for a command.
pub fn invocation(args: &CliArgs, command: Command) -> (Target, OverrideFlags) {
    let flags = OverrideFlags {
        localhost: args.localhost,
        dev2: args.dev2,
    };

    match command {
        Command::Build => {
            if !flags.is_empty() {
                warn!("`build` uses the default environment; override flags are ignored");
            }
            (Target::Dev, OverrideFlags::none())
        }
        Command::Dev | Command::Watch => (Target::Dev, flags),
        Command::Dev2 => {
            if flags.localhost {
                warn!("`dev2` forces the dev2 override; --localhost is ignored");
            }
            (Target::Dev, OverrideFlags::dev2())
        }
        Command::Production => (Target::Production, flags),
    }
}

/// Figure out the project root.
///
/// - If the config path has a non-empty parent (e.g. "site/Assetdag.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Assetdag.toml" (parent = ""),
///   we fall back to the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    let dir = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    dir.canonicalize().unwrap_or(dir)
}

/// Dry-run output: the resolved environment and the task plan.
fn print_dry_run(
    env: &Environment,
    pipeline: &Pipeline,
    bindings: &WatchBindings,
    mode: ValidationMode,
    command: Command,
) -> Result<()> {
    println!("assetdag dry-run");
    println!("  environment = {}", env.name());
    println!("  output_root = {}", env.output_root().display());
    println!("  app_artifact = {}", env.app_artifact());
    println!("  lib_artifact = {}", env.lib_artifact());
    println!("  runtime_config = {}", env.runtime_config());
    println!("  validation = {mode}");
    println!();

    let plan = pipeline.plan()?;
    println!("tasks ({}):", plan.len());
    for task in &plan {
        println!("  - {task}");
        let deps = pipeline.graph().dependencies_of(task);
        if !deps.is_empty() {
            println!("      after: {:?}", deps);
        }
        if let Some(action) = pipeline.action(task) {
            println!("      producer: {}", action.producer.describe());
            if let Some(glob) = &action.source_glob {
                println!("      sources: {glob}");
            }
            if let Some(out) = action.output.resolve(env) {
                println!("      output: {}", out.display());
            }
        }
    }

    if command == Command::Watch {
        println!();
        println!("watch bindings:");
        for binding in bindings.iter() {
            println!("  - {} -> {:?}", binding.glob(), binding.tasks());
        }
    }

    Ok(())
}
