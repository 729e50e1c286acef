// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::loader::default_config_path;
use crate::types::ValidationMode;

/// Command-line arguments for `assetdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetdag",
    version,
    about = "Build front-end assets for a named environment, once or on every change.",
    long_about = None
)]
pub struct CliArgs {
    /// What to build. Defaults to `dev`.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Assetdag.toml` in the current working directory. A missing
    /// default file means "all defaults".
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Apply the `localhost` environment override.
    #[arg(long, global = true)]
    pub localhost: bool,

    /// Apply the `dev2` environment override.
    #[arg(long, global = true, alias = "alt-dev")]
    pub dev2: bool,

    /// How lint/test failures are treated. Overrides `[config].validation`.
    #[arg(long, global = true, value_enum, value_name = "MODE")]
    pub validation: Option<ValidationMode>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETDAG_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the resolved environment and task plan, but run nothing.
    #[arg(long, global = true)]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Dev)
    }

    /// Config path to load, and whether the user named it explicitly.
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (default_config_path(), false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Build the default environment; override flags are ignored.
    Build,
    /// Build the development environment, honouring override flags.
    Dev,
    /// Build with the `dev2` override.
    Dev2,
    /// Build the cache-busted production environment.
    Production,
    /// Build once, then rebuild affected tasks on every change until Ctrl-C.
    Watch,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
