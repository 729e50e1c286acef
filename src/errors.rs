// src/errors.rs

//! Crate-wide error type.
//!
//! Configuration and orchestration problems are fatal and surface as
//! [`AssetdagError`]. Producer and validator failures are *not* errors at
//! this level: they are recorded per task in a `RunOutcome`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("Ambiguous environment overrides: {}", .0.join(", "))]
    AmbiguousOverride(Vec<String>),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AssetdagError>;
