use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

/// How lint/test failures affect the rest of a run.
///
/// - `Advisory`: validator failures are reported but do not block
///   producers and do not change the exit status (default).
/// - `Strict`: a failed validator blocks its dependents and makes the run
///   exit non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    Strict,
    Advisory,
}

impl Default for ValidationMode {
    fn default() -> Self {
        ValidationMode::Advisory
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Strict => write!(f, "strict"),
            ValidationMode::Advisory => write!(f, "advisory"),
        }
    }
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(ValidationMode::Strict),
            "advisory" => Ok(ValidationMode::Advisory),
            other => Err(format!(
                "invalid validation mode: {other} (expected \"strict\" or \"advisory\")"
            )),
        }
    }
}

/// What the resolver does when more than one override flag is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideConflict {
    /// Apply none of the overrides and fall back to the default environment.
    Ignore,
    /// Fail resolution with `AssetdagError::AmbiguousOverride`.
    Reject,
}

impl Default for OverrideConflict {
    fn default() -> Self {
        OverrideConflict::Ignore
    }
}
