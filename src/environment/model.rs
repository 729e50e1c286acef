// src/environment/model.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Names of the environments assetdag knows how to build for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnvName {
    /// Default development environment.
    Dev,
    /// Development build against the alternate backend.
    Dev2,
    /// Development build against a backend on localhost.
    Localhost,
    /// Production build with cache-busted artifact names.
    Production,
}

impl EnvName {
    pub const ALL: [EnvName; 4] = [
        EnvName::Dev,
        EnvName::Dev2,
        EnvName::Localhost,
        EnvName::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvName::Dev => "dev",
            EnvName::Dev2 => "dev2",
            EnvName::Localhost => "localhost",
            EnvName::Production => "production",
        }
    }

    /// Whether artifact names for this environment are cache-bust tokens.
    pub fn is_cache_busting(&self) -> bool {
        matches!(self, EnvName::Production)
    }
}

impl fmt::Display for EnvName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" => Ok(EnvName::Dev),
            "dev2" => Ok(EnvName::Dev2),
            "localhost" => Ok(EnvName::Localhost),
            "production" => Ok(EnvName::Production),
            other => Err(format!(
                "unknown environment '{other}' (expected dev, dev2, localhost or production)"
            )),
        }
    }
}

/// A fully resolved, immutable build context.
///
/// There are no setters: "switching environment" means resolving a new
/// value. Runs share one snapshot through `Arc<Environment>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    name: EnvName,
    output_root: PathBuf,
    app_artifact: String,
    lib_artifact: String,
    runtime_config: serde_json::Value,
}

impl Environment {
    pub fn new(
        name: EnvName,
        output_root: impl Into<PathBuf>,
        app_artifact: impl Into<String>,
        lib_artifact: impl Into<String>,
        runtime_config: serde_json::Value,
    ) -> Self {
        Self {
            name,
            output_root: output_root.into(),
            app_artifact: app_artifact.into(),
            lib_artifact: lib_artifact.into(),
            runtime_config,
        }
    }

    pub fn name(&self) -> EnvName {
        self.name
    }

    /// Root directory every artifact of this environment is written under.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Filename of the application bundle.
    pub fn app_artifact(&self) -> &str {
        &self.app_artifact
    }

    /// Filename of the vendor library bundle.
    pub fn lib_artifact(&self) -> &str {
        &self.lib_artifact
    }

    pub fn runtime_config(&self) -> &serde_json::Value {
        &self.runtime_config
    }

    pub fn is_production(&self) -> bool {
        self.name == EnvName::Production
    }

    /// `NODE_ENV`-style mode string handed to producers.
    pub fn node_env(&self) -> &'static str {
        if self.is_production() {
            "production"
        } else {
            "development"
        }
    }

    /// Path of an artifact subdirectory below the output root.
    ///
    /// An empty `sub` is the output root itself.
    pub fn output_path(&self, sub: &str) -> PathBuf {
        let sub = sub.trim().trim_matches('/');
        if sub.is_empty() {
            self.output_root.clone()
        } else {
            self.output_root.join(sub)
        }
    }

    /// Source of the runtime configuration module:
    /// `module.exports=<json>`.
    pub fn runtime_config_module(&self) -> String {
        format!("module.exports={}", self.runtime_config)
    }
}
