// src/environment/resolver.rs

//! Resolution of a build target plus override flags into an [`Environment`].

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::cachebust::CacheBuster;
use crate::config::model::{ConfigFile, EnvironmentConfig};
use crate::environment::model::{EnvName, Environment};
use crate::errors::{AssetdagError, Result};
use crate::types::OverrideConflict;

const DEFAULT_DEV_ROOT: &str = "build/dev/";
const DEFAULT_PRODUCTION_ROOT: &str = "build/production/";
const DEFAULT_APP_FILE: &str = "app.js";
const DEFAULT_LIB_FILE: &str = "lib.js";

/// Base target selected by the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The development environment, optionally with one override applied.
    Dev,
    /// The production environment, selected outright.
    Production,
}

/// Recognized override flags. At most one may be set for it to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideFlags {
    pub localhost: bool,
    pub dev2: bool,
}

impl OverrideFlags {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn localhost() -> Self {
        Self {
            localhost: true,
            dev2: false,
        }
    }

    pub fn dev2() -> Self {
        Self {
            localhost: false,
            dev2: true,
        }
    }

    /// The overrides that are switched on, in a fixed order.
    pub fn active(&self) -> Vec<EnvName> {
        let mut active = Vec::new();
        if self.dev2 {
            active.push(EnvName::Dev2);
        }
        if self.localhost {
            active.push(EnvName::Localhost);
        }
        active
    }

    pub fn is_empty(&self) -> bool {
        !self.localhost && !self.dev2
    }
}

/// Holds the configured environment sections and turns a target plus flags
/// into an immutable [`Environment`].
///
/// The resolver itself never changes after construction, so resolving the
/// same non-production target with the same flags always yields an equal
/// value.
#[derive(Debug, Clone)]
pub struct EnvironmentResolver {
    project_root: PathBuf,
    dev: EnvironmentConfig,
    dev2: EnvironmentConfig,
    localhost: EnvironmentConfig,
    production: EnvironmentConfig,
    conflict: OverrideConflict,
    app_token_length: usize,
    lib_token_length: usize,
}

impl EnvironmentResolver {
    /// Build a resolver from a validated config. Relative output roots are
    /// interpreted against `project_root`.
    pub fn from_config(cfg: &ConfigFile, project_root: impl Into<PathBuf>) -> Self {
        let section = |name: EnvName| cfg.environment(name.as_str()).cloned().unwrap_or_default();

        Self {
            project_root: project_root.into(),
            dev: section(EnvName::Dev),
            dev2: section(EnvName::Dev2),
            localhost: section(EnvName::Localhost),
            production: section(EnvName::Production),
            conflict: cfg.config().override_conflict,
            app_token_length: cfg.config().app_token_length,
            lib_token_length: cfg.config().lib_token_length,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Resolve `target` + `flags`, drawing cache-bust tokens (production
    /// only) from a fresh thread-local generator.
    pub fn resolve(&self, target: Target, flags: &OverrideFlags) -> Result<Environment> {
        self.resolve_with(target, flags, &mut CacheBuster::new())
    }

    /// Resolve with an explicit cache-bust generator.
    pub fn resolve_with(
        &self,
        target: Target,
        flags: &OverrideFlags,
        buster: &mut CacheBuster,
    ) -> Result<Environment> {
        match target {
            Target::Production => {
                if !flags.is_empty() {
                    warn!(
                        overrides = ?flags.active(),
                        "override flags have no effect on the production environment"
                    );
                }
                self.production(buster)
            }
            Target::Dev => {
                let active = flags.active();
                match active.as_slice() {
                    [] => Ok(self.merged(EnvName::Dev, None)),
                    [single] => Ok(self.merged(*single, Some(self.override_section(*single)))),
                    several => self.ambiguous(several),
                }
            }
        }
    }

    fn ambiguous(&self, several: &[EnvName]) -> Result<Environment> {
        let names: Vec<String> = several.iter().map(|n| n.to_string()).collect();
        match self.conflict {
            OverrideConflict::Ignore => {
                warn!(
                    ?names,
                    "more than one environment override given; applying none and using dev"
                );
                Ok(self.merged(EnvName::Dev, None))
            }
            OverrideConflict::Reject => Err(AssetdagError::AmbiguousOverride(names)),
        }
    }

    fn override_section(&self, name: EnvName) -> &EnvironmentConfig {
        match name {
            EnvName::Dev2 => &self.dev2,
            EnvName::Localhost => &self.localhost,
            EnvName::Dev | EnvName::Production => &self.dev,
        }
    }

    /// `dev` with `over`'s fields layered on top; fields the override
    /// leaves out are inherited.
    fn merged(&self, name: EnvName, over: Option<&EnvironmentConfig>) -> Environment {
        let root = layer(over.map(|o| &o.root), &self.dev.root, DEFAULT_DEV_ROOT);
        let app = layer(over.map(|o| &o.app_file), &self.dev.app_file, DEFAULT_APP_FILE);
        let lib = layer(over.map(|o| &o.lib_file), &self.dev.lib_file, DEFAULT_LIB_FILE);
        let runtime = over
            .and_then(|o| o.runtime.clone())
            .or_else(|| self.dev.runtime.clone())
            .unwrap_or_else(empty_payload);

        debug!(env = %name, root = %root, app = %app, lib = %lib, "resolved environment");

        Environment::new(name, self.absolute_root(&root), app, lib, runtime)
    }

    fn production(&self, buster: &mut CacheBuster) -> Result<Environment> {
        let root = self
            .production
            .root
            .clone()
            .unwrap_or_else(|| DEFAULT_PRODUCTION_ROOT.to_string());
        let app = buster.artifact_name(self.app_token_length)?;
        let lib = buster.artifact_name(self.lib_token_length)?;
        let runtime = self
            .production
            .runtime
            .clone()
            .unwrap_or_else(empty_payload);

        debug!(root = %root, app = %app, lib = %lib, "resolved production environment");

        Ok(Environment::new(
            EnvName::Production,
            self.absolute_root(&root),
            app,
            lib,
            runtime,
        ))
    }

    fn absolute_root(&self, root: &str) -> PathBuf {
        let root = Path::new(root.trim());
        if root.is_absolute() {
            root.to_path_buf()
        } else {
            self.project_root.join(root)
        }
    }
}

fn layer(over: Option<&Option<String>>, base: &Option<String>, fallback: &str) -> String {
    over.and_then(|o| o.clone())
        .or_else(|| base.clone())
        .unwrap_or_else(|| fallback.to_string())
}

fn empty_payload() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}
