#![allow(dead_code)]

use std::path::Path;

use assetdag::config::{
    ConfigFile, EnvironmentConfig, ProducerConfig, RawConfigFile, WatchBindingConfig,
};
use assetdag::environment::{EnvName, Environment};
use assetdag::errors::Result;
use assetdag::types::{OverrideConflict, ValidationMode};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn library(mut self, name: &str) -> Self {
        self.config.libraries.push(name.to_string());
        self
    }

    pub fn validation(mut self, mode: ValidationMode) -> Self {
        self.config.config.validation = mode;
        self
    }

    pub fn override_conflict(mut self, conflict: OverrideConflict) -> Self {
        self.config.config.override_conflict = conflict;
        self
    }

    pub fn token_lengths(mut self, app: usize, lib: usize) -> Self {
        self.config.config.app_token_length = app;
        self.config.config.lib_token_length = lib;
        self
    }

    pub fn environment(mut self, name: &str, env: EnvironmentConfig) -> Self {
        self.config.environment.insert(name.to_string(), env);
        self
    }

    pub fn producer(mut self, task: &str, cmd: &str) -> Self {
        self.config.producer.insert(
            task.to_string(),
            ProducerConfig {
                cmd: Some(cmd.to_string()),
                inject_runtime_config: None,
            },
        );
        self
    }

    pub fn producer_config(mut self, task: &str, producer: ProducerConfig) -> Self {
        self.config.producer.insert(task.to_string(), producer);
        self
    }

    pub fn watch(mut self, glob: &str, tasks: &[&str]) -> Self {
        self.config
            .watch
            .get_or_insert_with(Vec::new)
            .push(WatchBindingConfig::new(glob, tasks.iter().copied()));
        self
    }

    pub fn destination(mut self, class: &str, sub: &str) -> Self {
        let dest = &mut self.config.dirs.destination;
        match class {
            "js" => dest.js = sub.to_string(),
            "css" => dest.css = sub.to_string(),
            "html" => dest.html = sub.to_string(),
            "assets" => dest.assets = sub.to_string(),
            other => panic!("unknown destination class {other}"),
        }
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for an `[environment.<name>]` section.
#[derive(Default)]
pub struct EnvironmentConfigBuilder {
    env: EnvironmentConfig,
}

impl EnvironmentConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(mut self, root: &str) -> Self {
        self.env.root = Some(root.to_string());
        self
    }

    pub fn app_file(mut self, file: &str) -> Self {
        self.env.app_file = Some(file.to_string());
        self
    }

    pub fn lib_file(mut self, file: &str) -> Self {
        self.env.lib_file = Some(file.to_string());
        self
    }

    pub fn runtime(mut self, runtime: serde_json::Value) -> Self {
        self.env.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> EnvironmentConfig {
        self.env
    }
}

/// A dev environment rooted at `root` with fixed artifact names.
pub fn dev_environment(root: impl AsRef<Path>) -> Environment {
    Environment::new(
        EnvName::Dev,
        root.as_ref(),
        "app.js",
        "lib.js",
        serde_json::json!({ "api": "https://dev.example.com" }),
    )
}
