// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{OverrideConflict, ValidationMode};

/// Top-level configuration as read from `Assetdag.toml`.
///
/// ```toml
/// libraries = ["react", "react-dom"]
///
/// [config]
/// validation = "advisory"
///
/// [environment.dev]
/// root = "build/dev/"
///
/// [environment.dev.runtime]
/// api = "https://dev.example.com"
///
/// [producer.scripts]
/// cmd = "node tools/bundle.js"
/// ```
///
/// All sections are optional and have reasonable defaults. This is the
/// unvalidated form; convert it with `ConfigFile::try_from`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Vendor libraries bundled into the library artifact.
    #[serde(default)]
    pub libraries: Vec<String>,

    /// Global behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Source and destination layout from `[dirs]`.
    #[serde(default)]
    pub dirs: DirsSection,

    /// `[environment.<name>]` sections, keyed by environment name.
    #[serde(default)]
    pub environment: BTreeMap<String, EnvironmentConfig>,

    /// `[producer.<task>]` sections, keyed by task name.
    #[serde(default)]
    pub producer: BTreeMap<String, ProducerConfig>,

    /// `[[watch]]` bindings. `None` means "use the built-in bindings".
    #[serde(default)]
    pub watch: Option<Vec<WatchBindingConfig>>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (or the loader), so
/// holders can rely on the checks in `config::validate` having passed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    libraries: Vec<String>,
    config: ConfigSection,
    dirs: DirsSection,
    environment: BTreeMap<String, EnvironmentConfig>,
    producer: BTreeMap<String, ProducerConfig>,
    watch: Option<Vec<WatchBindingConfig>>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            libraries: raw.libraries,
            config: raw.config,
            dirs: raw.dirs,
            environment: raw.environment,
            producer: raw.producer,
            watch: raw.watch,
        }
    }

    pub fn libraries(&self) -> &[String] {
        &self.libraries
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn dirs(&self) -> &DirsSection {
        &self.dirs
    }

    pub fn environments(&self) -> &BTreeMap<String, EnvironmentConfig> {
        &self.environment
    }

    /// Environment section for `name`, if one was configured.
    pub fn environment(&self, name: &str) -> Option<&EnvironmentConfig> {
        self.environment.get(name)
    }

    pub fn producers(&self) -> &BTreeMap<String, ProducerConfig> {
        &self.producer
    }

    /// Producer section for `task`, if one was configured.
    pub fn producer(&self, task: &str) -> Option<&ProducerConfig> {
        self.producer.get(task)
    }

    /// Explicit `[[watch]]` bindings, if any were configured.
    pub fn watch_bindings(&self) -> Option<&[WatchBindingConfig]> {
        self.watch.as_deref()
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// `"advisory"` (default) or `"strict"` handling of lint/test failures.
    #[serde(default)]
    pub validation: ValidationMode,

    /// `"ignore"` (default) or `"reject"` when several override flags are
    /// given at once.
    #[serde(default)]
    pub override_conflict: OverrideConflict,

    /// Cache-bust token length for the production app artifact.
    #[serde(default = "default_app_token_length")]
    pub app_token_length: usize,

    /// Cache-bust token length for the production library artifact.
    #[serde(default = "default_lib_token_length")]
    pub lib_token_length: usize,
}

fn default_app_token_length() -> usize {
    7
}

fn default_lib_token_length() -> usize {
    8
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            validation: ValidationMode::default(),
            override_conflict: OverrideConflict::default(),
            app_token_length: default_app_token_length(),
            lib_token_length: default_lib_token_length(),
        }
    }
}

/// `[dirs]` section: where sources live and where each artifact class is
/// written below an environment's output root.
#[derive(Debug, Clone, Deserialize)]
pub struct DirsSection {
    #[serde(default = "default_src_dir")]
    pub src: String,

    #[serde(default = "default_test_dir")]
    pub test: String,

    #[serde(default)]
    pub source: SourceDirs,

    #[serde(default)]
    pub destination: DestinationDirs,
}

fn default_src_dir() -> String {
    "src/".to_string()
}

fn default_test_dir() -> String {
    "test/".to_string()
}

impl Default for DirsSection {
    fn default() -> Self {
        Self {
            src: default_src_dir(),
            test: default_test_dir(),
            source: SourceDirs::default(),
            destination: DestinationDirs::default(),
        }
    }
}

impl DirsSection {
    /// Project-relative directory holding the given source subdirectory,
    /// always with a trailing `/` (e.g. `"src/scripts/"`).
    pub fn source_dir(&self, sub: &str) -> String {
        join_rel(&self.src, sub)
    }

    /// Project-relative test directory with a trailing `/`.
    pub fn test_dir(&self) -> String {
        join_rel(&self.test, "")
    }
}

/// `[dirs.source]`: subdirectories of `dirs.src`.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDirs {
    #[serde(default = "default_scripts")]
    pub scripts: String,
    #[serde(default = "default_styles")]
    pub styles: String,
    #[serde(default = "default_views")]
    pub views: String,
    #[serde(default = "default_resources")]
    pub resources: String,
}

fn default_scripts() -> String {
    "scripts/".to_string()
}

fn default_styles() -> String {
    "styles/".to_string()
}

fn default_views() -> String {
    "views/".to_string()
}

fn default_resources() -> String {
    "resources/".to_string()
}

impl Default for SourceDirs {
    fn default() -> Self {
        Self {
            scripts: default_scripts(),
            styles: default_styles(),
            views: default_views(),
            resources: default_resources(),
        }
    }
}

/// `[dirs.destination]`: artifact subpaths below the output root.
///
/// An empty string means "the output root itself".
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationDirs {
    #[serde(default = "default_js")]
    pub js: String,
    #[serde(default = "default_css")]
    pub css: String,
    #[serde(default)]
    pub html: String,
    #[serde(default = "default_assets")]
    pub assets: String,
}

fn default_js() -> String {
    "js/".to_string()
}

fn default_css() -> String {
    "css/".to_string()
}

fn default_assets() -> String {
    "assets/".to_string()
}

impl Default for DestinationDirs {
    fn default() -> Self {
        Self {
            js: default_js(),
            css: default_css(),
            html: String::new(),
            assets: default_assets(),
        }
    }
}

impl DestinationDirs {
    /// `(class, subpath)` pairs, in a fixed order.
    pub fn classes(&self) -> [(&'static str, &str); 4] {
        [
            ("js", self.js.as_str()),
            ("css", self.css.as_str()),
            ("html", self.html.as_str()),
            ("assets", self.assets.as_str()),
        ]
    }
}

/// `[environment.<name>]` section.
///
/// Every field is optional: override environments (`dev2`, `localhost`)
/// inherit whatever they leave out from `dev`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct EnvironmentConfig {
    /// Output root, relative to the project root unless absolute.
    #[serde(default)]
    pub root: Option<String>,

    /// Fixed app bundle filename (not allowed for `production`).
    #[serde(default)]
    pub app_file: Option<String>,

    /// Fixed library bundle filename (not allowed for `production`).
    #[serde(default)]
    pub lib_file: Option<String>,

    /// Opaque runtime configuration injected into the script bundle.
    #[serde(default)]
    pub runtime: Option<serde_json::Value>,
}

/// `[producer.<task>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProducerConfig {
    /// Shell command to run. Without one, `resources` falls back to the
    /// built-in copy producer and every other task is a no-op.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Whether to materialise the runtime configuration module before the
    /// command runs. Defaults to `true` for `scripts`, `false` otherwise.
    #[serde(default)]
    pub inject_runtime_config: Option<bool>,
}

impl ProducerConfig {
    /// Effective `inject_runtime_config` for the given task.
    pub fn effective_inject_runtime_config(&self, task: &str) -> bool {
        self.inject_runtime_config
            .unwrap_or(task == crate::pipeline::SCRIPTS)
    }
}

/// `[[watch]]` entry: a project-relative glob and the tasks it re-runs.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WatchBindingConfig {
    pub glob: String,
    pub tasks: Vec<String>,
}

impl WatchBindingConfig {
    pub fn new<G, I, T>(glob: G, tasks: I) -> Self
    where
        G: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            glob: glob.into(),
            tasks: tasks.into_iter().map(Into::into).collect(),
        }
    }
}

/// Join two project-relative fragments with exactly one `/` between them
/// and a trailing `/`. Empty fragments are skipped.
pub(crate) fn join_rel(base: &str, sub: &str) -> String {
    let mut out = String::new();
    for part in [base, sub] {
        let part = part.trim().trim_matches('/');
        if part.is_empty() {
            continue;
        }
        out.push_str(part);
        out.push('/');
    }
    out
}
