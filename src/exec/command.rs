// src/exec/command.rs

//! External command producer.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, info};

use crate::environment::Environment;
use crate::exec::backend::{Producer, ProducerReport, ProducerRequest};
use crate::pipeline::RUNTIME_CONFIG_MODULE_NAME;

/// Directory below the project root holding generated runtime modules.
pub const STATE_DIR: &str = ".assetdag";

/// Runs a shell command (`sh -c`, or `cmd /C` on Windows) in the project
/// root with the request exported as `ASSETDAG_*` environment variables.
#[derive(Debug, Clone)]
pub struct CommandProducer {
    cmd: String,
    project_root: PathBuf,
    libraries: Vec<String>,
    script_dir: String,
    inject_runtime_config: bool,
}

impl CommandProducer {
    pub fn new(cmd: impl Into<String>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            cmd: cmd.into(),
            project_root: project_root.into(),
            libraries: Vec::new(),
            script_dir: String::new(),
            inject_runtime_config: false,
        }
    }

    /// Vendor library names exported as `ASSETDAG_LIBRARIES`.
    pub fn with_libraries(mut self, libraries: &[String]) -> Self {
        self.libraries = libraries.to_vec();
        self
    }

    /// Output subpath of script artifacts, used for `ASSETDAG_APP_PATH`
    /// and `ASSETDAG_LIB_PATH`.
    pub fn with_script_dir(mut self, dir: impl Into<String>) -> Self {
        self.script_dir = dir.into();
        self
    }

    /// Write the runtime configuration module before running.
    pub fn with_runtime_config(mut self, inject: bool) -> Self {
        self.inject_runtime_config = inject;
        self
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    /// Where the runtime configuration module for `env` is written.
    pub fn runtime_config_path(project_root: &Path, env: &Environment) -> PathBuf {
        project_root
            .join(STATE_DIR)
            .join(env.name().as_str())
            .join(format!("{RUNTIME_CONFIG_MODULE_NAME}.js"))
    }

    fn artifact_path(&self, file: &str) -> String {
        let dir = self.script_dir.trim().trim_matches('/');
        if dir.is_empty() {
            file.to_string()
        } else {
            format!("{dir}/{file}")
        }
    }

    async fn run(&self, request: &ProducerRequest) -> Result<ProducerReport> {
        let env = request.environment.as_ref();

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.current_dir(&self.project_root)
            .env("ASSETDAG_TASK", &request.task)
            .env("ASSETDAG_SOURCE_GLOB", request.source_glob.as_deref().unwrap_or(""))
            .env(
                "ASSETDAG_OUTPUT_PATH",
                request
                    .output_path
                    .as_deref()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            )
            .env("ASSETDAG_ENV", env.name().as_str())
            .env("ASSETDAG_NODE_ENV", env.node_env())
            .env("ASSETDAG_MINIFY", env.is_production().to_string())
            .env("ASSETDAG_DEBUG", (!env.is_production()).to_string())
            .env("ASSETDAG_APP_FILE", env.app_artifact())
            .env("ASSETDAG_LIB_FILE", env.lib_artifact())
            .env("ASSETDAG_APP_PATH", self.artifact_path(env.app_artifact()))
            .env("ASSETDAG_LIB_PATH", self.artifact_path(env.lib_artifact()))
            .env("ASSETDAG_LIBRARIES", self.libraries.join(","))
            .env("ASSETDAG_RUNTIME_CONFIG", env.runtime_config().to_string());

        if self.inject_runtime_config {
            let module = write_runtime_config(&self.project_root, env).await?;
            cmd.env("ASSETDAG_RUNTIME_CONFIG_MODULE", &module)
                .env("ASSETDAG_RUNTIME_CONFIG_NAME", RUNTIME_CONFIG_MODULE_NAME);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(task = %request.task, cmd = %self.cmd, "starting task process");

        let output = cmd
            .output()
            .await
            .with_context(|| format!("spawning process for task '{}'", request.task))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stdout.lines() {
            debug!(task = %request.task, "stdout: {}", line);
        }
        for line in stderr.lines() {
            debug!(task = %request.task, "stderr: {}", line);
        }

        let code = output.status.code().unwrap_or(-1);
        info!(
            task = %request.task,
            exit_code = code,
            success = output.status.success(),
            "task process exited"
        );

        if output.status.success() {
            return Ok(ProducerReport::Success);
        }

        let diagnostic = match (stderr.trim(), stdout.trim()) {
            ("", "") => format!("command exited with status {code}"),
            ("", out) => out.to_string(),
            (err, _) => err.to_string(),
        };
        Ok(ProducerReport::failure(diagnostic))
    }
}

/// Write `module.exports=<json>` for `env` and return the module path.
async fn write_runtime_config(project_root: &Path, env: &Environment) -> Result<PathBuf> {
    let path = CommandProducer::runtime_config_path(project_root, env);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating dir {:?}", parent))?;
    }
    tokio::fs::write(&path, env.runtime_config_module())
        .await
        .with_context(|| format!("writing runtime config module {:?}", path))?;
    debug!(path = %path.display(), env = %env.name(), "wrote runtime config module");
    Ok(path)
}

impl Producer for CommandProducer {
    fn describe(&self) -> String {
        format!("command `{}`", self.cmd)
    }

    fn produce(
        &self,
        request: ProducerRequest,
    ) -> Pin<Box<dyn Future<Output = ProducerReport> + Send + '_>> {
        Box::pin(async move {
            match self.run(&request).await {
                Ok(report) => report,
                Err(err) => ProducerReport::failure(format!("{err:#}")),
            }
        })
    }
}
