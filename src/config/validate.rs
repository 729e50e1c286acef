// src/config/validate.rs

use std::collections::BTreeMap;

use crate::config::model::{join_rel, ConfigFile, RawConfigFile};
use crate::environment::EnvName;
use crate::errors::{AssetdagError, Result};
use crate::pipeline::{CONFIGURABLE_TASKS, RUNTIME_CONFIG_MODULE_NAME};
use crate::watch::patterns::path_glob;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::AssetdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_environments(cfg)?;
    validate_producers(cfg)?;
    validate_libraries(cfg)?;
    validate_destinations(cfg)?;
    validate_watch_bindings(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> AssetdagError {
    AssetdagError::ConfigError(msg.into())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.app_token_length == 0 {
        return Err(config_error("[config].app_token_length must be >= 1 (got 0)"));
    }
    if cfg.config.lib_token_length == 0 {
        return Err(config_error("[config].lib_token_length must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_environments(cfg: &RawConfigFile) -> Result<()> {
    for (name, env) in cfg.environment.iter() {
        let parsed: EnvName = name.parse().map_err(config_error)?;

        if parsed == EnvName::Production && (env.app_file.is_some() || env.lib_file.is_some()) {
            return Err(config_error(
                "[environment.production] cannot set app_file/lib_file; production artifact names are cache-bust tokens",
            ));
        }

        if let Some(root) = &env.root {
            if root.trim().is_empty() {
                return Err(config_error(format!(
                    "[environment.{name}].root must not be empty"
                )));
            }
        }

        for (field, value) in [("app_file", &env.app_file), ("lib_file", &env.lib_file)] {
            if let Some(file) = value {
                if file.trim().is_empty() || file.contains('/') || file.contains('\\') {
                    return Err(config_error(format!(
                        "[environment.{name}].{field} must be a plain filename (got {file:?})"
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_producers(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.producer.keys() {
        if !CONFIGURABLE_TASKS.contains(&name.as_str()) {
            return Err(config_error(format!(
                "unknown producer '{}' (expected one of: {})",
                name,
                CONFIGURABLE_TASKS.join(", ")
            )));
        }
    }
    Ok(())
}

fn validate_libraries(cfg: &RawConfigFile) -> Result<()> {
    if cfg
        .libraries
        .iter()
        .any(|l| l.trim() == RUNTIME_CONFIG_MODULE_NAME)
    {
        return Err(config_error(format!(
            "vendor library name '{RUNTIME_CONFIG_MODULE_NAME}' is reserved for the runtime configuration module"
        )));
    }
    Ok(())
}

fn validate_destinations(cfg: &RawConfigFile) -> Result<()> {
    // Artifact classes must never write into the same subpath, nor into one
    // another's. The output root itself ("") may hold the others.
    let classes: Vec<(&str, String)> = cfg
        .dirs
        .destination
        .classes()
        .into_iter()
        .map(|(class, sub)| (class, join_rel(sub, "")))
        .collect();

    for (i, (class, sub)) in classes.iter().enumerate() {
        for (other, other_sub) in &classes[i + 1..] {
            if sub == other_sub {
                return Err(config_error(format!(
                    "[dirs.destination] '{class}' and '{other}' both write to '{sub}'"
                )));
            }
            for (outer, outer_sub, inner, inner_sub) in [
                (class, sub, other, other_sub),
                (other, other_sub, class, sub),
            ] {
                if !outer_sub.is_empty() && inner_sub.starts_with(outer_sub.as_str()) {
                    return Err(config_error(format!(
                        "[dirs.destination] '{inner}' ('{inner_sub}') is nested inside '{outer}' ('{outer_sub}')"
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_watch_bindings(cfg: &RawConfigFile) -> Result<()> {
    let Some(bindings) = &cfg.watch else {
        return Ok(());
    };

    for binding in bindings {
        path_glob(&binding.glob).map_err(|e| {
            config_error(format!("invalid watch glob '{}': {e}", binding.glob))
        })?;

        if binding.tasks.is_empty() {
            return Err(config_error(format!(
                "watch binding '{}' must name at least one task",
                binding.glob
            )));
        }

        for task in binding.tasks.iter() {
            if !CONFIGURABLE_TASKS.contains(&task.as_str()) {
                return Err(config_error(format!(
                    "watch binding '{}' has unknown task '{}'",
                    binding.glob, task
                )));
            }
        }
    }
    Ok(())
}
