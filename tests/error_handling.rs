// tests/error_handling.rs

use std::io::Write;

use tempfile::NamedTempFile;

use assetdag::config::{load_and_validate, load_from_str, ConfigFile};
use assetdag::errors::AssetdagError;
use assetdag::types::{OverrideConflict, ValidationMode};
use assetdag_test_utils::builders::{ConfigFileBuilder, EnvironmentConfigBuilder};

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(result: Result<ConfigFile, AssetdagError>, needle: &str) {
    match result {
        Err(AssetdagError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} should mention {needle:?}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_full_config_loads_with_all_sections() {
    let file = config_file(
        r#"
libraries = ["react", "react-dom"]

[config]
validation = "strict"
override_conflict = "reject"
app_token_length = 5
lib_token_length = 6

[dirs]
src = "app/"

[dirs.destination]
html = "pages/"

[environment.dev]
root = "out/dev/"
[environment.dev.runtime]
api = "https://dev.example.com"

[environment.localhost.runtime]
api = "http://localhost:8080"

[producer.scripts]
cmd = "node tools/bundle.js"

[[watch]]
glob = "app/styles/*.styl"
tasks = ["styles"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.libraries(), ["react".to_string(), "react-dom".to_string()]);
    assert_eq!(cfg.config().validation, ValidationMode::Strict);
    assert_eq!(cfg.config().override_conflict, OverrideConflict::Reject);
    assert_eq!(cfg.config().app_token_length, 5);
    assert_eq!(cfg.dirs().source_dir(&cfg.dirs().source.scripts), "app/scripts/");
    assert_eq!(cfg.dirs().destination.html, "pages/");
    assert_eq!(cfg.dirs().destination.js, "js/");
    assert_eq!(
        cfg.environment("dev").and_then(|e| e.root.as_deref()),
        Some("out/dev/")
    );
    assert!(cfg.producer("scripts").unwrap().effective_inject_runtime_config("scripts"));
    assert_eq!(cfg.watch_bindings().map(|w| w.len()), Some(1));
}

#[test]
fn test_empty_config_uses_defaults() {
    let cfg = ConfigFile::try_from(load_from_str("").unwrap()).unwrap();

    assert_eq!(cfg.config().validation, ValidationMode::Advisory);
    assert_eq!(cfg.config().override_conflict, OverrideConflict::Ignore);
    assert_eq!(cfg.config().app_token_length, 7);
    assert_eq!(cfg.config().lib_token_length, 8);
    assert_eq!(cfg.dirs().test_dir(), "test/");
    assert!(cfg.watch_bindings().is_none());
    assert!(cfg.libraries().is_empty());
}

#[test]
fn test_malformed_toml_returns_toml_error() {
    let file = config_file("[config\nvalidation = ");

    match load_and_validate(file.path()) {
        Err(AssetdagError::TomlError(_)) => {}
        other => panic!("Expected TomlError, got: {:?}", other),
    }
}

#[test]
fn test_unknown_validation_mode_is_toml_error() {
    let result = load_from_str("[config]\nvalidation = \"lenient\"\n");
    assert!(matches!(result, Err(AssetdagError::TomlError(_))));
}

#[test]
fn test_missing_file_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("Missing.toml"));
    assert!(matches!(result, Err(AssetdagError::IoError(_))));
}

#[test]
fn test_unknown_environment_returns_config_error() {
    let result = ConfigFileBuilder::new()
        .environment("staging", EnvironmentConfigBuilder::new().root("x/").build())
        .try_build();
    expect_config_error(result, "staging");
}

#[test]
fn test_production_fixed_names_are_rejected() {
    let result = ConfigFileBuilder::new()
        .environment(
            "production",
            EnvironmentConfigBuilder::new().app_file("app.js").build(),
        )
        .try_build();
    expect_config_error(result, "production");
}

#[test]
fn test_artifact_file_must_be_plain_name() {
    let result = ConfigFileBuilder::new()
        .environment("dev", EnvironmentConfigBuilder::new().lib_file("js/lib.js").build())
        .try_build();
    expect_config_error(result, "lib_file");
}

#[test]
fn test_overlapping_destinations_are_rejected() {
    let result = ConfigFileBuilder::new()
        .destination("css", "js")
        .try_build();
    expect_config_error(result, "js/");
}

#[test]
fn test_nested_destinations_are_rejected() {
    let result = ConfigFileBuilder::new()
        .destination("assets", "static/")
        .destination("js", "static/js/")
        .try_build();
    expect_config_error(result, "nested inside 'assets'");

    // Sibling names sharing a prefix do not nest.
    let cfg = ConfigFileBuilder::new()
        .destination("assets", "static/")
        .destination("js", "static2/")
        .try_build();
    assert!(cfg.is_ok());
}

#[test]
fn test_root_destination_may_hold_the_others() {
    let cfg = ConfigFileBuilder::new().destination("html", "").try_build();
    assert!(cfg.is_ok());
}

#[test]
fn test_reserved_library_name_is_rejected() {
    let result = ConfigFileBuilder::new()
        .library("react")
        .library("appconfiguration")
        .try_build();
    expect_config_error(result, "appconfiguration");
}

#[test]
fn test_unknown_producer_is_rejected() {
    let result = ConfigFileBuilder::new()
        .producer("fonts", "cp -r fonts build")
        .try_build();
    expect_config_error(result, "fonts");
}

#[test]
fn test_clean_is_not_configurable() {
    let result = ConfigFileBuilder::new().producer("clean", "rm -rf build").try_build();
    expect_config_error(result, "clean");
}

#[test]
fn test_watch_binding_without_tasks_is_rejected() {
    let result = ConfigFileBuilder::new().watch("src/**/*.js", &[]).try_build();
    expect_config_error(result, "at least one task");
}

#[test]
fn test_watch_binding_with_unknown_task_is_rejected() {
    let result = ConfigFileBuilder::new()
        .watch("src/**/*.coffee", &["coffee"])
        .try_build();
    expect_config_error(result, "coffee");
}

#[test]
fn test_invalid_watch_glob_is_rejected() {
    let result = ConfigFileBuilder::new().watch("src/[*.js", &["scripts"]).try_build();
    expect_config_error(result, "invalid watch glob");
}

#[test]
fn test_zero_token_length_is_rejected() {
    let result = ConfigFileBuilder::new().token_lengths(0, 8).try_build();
    expect_config_error(result, "app_token_length");
}

#[test]
fn test_error_messages_are_readable() {
    let err = AssetdagError::AmbiguousOverride(vec!["dev2".into(), "localhost".into()]);
    assert_eq!(
        err.to_string(),
        "Ambiguous environment overrides: dev2, localhost"
    );

    let err = AssetdagError::TaskNotFound("bundle".into());
    assert_eq!(err.to_string(), "Task not found: bundle");
}
