// tests/cli_run.rs

mod common;

use std::error::Error;

use clap::Parser;

use assetdag::cli::{CliArgs, Command};
use assetdag::config::model::{ConfigFile, RawConfigFile};
use assetdag::environment::{EnvName, EnvironmentResolver, OverrideFlags, Target};
use assetdag::types::ValidationMode;
use assetdag::{invocation, run, RunStatus};

use common::{init_tracing, sample_project, with_timeout, write_file};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn test_defaults_to_dev_with_default_config() {
    let args = CliArgs::try_parse_from(["assetdag"]).unwrap();

    assert_eq!(args.command(), Command::Dev);
    let (path, explicit) = args.config_path();
    assert_eq!(path, std::path::PathBuf::from("Assetdag.toml"));
    assert!(!explicit);
    assert!(!args.dry_run);
}

#[test]
fn test_global_flags_after_subcommand() {
    let args = CliArgs::try_parse_from([
        "assetdag",
        "watch",
        "--localhost",
        "--validation",
        "strict",
        "--config",
        "site/Assetdag.toml",
    ])
    .unwrap();

    assert_eq!(args.command(), Command::Watch);
    assert!(args.localhost);
    assert!(!args.dev2);
    assert_eq!(args.validation, Some(ValidationMode::Strict));
    assert!(args.config_path().1);
}

#[test]
fn test_alt_dev_alias() {
    let args = CliArgs::try_parse_from(["assetdag", "dev", "--alt-dev"]).unwrap();
    assert!(args.dev2);
}

#[test]
fn test_dev2_command_wins_over_localhost_flag() {
    let args = CliArgs::try_parse_from(["assetdag", "dev2", "--localhost"]).unwrap();

    let (target, flags) = invocation(&args, args.command());
    assert_eq!(target, Target::Dev);
    assert_eq!(flags, OverrideFlags::dev2());

    let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
    let env = EnvironmentResolver::from_config(&cfg, "/work/site")
        .resolve(target, &flags)
        .unwrap();
    assert_eq!(env.name(), EnvName::Dev2);
}

#[test]
fn test_build_command_drops_override_flags() {
    let args = CliArgs::try_parse_from(["assetdag", "build", "--localhost", "--dev2"]).unwrap();

    assert_eq!(
        invocation(&args, args.command()),
        (Target::Dev, OverrideFlags::none())
    );
}

#[test]
fn test_unknown_validation_mode_is_rejected() {
    assert!(CliArgs::try_parse_from(["assetdag", "--validation", "lenient"]).is_err());
}

#[tokio::test]
async fn test_dry_run_touches_nothing() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    sample_project(dir.path());
    write_file(dir.path(), "Assetdag.toml", "[producer.scripts]\ncmd = \"exit 1\"\n");
    let config = dir.path().join("Assetdag.toml").to_string_lossy().into_owned();

    let args = CliArgs::try_parse_from([
        "assetdag",
        "production",
        "--dry-run",
        "--config",
        config.as_str(),
    ])?;
    let status = with_timeout(run(args)).await?;

    assert_eq!(status, RunStatus::Success);
    assert!(!dir.path().join("build").exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_explicit_config_is_an_error() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("Nope.toml").to_string_lossy().into_owned();

    let args = CliArgs::try_parse_from([
        "assetdag",
        "build",
        "--config",
        config.as_str(),
    ])?;

    assert!(with_timeout(run(args)).await.is_err());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_build_exit_status_follows_blocking_failures() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    sample_project(dir.path());
    let config = dir.path().join("Assetdag.toml").to_string_lossy().into_owned();

    write_file(
        dir.path(),
        "Assetdag.toml",
        "[producer.lint]\ncmd = \"exit 1\"\n\n\
         [producer.styles]\ncmd = \"mkdir -p \\\"$ASSETDAG_OUTPUT_PATH\\\" && echo css > \\\"$ASSETDAG_OUTPUT_PATH/main.css\\\"\"\n",
    );
    let args = |mode: &str| {
        CliArgs::try_parse_from([
            "assetdag",
            "build",
            "--validation",
            mode,
            "--config",
            config.as_str(),
        ])
    };

    // An advisory lint failure does not fail the build.
    let status = with_timeout(run(args("advisory")?)).await?;
    assert_eq!(status, RunStatus::Success);
    assert!(dir.path().join("build/dev/css/main.css").exists());
    assert!(dir.path().join("build/dev/assets/logo.svg").exists());

    let status = with_timeout(run(args("strict")?)).await?;
    assert_eq!(status, RunStatus::Failed);
    assert_eq!(status.exit_code(), 1);
    // Clean ran, nothing after lint did.
    assert!(!dir.path().join("build/dev/css/main.css").exists());
    Ok(())
}
