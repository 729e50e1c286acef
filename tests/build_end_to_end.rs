// tests/build_end_to_end.rs

mod common;

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use assetdag::cachebust::CacheBuster;
use assetdag::config::ConfigFile;
use assetdag::engine::{RunOutcome, TaskStatus};
use assetdag::environment::{Environment, EnvironmentResolver, OverrideFlags, Target};
use assetdag::pipeline::{self, Pipeline};
use assetdag::types::ValidationMode;
use assetdag_test_utils::builders::{ConfigFileBuilder, EnvironmentConfigBuilder};
use assetdag_test_utils::fake_producer::{ArtifactName, CallLog, RecordingProducer};

use common::{init_tracing, sample_project, snapshot_tree, with_timeout, write_file};

type TestResult = Result<(), Box<dyn Error>>;

/// Pipeline for `root` whose script/style/view/library producers write fixed
/// artifacts. `clean` and `resources` keep their built-in producers.
fn fake_pipeline(cfg: &ConfigFile, root: &Path, log: &CallLog) -> Result<Pipeline, Box<dyn Error>> {
    let pipeline = Pipeline::from_config(cfg, root)?
        .with_producer(
            pipeline::SCRIPTS,
            RecordingProducer::succeeding(log)
                .writing(ArtifactName::App, "var app=1;")
                .shared(),
        )?
        .with_producer(
            pipeline::LIBRARIES,
            RecordingProducer::succeeding(log)
                .writing(ArtifactName::Lib, "var lib=1;")
                .shared(),
        )?
        .with_producer(
            pipeline::STYLES,
            RecordingProducer::succeeding(log)
                .writing(ArtifactName::Fixed("main.css".into()), "body{color:red}")
                .shared(),
        )?
        .with_producer(
            pipeline::VIEWS,
            RecordingProducer::succeeding(log)
                .writing(ArtifactName::Fixed("index.html".into()), "<html><body></body></html>")
                .shared(),
        )?;
    Ok(pipeline)
}

async fn build(pipeline: &Pipeline, env: &Environment) -> Result<RunOutcome, Box<dyn Error>> {
    let executor = pipeline.executor(ValidationMode::Advisory);
    let outcome = with_timeout(executor.run(pipeline::BUILD, Arc::new(env.clone()))).await?;
    Ok(outcome)
}

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    sample_project(dir.path());
    dir
}

#[tokio::test]
async fn test_dev_build_lays_out_artifacts() -> TestResult {
    init_tracing();
    let dir = project();
    let cfg = ConfigFileBuilder::new().build();
    let log = CallLog::new();
    let pipeline = fake_pipeline(&cfg, dir.path(), &log)?;
    let env = EnvironmentResolver::from_config(&cfg, dir.path())
        .resolve(Target::Dev, &OverrideFlags::none())?;

    let outcome = build(&pipeline, &env).await?;
    assert!(outcome.is_success(), "{outcome:?}");

    let tree = snapshot_tree(&dir.path().join("build/dev"));
    let files: BTreeSet<&str> = tree.keys().map(String::as_str).collect();
    let expected: BTreeSet<&str> = [
        "assets/logo.svg",
        "assets/robots.txt",
        "css/main.css",
        "index.html",
        "js/app.js",
        "js/lib.js",
    ]
    .into_iter()
    .collect();
    assert_eq!(files, expected);
    assert_eq!(tree["assets/logo.svg"], b"<svg/>".to_vec());

    // Producers see the task's sources and output location.
    let scripts = log
        .calls()
        .into_iter()
        .find(|c| c.task == pipeline::SCRIPTS)
        .ok_or("scripts never ran")?;
    assert_eq!(scripts.source_glob.as_deref(), Some("src/scripts/**/*.{js,jsx}"));
    assert_eq!(scripts.output_path, Some(dir.path().join("build/dev/js")));
    Ok(())
}

#[tokio::test]
async fn test_rebuild_is_byte_identical() -> TestResult {
    init_tracing();
    let dir = project();
    let cfg = ConfigFileBuilder::new().build();
    let log = CallLog::new();
    let pipeline = fake_pipeline(&cfg, dir.path(), &log)?;
    let env = EnvironmentResolver::from_config(&cfg, dir.path())
        .resolve(Target::Dev, &OverrideFlags::none())?;
    let out = dir.path().join("build/dev");

    build(&pipeline, &env).await?;
    let first = snapshot_tree(&out);
    build(&pipeline, &env).await?;
    let second = snapshot_tree(&out);

    assert!(!first.is_empty());
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_clean_removes_stale_outputs() -> TestResult {
    init_tracing();
    let dir = project();
    write_file(dir.path(), "build/dev/js/old-bundle.js", "stale");
    let cfg = ConfigFileBuilder::new().build();
    let log = CallLog::new();
    let pipeline = fake_pipeline(&cfg, dir.path(), &log)?;
    let env = EnvironmentResolver::from_config(&cfg, dir.path())
        .resolve(Target::Dev, &OverrideFlags::none())?;

    let outcome = build(&pipeline, &env).await?;

    assert_eq!(outcome.status_of(pipeline::CLEAN), Some(TaskStatus::Succeeded));
    let tree = snapshot_tree(&dir.path().join("build/dev"));
    assert!(!tree.contains_key("js/old-bundle.js"));
    assert!(tree.contains_key("js/app.js"));
    // Sources are untouched.
    assert!(dir.path().join("src/scripts/main.js").exists());
    Ok(())
}

#[tokio::test]
async fn test_clean_refuses_to_remove_project_root() -> TestResult {
    init_tracing();
    let dir = project();
    let cfg = ConfigFileBuilder::new()
        .environment(
            "dev",
            EnvironmentConfigBuilder::new().root(".").build(),
        )
        .build();
    let log = CallLog::new();
    let pipeline = fake_pipeline(&cfg, dir.path(), &log)?;
    let env = EnvironmentResolver::from_config(&cfg, dir.path())
        .resolve(Target::Dev, &OverrideFlags::none())?;

    let outcome = build(&pipeline, &env).await?;

    let diagnostic = outcome.failed.get(pipeline::CLEAN).ok_or("clean did not fail")?;
    assert!(diagnostic.contains("project root"));
    assert!(dir.path().join("src/scripts/main.js").exists());
    assert!(log.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_production_names_change_but_contents_do_not() -> TestResult {
    init_tracing();
    let dir = project();
    let cfg = ConfigFileBuilder::new().build();
    let log = CallLog::new();
    let pipeline = fake_pipeline(&cfg, dir.path(), &log)?;
    let resolver = EnvironmentResolver::from_config(&cfg, dir.path());
    let out = dir.path().join("build/production");

    let first_env =
        resolver.resolve_with(Target::Production, &OverrideFlags::none(), &mut CacheBuster::seeded(1))?;
    build(&pipeline, &first_env).await?;
    let first = snapshot_tree(&out);

    let second_env =
        resolver.resolve_with(Target::Production, &OverrideFlags::none(), &mut CacheBuster::seeded(2))?;
    build(&pipeline, &second_env).await?;
    let second = snapshot_tree(&out);

    assert_ne!(first_env.app_artifact(), second_env.app_artifact());
    assert!(first.contains_key(&format!("js/{}", first_env.app_artifact())));
    assert!(second.contains_key(&format!("js/{}", second_env.app_artifact())));
    // Clean ran first, so the old names are gone.
    assert!(!second.contains_key(&format!("js/{}", first_env.app_artifact())));

    let by_content = |tree: &BTreeMap<String, Vec<u8>>| {
        let mut contents: Vec<Vec<u8>> = tree.values().cloned().collect();
        contents.sort();
        contents
    };
    assert_eq!(by_content(&first), by_content(&second));

    let non_scripts = |tree: &BTreeMap<String, Vec<u8>>| -> BTreeMap<String, Vec<u8>> {
        tree.iter()
            .filter(|(k, _)| !k.starts_with("js/"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    };
    assert_eq!(non_scripts(&first), non_scripts(&second));
    Ok(())
}

#[tokio::test]
async fn test_environments_write_to_separate_roots() -> TestResult {
    init_tracing();
    let dir = project();
    let cfg = ConfigFileBuilder::new().build();
    let log = CallLog::new();
    let pipeline = fake_pipeline(&cfg, dir.path(), &log)?;
    let resolver = EnvironmentResolver::from_config(&cfg, dir.path());

    let dev = resolver.resolve(Target::Dev, &OverrideFlags::none())?;
    let prod = resolver.resolve(Target::Production, &OverrideFlags::none())?;
    build(&pipeline, &dev).await?;
    let dev_before = snapshot_tree(dev.output_root());
    build(&pipeline, &prod).await?;

    assert_eq!(snapshot_tree(dev.output_root()), dev_before);
    assert!(!snapshot_tree(prod.output_root()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_plan_lists_every_task_in_dependency_order() -> TestResult {
    let dir = project();
    let cfg = ConfigFileBuilder::new().build();
    let pipeline = Pipeline::from_config(&cfg, dir.path())?;

    let plan = pipeline.plan()?;

    assert_eq!(plan.len(), 9);
    assert_eq!(plan.first().map(String::as_str), Some(pipeline::CLEAN));
    assert_eq!(plan.get(1).map(String::as_str), Some(pipeline::LINT));
    assert_eq!(plan.last().map(String::as_str), Some(pipeline::BUILD));
    Ok(())
}

#[test]
fn test_with_producer_rejects_unknown_task() {
    let dir = project();
    let cfg = ConfigFileBuilder::new().build();
    let log = CallLog::new();

    let result = Pipeline::from_config(&cfg, dir.path())
        .and_then(|p| p.with_producer("fonts", RecordingProducer::succeeding(&log).shared()));

    assert!(matches!(
        result,
        Err(assetdag::errors::AssetdagError::TaskNotFound(name)) if name == "fonts"
    ));
}
