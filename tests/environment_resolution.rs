// tests/environment_resolution.rs

use std::path::Path;

use serde_json::json;

use assetdag::cachebust::CacheBuster;
use assetdag::config::ConfigFile;
use assetdag::environment::{EnvName, EnvironmentResolver, OverrideFlags, Target};
use assetdag::errors::AssetdagError;
use assetdag::types::OverrideConflict;
use assetdag_test_utils::builders::{ConfigFileBuilder, EnvironmentConfigBuilder};

const PROJECT: &str = "/work/site";

fn layered_config(conflict: OverrideConflict) -> ConfigFile {
    ConfigFileBuilder::new()
        .override_conflict(conflict)
        .environment(
            "dev",
            EnvironmentConfigBuilder::new()
                .root("build/dev/")
                .app_file("app.js")
                .lib_file("lib.js")
                .runtime(json!({ "api": "https://dev.example.com" }))
                .build(),
        )
        .environment(
            "localhost",
            EnvironmentConfigBuilder::new()
                .runtime(json!({ "api": "http://localhost:8080" }))
                .build(),
        )
        .environment(
            "dev2",
            EnvironmentConfigBuilder::new()
                .root("build/dev2/")
                .runtime(json!({ "api": "https://dev2.example.com" }))
                .build(),
        )
        .environment(
            "production",
            EnvironmentConfigBuilder::new()
                .root("/srv/www/")
                .runtime(json!({ "api": "https://example.com" }))
                .build(),
        )
        .build()
}

fn resolver(conflict: OverrideConflict) -> EnvironmentResolver {
    EnvironmentResolver::from_config(&layered_config(conflict), PROJECT)
}

#[test]
fn test_default_is_dev_rooted_at_project() {
    let env = resolver(OverrideConflict::Ignore)
        .resolve(Target::Dev, &OverrideFlags::none())
        .unwrap();

    assert_eq!(env.name(), EnvName::Dev);
    assert_eq!(env.output_root(), Path::new("/work/site/build/dev/"));
    assert_eq!(env.app_artifact(), "app.js");
    assert_eq!(env.lib_artifact(), "lib.js");
    assert_eq!(env.runtime_config(), &json!({ "api": "https://dev.example.com" }));
    assert_eq!(env.node_env(), "development");
}

#[test]
fn test_single_override_merges_over_dev() {
    let env = resolver(OverrideConflict::Ignore)
        .resolve(Target::Dev, &OverrideFlags::localhost())
        .unwrap();

    assert_eq!(env.name(), EnvName::Localhost);
    // Inherited from dev.
    assert_eq!(env.output_root(), Path::new("/work/site/build/dev/"));
    assert_eq!(env.app_artifact(), "app.js");
    // Taken from the override.
    assert_eq!(env.runtime_config(), &json!({ "api": "http://localhost:8080" }));
}

#[test]
fn test_dev2_override_wins_on_root() {
    let env = resolver(OverrideConflict::Ignore)
        .resolve(Target::Dev, &OverrideFlags::dev2())
        .unwrap();

    assert_eq!(env.name(), EnvName::Dev2);
    assert_eq!(env.output_root(), Path::new("/work/site/build/dev2/"));
    assert_eq!(env.lib_artifact(), "lib.js");
    assert_eq!(env.runtime_config(), &json!({ "api": "https://dev2.example.com" }));
}

#[test]
fn test_two_overrides_fall_back_to_dev_when_ignored() {
    let flags = OverrideFlags {
        localhost: true,
        dev2: true,
    };
    let resolver = resolver(OverrideConflict::Ignore);

    let env = resolver.resolve(Target::Dev, &flags).unwrap();
    let plain = resolver.resolve(Target::Dev, &OverrideFlags::none()).unwrap();

    assert_eq!(env, plain);
}

#[test]
fn test_two_overrides_are_rejected_when_configured() {
    let flags = OverrideFlags {
        localhost: true,
        dev2: true,
    };

    match resolver(OverrideConflict::Reject).resolve(Target::Dev, &flags) {
        Err(AssetdagError::AmbiguousOverride(names)) => {
            assert_eq!(names, vec!["dev2".to_string(), "localhost".to_string()]);
        }
        other => panic!("Expected AmbiguousOverride, got: {:?}", other),
    }
}

#[test]
fn test_resolution_is_deterministic_for_every_flag_combination() {
    let resolver = resolver(OverrideConflict::Ignore);

    for localhost in [false, true] {
        for dev2 in [false, true] {
            let flags = OverrideFlags { localhost, dev2 };
            let a = resolver.resolve(Target::Dev, &flags).unwrap();
            let b = resolver.resolve(Target::Dev, &flags).unwrap();
            assert_eq!(a, b, "flags {flags:?}");
        }
    }
}

#[test]
fn test_production_uses_cache_bust_names() {
    let env = resolver(OverrideConflict::Ignore)
        .resolve(Target::Production, &OverrideFlags::none())
        .unwrap();

    assert_eq!(env.name(), EnvName::Production);
    assert!(env.is_production());
    assert_eq!(env.node_env(), "production");
    // Absolute roots are kept as is.
    assert_eq!(env.output_root(), Path::new("/srv/www/"));

    let app = env.app_artifact().strip_suffix(".js").unwrap();
    let lib = env.lib_artifact().strip_suffix(".js").unwrap();
    assert_eq!(app.len(), 7);
    assert_eq!(lib.len(), 8);
    assert!(app.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(env.runtime_config(), &json!({ "api": "https://example.com" }));
}

#[test]
fn test_production_ignores_override_flags() {
    let resolver = resolver(OverrideConflict::Reject);
    let flags = OverrideFlags {
        localhost: true,
        dev2: true,
    };

    let env = resolver
        .resolve_with(Target::Production, &flags, &mut CacheBuster::seeded(1))
        .unwrap();
    assert_eq!(env.name(), EnvName::Production);
}

#[test]
fn test_seeded_production_resolution_repeats() {
    let resolver = resolver(OverrideConflict::Ignore);
    let flags = OverrideFlags::none();

    let a = resolver
        .resolve_with(Target::Production, &flags, &mut CacheBuster::seeded(42))
        .unwrap();
    let b = resolver
        .resolve_with(Target::Production, &flags, &mut CacheBuster::seeded(42))
        .unwrap();

    assert_eq!(a, b);
    assert_ne!(a.app_artifact(), a.lib_artifact());
}

#[test]
fn test_configured_token_lengths_apply() {
    let cfg = ConfigFileBuilder::new().token_lengths(3, 12).build();
    let env = EnvironmentResolver::from_config(&cfg, PROJECT)
        .resolve(Target::Production, &OverrideFlags::none())
        .unwrap();

    assert_eq!(env.app_artifact().len(), 3 + ".js".len());
    assert_eq!(env.lib_artifact().len(), 12 + ".js".len());
    assert_eq!(env.output_root(), Path::new("/work/site/build/production/"));
}

#[test]
fn test_defaults_without_environment_sections() {
    let cfg = ConfigFileBuilder::new().build();
    let env = EnvironmentResolver::from_config(&cfg, PROJECT)
        .resolve(Target::Dev, &OverrideFlags::localhost())
        .unwrap();

    assert_eq!(env.name(), EnvName::Localhost);
    assert_eq!(env.output_root(), Path::new("/work/site/build/dev/"));
    assert_eq!(env.runtime_config(), &json!({}));
    assert_eq!(env.runtime_config_module(), "module.exports={}");
}

#[test]
fn test_output_path_joins_subpaths() {
    let env = resolver(OverrideConflict::Ignore)
        .resolve(Target::Dev, &OverrideFlags::none())
        .unwrap();

    assert_eq!(env.output_path("js/"), Path::new("/work/site/build/dev/js"));
    assert_eq!(env.output_path(""), env.output_root());
}

#[test]
fn test_env_names_round_trip_through_strings() {
    for name in EnvName::ALL {
        assert_eq!(name.as_str().parse::<EnvName>(), Ok(name));
        assert_eq!(name.is_cache_busting(), name == EnvName::Production);
    }
    assert!("staging".parse::<EnvName>().is_err());
}
