//! Integration tests for config module public API.

use provisor::config::{
    load_config, load_merged_config, resolve_string, validate, validate_config,
    FailurePolicy, InterpolationContext, OutputMode, ProvisorConfig,
};
use provisor::provision::{select_profile, ProfileOverrides};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, name: &str, content: &str) {
    let dir = root.join(".provisor");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn public_api_is_accessible() {
    let _config = ProvisorConfig::default();
    let _ctx = InterpolationContext::new();
    let _mode = OutputMode::Verbose;
}

#[test]
fn full_config_workflow() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "config.yml",
        r#"
profiles:
  ci:
    venv_path: /tmp/env1
    package: ".[default]"
    env:
      TOOL_HOME: /opt/tool
    probes:
      - command: "${bin_dir}/yt-dlp"
        args: ["--home", "${TOOL_HOME}"]
"#,
    );

    let config = load_merged_config(temp.path()).unwrap();
    validate(&config).unwrap();

    let profile = select_profile(&config, None, &ProfileOverrides::default()).unwrap();
    assert_eq!(profile.name, "ci");
    assert_eq!(profile.probes[0].failure_policy, FailurePolicy::BestEffort);

    let ctx = InterpolationContext::new()
        .with_builtin("bin_dir", "/tmp/env1/bin");
    let command = resolve_string(&profile.probes[0].command, &ctx).unwrap();
    assert_eq!(command, "/tmp/env1/bin/yt-dlp");
}

#[test]
fn config_merge_workflow() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "config.yml",
        r#"
settings:
  default_output: verbose
profiles:
  ci:
    package: ".[default]"
    index_url: https://pypi.example/simple
    probes:
      - command: yt-dlp
        args: ["-v"]
"#,
    );
    write(
        temp.path(),
        "config.local.yml",
        r#"
settings:
  default_output: quiet
profiles:
  ci:
    index_url: ~
    probes:
      - command: yt-dlp
        args: ["--version"]
        policy: fatal
"#,
    );

    let config = load_merged_config(temp.path()).unwrap();
    let ci = &config.profiles["ci"];

    // Setting overridden by local
    assert_eq!(config.settings.default_output, OutputMode::Quiet);
    // Base value kept
    assert_eq!(ci.package, ".[default]");
    // null removes the key
    assert_eq!(ci.index_url, None);
    // Arrays are replaced, not appended
    assert_eq!(ci.probes.len(), 1);
    assert_eq!(ci.probes[0].policy, FailurePolicy::Fatal);
}

#[test]
fn explicit_file_skips_local_overrides() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "config.yml", "profiles:\n  ci:\n    package: base\n");
    write(temp.path(), "config.local.yml", "profiles:\n  ci:\n    package: local\n");

    let merged = load_config(temp.path(), None).unwrap();
    assert_eq!(merged.profiles["ci"].package, "local");

    let only = load_config(temp.path(), Some(&temp.path().join(".provisor/config.yml"))).unwrap();
    assert_eq!(only.profiles["ci"].package, "base");
}

#[test]
fn validation_collects_every_problem() {
    let config: ProvisorConfig = serde_yaml::from_str(
        r#"
default_profile: missing
profiles:
  ci:
    interpreter: ""
    package: "pkg[a"
    probes:
      - command: ""
"#,
    )
    .unwrap();

    let rules: Vec<String> = validate_config(&config).into_iter().map(|e| e.rule).collect();
    assert_eq!(
        rules,
        vec![
            "unknown-default-profile",
            "missing-interpreter",
            "invalid-package",
            "empty-probe-command"
        ]
    );
}
