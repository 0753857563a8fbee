//! Configuration schema definitions for provisor.
//!
//! This module contains all the struct definitions that map to
//! the YAML configuration file format.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure for `.provisor/config.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProvisorConfig {
    /// Profile used when `--profile` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    /// Global settings
    pub settings: Settings,

    /// Named provisioning profiles
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

impl ProvisorConfig {
    /// Name of the profile to use when none is requested.
    ///
    /// Falls back to the only profile when exactly one is defined.
    pub fn default_profile_name(&self) -> Option<&str> {
        if let Some(name) = &self.default_profile {
            return Some(name.as_str());
        }
        if self.profiles.len() == 1 {
            return self.profiles.keys().next().map(|k| k.as_str());
        }
        None
    }
}

/// Global settings that apply to every profile
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Settings {
    /// Default output mode
    #[serde(default)]
    pub default_output: OutputMode,

    /// Environment variables added to every step
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Output verbosity mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Verbose,
    Normal,
    Quiet,
    Silent,
}

/// How a step's non-zero exit affects the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the run and propagate the exit code
    Fatal,
    /// Record the failure and continue
    #[default]
    BestEffort,
}

/// One provisioning variant: where to install, what, and how to verify it
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProfileConfig {
    /// Interpreter used to create the venv, or to install into directly
    pub interpreter: PathBuf,

    /// Virtual environment root; installs go to the interpreter when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venv_path: Option<PathBuf>,

    /// Package spec, e.g. `.[default,curl-cffi]` or `tool[extra] @ https://...`
    pub package: String,

    /// Replaces the default package index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_url: Option<String>,

    /// Adds a package index next to the default one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_index_url: Option<String>,

    /// Upgrade pip before installing
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub upgrade_installer: bool,

    /// Pass `-U` to the package install
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub upgrade_package: bool,

    /// Pass `-v` to pip
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub verbose_install: bool,

    /// Recreate the venv from scratch
    #[serde(default, skip_serializing_if = "is_false")]
    pub clear_venv: bool,

    /// Extra environment variables for every step of this profile
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Verification probes, run in order after install
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub probes: Vec<ProbeConfig>,

    /// Bundled executable located through the installed package
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<SecondaryConfig>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from(default_interpreter()),
            venv_path: None,
            package: String::new(),
            index_url: None,
            extra_index_url: None,
            upgrade_installer: true,
            upgrade_package: true,
            verbose_install: true,
            clear_venv: false,
            env: BTreeMap::new(),
            probes: Vec::new(),
            secondary: None,
        }
    }
}

/// A post-install verification command
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProbeConfig {
    /// Display name (defaults to the command)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Program to run, looked up on the active PATH
    pub command: String,

    /// Arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Failure policy (defaults to best_effort)
    pub policy: FailurePolicy,
}

/// Secondary executable resolved from the installed package
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SecondaryConfig {
    /// Display name
    pub name: String,

    /// Python code that prints the executable's path
    pub query: String,

    /// Arguments for the version check
    pub args: Vec<String>,

    /// Failure policy of the version check (defaults to fatal)
    pub policy: FailurePolicy,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            name: "secondary".to_string(),
            query: String::new(),
            args: vec!["--version".to_string()],
            policy: FailurePolicy::Fatal,
        }
    }
}

fn default_interpreter() -> &'static str {
    if cfg!(target_os = "windows") {
        "python"
    } else {
        "python3"
    }
}

fn default_true() -> bool {
    true
}

fn is_false(v: &bool) -> bool {
    !v
}

fn is_true(v: &bool) -> bool {
    *v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_profile() {
        let yaml = r#"
default_profile: ci
profiles:
  ci:
    interpreter: /opt/python3.12/bin/python3
    venv_path: /tmp/env1
    package: ".[default,curl-cffi]"
    index_url: https://pypi.example/simple
    upgrade_installer: false
    probes:
      - command: yt-dlp
        args: ["-v"]
      - name: strict-check
        command: yt-dlp
        args: ["--version"]
        policy: fatal
    secondary:
      name: deno
      query: "import deno; print(deno.find_deno_bin())"
"#;
        let config: ProvisorConfig = serde_yaml::from_str(yaml).unwrap();
        let profile = &config.profiles["ci"];

        assert_eq!(config.default_profile.as_deref(), Some("ci"));
        assert_eq!(profile.interpreter, PathBuf::from("/opt/python3.12/bin/python3"));
        assert_eq!(profile.venv_path, Some(PathBuf::from("/tmp/env1")));
        assert!(!profile.upgrade_installer);
        assert!(profile.upgrade_package);
        assert!(profile.verbose_install);
        assert_eq!(profile.probes.len(), 2);
        assert_eq!(profile.probes[0].policy, FailurePolicy::BestEffort);
        assert_eq!(profile.probes[1].policy, FailurePolicy::Fatal);

        let secondary = profile.secondary.as_ref().unwrap();
        assert_eq!(secondary.name, "deno");
        assert_eq!(secondary.args, vec!["--version"]);
        assert_eq!(secondary.policy, FailurePolicy::Fatal);
    }

    #[test]
    fn profile_defaults() {
        let profile = ProfileConfig::default();
        assert!(profile.upgrade_installer);
        assert!(profile.upgrade_package);
        assert!(!profile.clear_venv);
        assert!(profile.venv_path.is_none());
        assert!(profile.probes.is_empty());
    }

    #[test]
    fn single_profile_is_the_default() {
        let yaml = "profiles:\n  only:\n    package: tool\n";
        let config: ProvisorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.default_profile_name(), Some("only"));
    }

    #[test]
    fn no_default_with_several_profiles() {
        let yaml = "profiles:\n  a:\n    package: x\n  b:\n    package: y\n";
        let config: ProvisorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.default_profile_name(), None);
    }

    #[test]
    fn output_mode_parses_lowercase() {
        let yaml = "settings:\n  default_output: quiet\n";
        let config: ProvisorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.settings.default_output, OutputMode::Quiet);
    }

    #[test]
    fn failure_policy_serializes_snake_case() {
        let yaml = serde_yaml::to_string(&FailurePolicy::BestEffort).unwrap();
        assert_eq!(yaml.trim(), "best_effort");
    }

    #[test]
    fn serialization_skips_defaults() {
        let profile = ProfileConfig {
            package: "tool".to_string(),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&profile).unwrap();
        assert!(!yaml.contains("upgrade_installer"));
        assert!(!yaml.contains("clear_venv"));
        assert!(yaml.contains("package: tool"));
    }
}
