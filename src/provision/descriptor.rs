//! Environment descriptors and profiles.
//!
//! A [`Profile`] is one variant of the provisioning procedure: an
//! [`EnvironmentDescriptor`] saying where and what to install, plus the
//! probes that verify the result. Profiles come from the config file, from
//! command-line overrides, or both.

use crate::config::schema::{ProfileConfig, ProvisorConfig};
use crate::config::validator::validate_profile;
use crate::error::{ProvisorError, Result};
use crate::provision::package::PackageSpec;
use crate::provision::probe::{SecondaryExecutable, VerificationProbe};
use crate::provision::venv::ActiveEnvironment;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Where to install, what to install, and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentDescriptor {
    /// Interpreter used to create the venv, or to install into directly.
    pub interpreter: PathBuf,

    /// Venv root. When unset, packages go into `interpreter`'s environment.
    pub venv_path: Option<PathBuf>,

    /// What to install.
    pub package: PackageSpec,

    /// Replacement package index.
    pub index_url: Option<String>,

    /// Additional package index.
    pub extra_index_url: Option<String>,

    /// Upgrade pip before installing.
    pub upgrade_installer: bool,

    /// Pass `-U` to the package install.
    pub upgrade_package: bool,

    /// Pass `-v` to pip.
    pub verbose_install: bool,

    /// Recreate the venv from scratch.
    pub clear_venv: bool,

    /// Extra environment for every step.
    pub env: BTreeMap<String, String>,
}

impl EnvironmentDescriptor {
    /// A descriptor installing `package` with `interpreter` and default flags.
    pub fn new(interpreter: impl Into<PathBuf>, package: PackageSpec) -> Self {
        Self {
            interpreter: interpreter.into(),
            venv_path: None,
            package,
            index_url: None,
            extra_index_url: None,
            upgrade_installer: true,
            upgrade_package: true,
            verbose_install: true,
            clear_venv: false,
            env: BTreeMap::new(),
        }
    }

    /// Install into a venv rooted at `path`.
    pub fn with_venv(mut self, path: impl Into<PathBuf>) -> Self {
        self.venv_path = Some(path.into());
        self
    }

    /// The environment steps run in once the venv (if any) exists.
    pub fn active_environment(&self) -> ActiveEnvironment {
        match &self.venv_path {
            Some(root) => ActiveEnvironment::activate(root, &self.env),
            None => ActiveEnvironment::system(&self.interpreter, &self.env),
        }
    }

    /// Hex SHA-256 of the descriptor's JSON form.
    ///
    /// Equal descriptors always produce equal fingerprints.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&json))
    }
}

/// A named, fully resolved provisioning variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    /// Profile name.
    pub name: String,

    /// Install target and options.
    pub descriptor: EnvironmentDescriptor,

    /// Probes, run in order after install.
    pub probes: Vec<VerificationProbe>,

    /// Bundled executable to locate and check last.
    pub secondary: Option<SecondaryExecutable>,
}

impl Profile {
    /// A profile with no probes.
    pub fn new(name: &str, descriptor: EnvironmentDescriptor) -> Self {
        Self {
            name: name.to_string(),
            descriptor,
            probes: Vec::new(),
            secondary: None,
        }
    }

    /// Append a probe.
    pub fn with_probe(mut self, probe: VerificationProbe) -> Self {
        self.probes.push(probe);
        self
    }

    /// Set the secondary executable.
    pub fn with_secondary(mut self, secondary: SecondaryExecutable) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Build a profile from its config section.
    ///
    /// `global_env` (from `settings.env`) is overridden by the profile's own `env`.
    pub fn from_config(
        name: &str,
        config: &ProfileConfig,
        global_env: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let package = PackageSpec::parse(&config.package)?;

        let mut env = global_env.clone();
        env.extend(config.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        let descriptor = EnvironmentDescriptor {
            interpreter: config.interpreter.clone(),
            venv_path: config.venv_path.clone(),
            package,
            index_url: config.index_url.clone(),
            extra_index_url: config.extra_index_url.clone(),
            upgrade_installer: config.upgrade_installer,
            upgrade_package: config.upgrade_package,
            verbose_install: config.verbose_install,
            clear_venv: config.clear_venv,
            env,
        };

        Ok(Self {
            name: name.to_string(),
            descriptor,
            probes: config.probes.iter().map(VerificationProbe::from).collect(),
            secondary: config.secondary.as_ref().map(SecondaryExecutable::from),
        })
    }
}

/// Command-line adjustments applied on top of a configured profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileOverrides {
    pub interpreter: Option<PathBuf>,
    pub venv_path: Option<PathBuf>,
    pub package: Option<String>,
    pub extras: Vec<String>,
    pub index_url: Option<String>,
    pub extra_index_url: Option<String>,
    pub clear_venv: bool,
    pub no_upgrade_installer: bool,
}

impl ProfileOverrides {
    /// Write the overrides into a profile config.
    pub fn apply(&self, config: &mut ProfileConfig) {
        if let Some(interpreter) = &self.interpreter {
            config.interpreter = interpreter.clone();
        }
        if let Some(venv) = &self.venv_path {
            config.venv_path = Some(venv.clone());
        }
        if let Some(package) = &self.package {
            config.package = package.clone();
        }
        if let Some(url) = &self.index_url {
            config.index_url = Some(url.clone());
        }
        if let Some(url) = &self.extra_index_url {
            config.extra_index_url = Some(url.clone());
        }
        if self.clear_venv {
            config.clear_venv = true;
        }
        if self.no_upgrade_installer {
            config.upgrade_installer = false;
        }
    }
}

/// Name given to a profile built purely from command-line flags.
pub const AD_HOC_PROFILE: &str = "command-line";

/// Pick the profile to run and apply overrides.
///
/// With no profiles configured, a profile is built from the overrides alone,
/// which then must include a package.
pub fn select_profile(
    config: &ProvisorConfig,
    requested: Option<&str>,
    overrides: &ProfileOverrides,
) -> Result<Profile> {
    let (name, mut profile_config) = if config.profiles.is_empty() {
        if overrides.package.is_none() {
            return Err(ProvisorError::ConfigValidationError {
                message: "No profiles defined; pass --package to run without a config"
                    .to_string(),
            });
        }
        (
            requested.unwrap_or(AD_HOC_PROFILE).to_string(),
            ProfileConfig::default(),
        )
    } else {
        let name = requested
            .or_else(|| config.default_profile_name())
            .ok_or_else(|| ProvisorError::ConfigValidationError {
                message: format!(
                    "Several profiles are defined ({}); choose one with --profile",
                    config
                        .profiles
                        .keys()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })?;
        let profile_config = config.profiles.get(name).cloned().ok_or_else(|| {
            ProvisorError::UnknownProfile {
                name: name.to_string(),
            }
        })?;
        (name.to_string(), profile_config)
    };

    overrides.apply(&mut profile_config);

    if let Some(first) = validate_profile(&name, &profile_config).into_iter().next() {
        return Err(ProvisorError::ConfigValidationError {
            message: first.message,
        });
    }

    let mut profile = Profile::from_config(&name, &profile_config, &config.settings.env)?;
    for extra in &overrides.extras {
        profile.descriptor.package.add_extra(extra);
    }
    Ok(profile)
}

/// Resolve `path` against `base` when it is relative.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
