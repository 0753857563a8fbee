//! Configuration validation rules.
//!
//! This module validates configuration for correctness:
//! - At least one profile, and `default_profile` must name one of them
//! - Each profile needs an interpreter and a parseable package spec
//! - Probe commands must be non-empty and probe names unique per profile
//! - A secondary executable needs a query
//! - `${...}` references must be well formed

use crate::config::interpolation::parse_interpolation;
use crate::config::schema::{ProfileConfig, ProvisorConfig};
use crate::error::{ProvisorError, Result};
use crate::provision::PackageSpec;
use std::collections::HashSet;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Profile name if error is profile-specific
    pub profile: Option<String>,
}

impl ValidationError {
    fn global(rule: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            profile: None,
        }
    }

    fn in_profile(rule: &str, profile: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            profile: Some(profile.to_string()),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// This function collects all validation errors rather than stopping
/// at the first one, allowing users to fix multiple issues at once.
pub fn validate_config(config: &ProvisorConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.profiles.is_empty() {
        errors.push(ValidationError::global(
            "no-profiles",
            "No profiles defined".to_string(),
        ));
    }

    if let Some(default) = &config.default_profile {
        if !config.profiles.contains_key(default) {
            errors.push(ValidationError::global(
                "unknown-default-profile",
                format!("default_profile '{}' is not a defined profile", default),
            ));
        }
    }

    for (name, profile) in &config.profiles {
        errors.extend(validate_profile(name, profile));
    }

    errors
}

/// Validate a single profile.
pub fn validate_profile(name: &str, profile: &ProfileConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if profile.interpreter.as_os_str().is_empty() {
        errors.push(ValidationError::in_profile(
            "missing-interpreter",
            name,
            format!("Profile '{}' has an empty interpreter", name),
        ));
    }

    if profile
        .venv_path
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        errors.push(ValidationError::in_profile(
            "empty-venv-path",
            name,
            format!("Profile '{}' has an empty venv_path", name),
        ));
    }

    if let Err(e) = PackageSpec::parse(&profile.package) {
        errors.push(ValidationError::in_profile(
            "invalid-package",
            name,
            format!("Profile '{}': {}", name, e),
        ));
    }

    let mut seen = HashSet::new();
    for (index, probe) in profile.probes.iter().enumerate() {
        if probe.command.trim().is_empty() {
            errors.push(ValidationError::in_profile(
                "empty-probe-command",
                name,
                format!("Profile '{}': probe #{} has no command", name, index + 1),
            ));
        }

        // Unnamed probes get unique names when the plan is built.
        if let Some(probe_name) = probe.name.as_deref().filter(|n| !seen.insert(*n)) {
            errors.push(ValidationError::in_profile(
                "duplicate-probe-name",
                name,
                format!(
                    "Profile '{}': probe name '{}' is used more than once",
                    name, probe_name
                ),
            ));
        }

        for text in std::iter::once(&probe.command).chain(probe.args.iter()) {
            if let Err(message) = parse_interpolation(text) {
                errors.push(ValidationError::in_profile(
                    "bad-interpolation",
                    name,
                    format!("Profile '{}': {}", name, message),
                ));
            }
        }
    }

    if let Some(secondary) = &profile.secondary {
        if secondary.query.trim().is_empty() {
            errors.push(ValidationError::in_profile(
                "empty-secondary-query",
                name,
                format!(
                    "Profile '{}': secondary '{}' has no query",
                    name, secondary.name
                ),
            ));
        }
        if secondary.name.trim().is_empty() {
            errors.push(ValidationError::in_profile(
                "empty-secondary-name",
                name,
                format!("Profile '{}': secondary executable has no name", name),
            ));
        }
    }

    errors
}

/// Validate and return the first error as a [`ProvisorError`].
pub fn validate(config: &ProvisorConfig) -> Result<()> {
    match validate_config(config).into_iter().next() {
        Some(first) => Err(ProvisorError::ConfigValidationError {
            message: first.message,
        }),
        None => Ok(()),
    }
}
