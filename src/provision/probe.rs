//! Verification probes and the secondary executable.

use crate::config::schema::{ProbeConfig, SecondaryConfig};
use serde::Serialize;
use std::fmt;

pub use crate::config::schema::FailurePolicy;

impl FailurePolicy {
    /// Whether a failure aborts the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FailurePolicy::Fatal)
    }

    /// Apply `--strict`: every step becomes fatal.
    pub fn promoted(self, strict: bool) -> Self {
        if strict {
            FailurePolicy::Fatal
        } else {
            self
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Fatal => write!(f, "fatal"),
            FailurePolicy::BestEffort => write!(f, "best-effort"),
        }
    }
}

/// A command run after install to check the installed tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationProbe {
    /// Display name.
    pub name: String,

    /// Program, looked up on the active PATH.
    pub command: String,

    /// Arguments.
    pub args: Vec<String>,

    /// What a non-zero exit does to the run.
    pub failure_policy: FailurePolicy,
}

impl VerificationProbe {
    /// A best-effort probe.
    pub fn best_effort<I, S>(command: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: command.to_string(),
            command: command.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            failure_policy: FailurePolicy::BestEffort,
        }
    }

    /// A fatal probe.
    pub fn fatal<I, S>(command: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failure_policy: FailurePolicy::Fatal,
            ..Self::best_effort(command, args)
        }
    }

    /// Rename the probe.
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl From<&ProbeConfig> for VerificationProbe {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            name: config
                .name
                .clone()
                .unwrap_or_else(|| config.command.clone()),
            command: config.command.clone(),
            args: config.args.clone(),
            failure_policy: config.policy,
        }
    }
}

/// An executable shipped inside the installed package, found by asking the
/// package for its location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecondaryExecutable {
    /// Display name.
    pub name: String,

    /// Python code that prints the executable's path.
    pub query: String,

    /// Arguments for the version check.
    pub args: Vec<String>,

    /// Policy of the version check. Resolution itself is always fatal.
    pub failure_policy: FailurePolicy,
}

impl SecondaryExecutable {
    /// A secondary executable checked with `--version`, fatal on failure.
    pub fn new(name: &str, query: &str) -> Self {
        Self {
            name: name.to_string(),
            query: query.to_string(),
            args: vec!["--version".to_string()],
            failure_policy: FailurePolicy::Fatal,
        }
    }
}

impl From<&SecondaryConfig> for SecondaryExecutable {
    fn from(config: &SecondaryConfig) -> Self {
        Self {
            name: config.name.clone(),
            query: config.query.clone(),
            args: config.args.clone(),
            failure_policy: config.policy,
        }
    }
}
