//! Run reports.
//!
//! A [`ProvisionReport`] records every planned step, including the ones a
//! fatal failure kept from running, and carries the overall exit code.

use crate::error::{ProvisorError, Result};
use crate::provision::plan::{PlannedStep, StepKind};
use crate::provision::probe::FailurePolicy;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

/// First dotted version number in a block of text.
static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\.\d+)+").expect("VERSION_REGEX must compile")
});

/// How a step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    /// Exited zero.
    Completed,
    /// Fatal step that failed and stopped the run.
    Failed,
    /// Best-effort step that failed; the run went on.
    Ignored,
    /// Skipped because an earlier fatal step failed.
    NotRun,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
            StepStatus::Ignored => "ignored",
            StepStatus::NotRun => "not-run",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub kind: StepKind,
    /// Effective policy, after `--strict`.
    pub policy: FailurePolicy,
    pub command: String,
    pub status: StepStatus,
    /// Exit code; `None` if the step did not run or was killed by a signal.
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    /// Version number found in the step's output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl StepRecord {
    /// Record for a step that never ran.
    pub fn not_run(step: &PlannedStep, policy: FailurePolicy) -> Self {
        Self {
            name: step.name.clone(),
            kind: step.kind,
            policy,
            command: step.display_command(),
            status: StepStatus::NotRun,
            exit_code: None,
            duration_ms: 0,
            version: None,
        }
    }

    /// Record for a step that ran.
    pub fn ran(
        step: &PlannedStep,
        policy: FailurePolicy,
        command: String,
        status: StepStatus,
        exit_code: Option<i32>,
        duration: Duration,
    ) -> Self {
        Self {
            name: step.name.clone(),
            kind: step.kind,
            policy,
            command,
            status,
            exit_code,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            version: None,
        }
    }
}

/// The failure that ended a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FatalFailure {
    /// Step that failed.
    pub step: String,

    /// Exit code the run ends with.
    pub exit_code: i32,

    /// Extra detail, e.g. a spawn or resolution error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Everything that happened during one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub profile: String,

    /// SHA-256 of the environment descriptor.
    pub fingerprint: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// One record per planned step, in order.
    pub steps: Vec<StepRecord>,

    /// Path of the secondary executable, once resolved.
    pub resolved_executable: Option<PathBuf>,

    /// Set when a fatal step failed.
    pub failure: Option<FatalFailure>,
}

impl ProvisionReport {
    /// An empty report starting now.
    pub fn start(profile: &str, fingerprint: &str) -> Self {
        let now = Utc::now();
        Self {
            profile: profile.to_string(),
            fingerprint: fingerprint.to_string(),
            started_at: now,
            finished_at: now,
            steps: Vec::new(),
            resolved_executable: None,
            failure: None,
        }
    }

    /// Stamp the finish time.
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    /// 0, or the exit code of the fatal step that ended the run.
    pub fn exit_code(&self) -> i32 {
        self.failure.as_ref().map_or(0, |f| f.exit_code)
    }

    /// Whether the run succeeded.
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    /// `StepFailed` for the first fatal failure, if any.
    pub fn ensure_success(&self) -> Result<()> {
        match &self.failure {
            None => Ok(()),
            Some(failure) => Err(ProvisorError::StepFailed {
                step: failure.step.clone(),
                exit_code: failure.exit_code,
            }),
        }
    }

    /// Record by step name.
    pub fn step(&self, name: &str) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Number of steps with `status`.
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    /// Pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| anyhow::Error::from(e).into())
    }

    /// Write the report as pretty JSON to `path`.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()? + "\n")?;
        Ok(())
    }
}

/// First dotted version number in `output`, e.g. `2025.01.15` or `2.1.4`.
pub fn extract_version(output: &str) -> Option<String> {
    VERSION_REGEX.find(output).map(|m| m.as_str().to_string())
}
