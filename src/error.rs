//! Error types for provisor operations.
//!
//! This module defines [`ProvisorError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - A failing provisioning step is *not* an error: it is recorded in the
//!   [`ProvisionReport`](crate::provision::ProvisionReport) so its exit code
//!   can pass through unchanged
//! - Use `ProvisorError` for problems that stop provisor itself
//! - Use `anyhow::Error` (via `ProvisorError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for provisor operations.
#[derive(Debug, Error)]
pub enum ProvisorError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// Requested profile is not defined.
    #[error("Unknown profile: {name}")]
    UnknownProfile { name: String },

    /// Package spec could not be parsed.
    #[error("Invalid package spec '{spec}': {message}")]
    InvalidPackageSpec { spec: String, message: String },

    /// A child process could not be started at all.
    #[error("Failed to start '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The secondary executable could not be located or prepared.
    #[error("Could not resolve '{name}': {message}")]
    ResolutionFailed { name: String, message: String },

    /// A fatal step exited unsuccessfully.
    #[error("Step '{step}' failed with exit code {exit_code}")]
    StepFailed { step: String, exit_code: i32 },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProvisorError {
    /// Exit code a shell would report for this error.
    ///
    /// Spawn failures follow POSIX shell conventions: 127 when the program
    /// does not exist, 126 when it exists but could not be executed.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProvisorError::SpawnFailed { source, .. } => {
                if source.kind() == std::io::ErrorKind::NotFound {
                    127
                } else {
                    126
                }
            }
            ProvisorError::StepFailed { exit_code, .. } => *exit_code,
            ProvisorError::ConfigNotFound { .. } => 2,
            _ => 1,
        }
    }
}

/// Result type alias for provisor operations.
pub type Result<T> = std::result::Result<T, ProvisorError>;
