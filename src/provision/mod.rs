//! Environment provisioning and verification.
//!
//! - [`package`]: package specs with extras
//! - [`descriptor`]: what to install where, and profiles
//! - [`probe`]: verification probes and failure policies
//! - [`venv`]: scoped venv activation
//! - [`plan`]: the ordered steps of a run
//! - [`runner`]: the process-execution seam
//! - [`secondary`]: locating the bundled executable
//! - [`verifier`]: running a plan
//! - [`report`]: what a run did
//! - [`preflight`]: package index reachability
//!
//! # Example
//!
//! ```
//! use provisor::provision::{
//!     provision_and_verify, EnvironmentDescriptor, PackageSpec, Profile, ScriptedRunner,
//!     VerificationProbe, VerifyOptions,
//! };
//! use provisor::ui::MockUI;
//!
//! let descriptor = EnvironmentDescriptor::new("python3", PackageSpec::parse(".[default]").unwrap())
//!     .with_venv("/tmp/env1");
//! let profile = Profile::new("ci", descriptor)
//!     .with_probe(VerificationProbe::best_effort("yt-dlp", ["-v"]));
//!
//! let runner = ScriptedRunner::new().fail_on("yt-dlp", 2);
//! let mut ui = MockUI::new();
//! let report = provision_and_verify(&profile, &runner, &mut ui, &VerifyOptions::default()).unwrap();
//! assert_eq!(report.exit_code(), 0);
//! ```

pub mod descriptor;
pub mod package;
pub mod plan;
pub mod preflight;
pub mod probe;
pub mod report;
pub mod runner;
pub mod secondary;
pub mod venv;
pub mod verifier;

pub use descriptor::{
    absolutize, select_profile, EnvironmentDescriptor, Profile, ProfileOverrides, AD_HOC_PROFILE,
};
pub use package::PackageSpec;
pub use plan::{PlannedStep, ProvisionPlan, StepKind};
pub use preflight::{index_urls, IndexChecker};
pub use probe::{FailurePolicy, SecondaryExecutable, VerificationProbe};
pub use report::{extract_version, FatalFailure, ProvisionReport, StepRecord, StepStatus};
pub use runner::{CommandRunner, ProcessRunner, ScriptedOutcome, ScriptedRunner};
pub use secondary::{ensure_executable, resolve_path};
pub use venv::ActiveEnvironment;
pub use verifier::{execute_plan, provision_and_verify, VerifyOptions};
