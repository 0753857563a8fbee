//! provisor - provision a Python package into an environment and verify it.
//!
//! provisor creates a virtual environment, upgrades the installer, installs
//! a package with its extras and then runs verification probes against the
//! installed tools. Probes can be fatal or best-effort, and a bundled
//! secondary executable can be located, made executable and version-checked.
//! The outcome of every step is collected into a [`provision::ProvisionReport`]
//! whose exit code is that of the first fatal failure.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`provision`] - Plans, execution and reports
//! - [`shell`] - Process execution and platform conventions
//! - [`ui`] - Spinners and terminal output
//!
//! # Example
//!
//! ```
//! use provisor::provision::{PackageSpec, EnvironmentDescriptor, Profile, ProvisionPlan};
//!
//! let mut package = PackageSpec::parse(".[default]").unwrap();
//! package.add_extra("curl-cffi");
//! let descriptor = EnvironmentDescriptor::new("python3", package).with_venv("/tmp/env1");
//! let profile = Profile::new("ci", descriptor);
//!
//! let plan = ProvisionPlan::build(&profile, &ProvisionPlan::context(&profile)).unwrap();
//! assert!(plan.render().contains(".[default,curl-cffi]"));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod provision;
pub mod shell;
pub mod ui;

pub use error::{ProvisorError, Result};
