//! Configuration loading, parsing, and validation for provisor.
//!
//! This module handles all aspects of configuration:
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Layered merging in [`merger`]
//! - Validation in [`validator`]
//! - Variable interpolation in [`interpolation`]
//!
//! # Example
//!
//! ```
//! use provisor::config::{load_merged_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".provisor");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "profiles:\n  ci:\n    package: tool\n").unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.default_profile_name(), Some("ci"));
//! ```
//!
//! # Configuration File Locations
//!
//! provisor discovers and merges configuration in this order:
//! 1. Project config (`.provisor/config.yml`)
//! 2. Local overrides (`.provisor/config.local.yml`)

pub mod interpolation;
pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use schema::{
    FailurePolicy, OutputMode, ProbeConfig, ProfileConfig, ProvisorConfig, SecondaryConfig,
    Settings,
};

pub use loader::{
    find_project_root, load_config, load_config_file, load_config_value, load_merged_config,
    parse_config, ConfigPaths, CONFIG_DIR,
};

pub use merger::{deep_merge, merge_configs};

pub use validator::{validate, validate_config, validate_profile, ValidationError};

pub use interpolation::{
    extract_variables, parse_interpolation, resolve_string, InterpolationContext, Segment,
};
