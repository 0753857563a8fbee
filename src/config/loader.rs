//! Configuration file discovery and loading.
//!
//! This module handles finding and loading configuration files from
//! the project directory in the correct priority order.

use crate::config::merger::merge_configs;
use crate::config::schema::ProvisorConfig;
use crate::error::{ProvisorError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".provisor";

/// Paths to configuration files in priority order (later overrides earlier).
///
/// Merge order:
/// 1. Project config (`.provisor/config.yml`)
/// 2. Local overrides (`.provisor/config.local.yml`)
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project config: .provisor/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .provisor/config.local.yml
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            project: existing(Self::project_config_path(project_root)),
            project_local: existing(project_root.join(CONFIG_DIR).join("config.local.yml")),
        }
    }

    /// Where the project config lives, whether or not it exists.
    pub fn project_config_path(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_DIR).join("config.yml")
    }

    /// Returns all existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.project.iter().chain(self.project_local.iter()).collect()
    }

    /// Check if any project config exists.
    pub fn has_project_config(&self) -> bool {
        self.project.is_some()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Find the project root by walking up from `start`.
///
/// The first directory containing `.provisor/` wins.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_DIR).is_dir())
        .map(Path::to_path_buf)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ProvisorError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ProvisorError::Io(e)
        }
    })
}

/// Load a single config file and parse it.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<ProvisorConfig> {
    let content = read(path)?;
    parse_config(&content, path)
}

/// Parse YAML content into a [`ProvisorConfig`].
///
/// `source_path` is only used for error reporting.
pub fn parse_config(content: &str, source_path: &Path) -> Result<ProvisorConfig> {
    if content.trim().is_empty() {
        return Ok(ProvisorConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| ProvisorError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a config file as a raw YAML value (for merging).
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = read(path)?;
    serde_yaml::from_str(&content).map_err(|e| ProvisorError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load and merge the project config with its local overrides.
///
/// # Errors
///
/// Returns `ConfigNotFound` if no project config exists.
/// Returns `ConfigParseError` if any config file is invalid.
pub fn load_merged_config(project_root: &Path) -> Result<ProvisorConfig> {
    let paths = ConfigPaths::discover(project_root);

    if !paths.has_project_config() {
        return Err(ProvisorError::ConfigNotFound {
            path: ConfigPaths::project_config_path(project_root),
        });
    }

    let layers = paths
        .all_existing()
        .into_iter()
        .map(|path| load_config_value(path))
        .collect::<Result<Vec<_>>>()?;

    let merged = merge_configs(&layers);
    if merged.is_null() || merged.as_mapping().is_some_and(|m| m.is_empty()) {
        return Ok(ProvisorConfig::default());
    }

    serde_yaml::from_value(merged).map_err(|e| ProvisorError::ConfigParseError {
        path: ConfigPaths::project_config_path(project_root),
        message: format!("Failed to parse merged config: {}", e),
    })
}

/// Load config with optional path override.
///
/// If `config_override` is provided, loads only that file without merging.
/// Otherwise, discovers and merges the project config files.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<ProvisorConfig> {
    match config_override {
        Some(path) => load_config_file(path),
        None => load_merged_config(project_root),
    }
}
