//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, ProfileArgs};
use crate::config::{load_config, ConfigPaths, ProvisorConfig};
use crate::error::{ProvisorError, Result};
use crate::provision::{absolutize, select_profile, Profile};
use crate::ui::{OutputMode, UserInterface};

/// Message shown when a command needs a config that does not exist.
pub const NO_CONFIG_MESSAGE: &str = "No configuration found. Run 'provisor init' first.";

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Where a command finds its configuration.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Project root; relative paths in overrides resolve against it.
    pub project_root: PathBuf,

    /// Explicit config file from `--config`.
    pub config_override: Option<PathBuf>,
}

impl ConfigSource {
    /// Whether a config file is available.
    pub fn exists(&self) -> bool {
        match &self.config_override {
            Some(path) => path.exists(),
            None => ConfigPaths::discover(&self.project_root).has_project_config(),
        }
    }

    /// Load the config, or `None` when there is none to load.
    pub fn load(&self) -> Result<Option<ProvisorConfig>> {
        if self.config_override.is_none() && !self.exists() {
            return Ok(None);
        }
        load_config(&self.project_root, self.config_override.as_deref()).map(Some)
    }

    /// Load the config and resolve the profile `args` select.
    ///
    /// Without a config file, the profile is built from `args` alone when
    /// they name a package.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if there is neither a config nor `--package`,
    /// and `UnknownProfile` or `ConfigValidationError` for a bad selection.
    pub fn resolve_profile(
        &self,
        args: &ProfileArgs,
        ui: &mut dyn UserInterface,
    ) -> Result<Profile> {
        let config = match self.load()? {
            Some(config) => config,
            None if args.package.is_some() => ProvisorConfig::default(),
            None => {
                return Err(ProvisorError::ConfigNotFound {
                    path: ConfigPaths::project_config_path(&self.project_root),
                })
            }
        };

        apply_default_output(ui, &config);

        let mut profile = select_profile(&config, args.profile.as_deref(), &args.overrides())?;
        if let Some(venv) = &profile.descriptor.venv_path {
            profile.descriptor.venv_path = Some(absolutize(venv, &self.project_root));
        }
        Ok(profile)
    }
}

/// Turn a config or profile error into a reported failure.
///
/// A missing config exits with 2, a bad selection with 1. Anything else
/// is passed back up.
pub fn config_failure(err: ProvisorError, ui: &mut dyn UserInterface) -> Result<CommandResult> {
    match err {
        ProvisorError::ConfigNotFound { .. } => {
            ui.error(NO_CONFIG_MESSAGE);
            Ok(CommandResult::failure(2))
        }
        ProvisorError::UnknownProfile { .. }
        | ProvisorError::ConfigValidationError { .. }
        | ProvisorError::ConfigParseError { .. }
        | ProvisorError::InvalidPackageSpec { .. } => {
            ui.error(&err.to_string());
            Ok(CommandResult::failure(1))
        }
        other => Err(other),
    }
}

/// Use the config's `default_output` unless a flag already chose a mode.
pub fn apply_default_output(ui: &mut dyn UserInterface, config: &ProvisorConfig) {
    if ui.output_mode() == OutputMode::Normal {
        ui.set_output_mode(config.settings.default_output.into());
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    source: ConfigSource,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project root.
    pub fn new(project_root: PathBuf, config_override: Option<PathBuf>) -> Self {
        Self {
            source: ConfigSource {
                project_root,
                config_override,
            },
        }
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.source.project_root
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Run(args)) => {
                super::run::RunCommand::new(self.source.clone(), args.clone()).execute(ui)
            }
            Some(Commands::Plan(args)) => {
                super::plan::PlanCommand::new(self.source.clone(), args.clone()).execute(ui)
            }
            Some(Commands::Lint(args)) => {
                super::lint::LintCommand::new(self.source.clone(), args.clone()).execute(ui)
            }
            Some(Commands::List(args)) => {
                super::list::ListCommand::new(self.source.clone(), args.clone()).execute(ui)
            }
            Some(Commands::Init(args)) => {
                super::init::InitCommand::new(self.project_root(), args.clone()).execute(ui)
            }
            Some(Commands::Schema) => super::schema::SchemaCommand.execute(ui),
            Some(Commands::Completions(args)) => {
                super::completions::CompletionsCommand::new(args.clone()).execute(ui)
            }
            None => {
                // Default to run command with default args
                super::run::RunCommand::new(self.source.clone(), Default::default()).execute(ui)
            }
        }
    }
}
