//! Lint command implementation.
//!
//! The `provisor lint` command validates the configuration and reports every
//! problem it finds.

use crate::cli::args::LintArgs;
use crate::config::{validate_config, ConfigPaths, ValidationError};
use crate::error::{ProvisorError, Result};
use crate::ui::UserInterface;

use super::dispatcher::{apply_default_output, config_failure, Command, CommandResult, ConfigSource};

/// The lint command implementation.
pub struct LintCommand {
    source: ConfigSource,
    args: LintArgs,
}

impl LintCommand {
    /// Create a new lint command.
    pub fn new(source: ConfigSource, args: LintArgs) -> Self {
        Self { source, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &LintArgs {
        &self.args
    }

    fn not_found(&self) -> ProvisorError {
        ProvisorError::ConfigNotFound {
            path: ConfigPaths::project_config_path(&self.source.project_root),
        }
    }

    fn format_json(errors: &[ValidationError]) -> Result<String> {
        let items: Vec<serde_json::Value> = errors
            .iter()
            .map(|e| {
                serde_json::json!({
                    "rule": e.rule,
                    "profile": e.profile,
                    "message": e.message,
                })
            })
            .collect();
        let doc = serde_json::json!({ "valid": errors.is_empty(), "errors": items });
        serde_json::to_string_pretty(&doc).map_err(|e| anyhow::Error::from(e).into())
    }

    fn format_human(error: &ValidationError) -> String {
        match &error.profile {
            Some(profile) => format!("error[{}] {}: {}", error.rule, profile, error.message),
            None => format!("error[{}]: {}", error.rule, error.message),
        }
    }
}

impl Command for LintCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = match self.source.load() {
            Ok(Some(config)) => config,
            Ok(None) => return config_failure(self.not_found(), ui),
            Err(e) => return config_failure(e, ui),
        };

        apply_default_output(ui, &config);

        let errors = validate_config(&config);

        if self.args.format == "json" {
            ui.message(&Self::format_json(&errors)?);
        } else if errors.is_empty() {
            ui.success("Configuration is valid!");
        } else {
            for error in &errors {
                ui.error(&Self::format_human(error));
            }
            ui.message(&format!("\n{} problem(s) found", errors.len()));
        }

        if errors.is_empty() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}
