//! List command implementation.
//!
//! The `provisor list` command lists the configured profiles.

use crate::cli::args::ListArgs;
use crate::config::{ConfigPaths, ProvisorConfig};
use crate::error::{ProvisorError, Result};
use crate::ui::{ProvisorTheme, UserInterface};

use super::dispatcher::{apply_default_output, config_failure, Command, CommandResult, ConfigSource};

/// The list command implementation.
pub struct ListCommand {
    source: ConfigSource,
    args: ListArgs,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(source: ConfigSource, args: ListArgs) -> Self {
        Self { source, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ListArgs {
        &self.args
    }

    fn to_json(config: &ProvisorConfig) -> Result<String> {
        let default = config.default_profile_name();
        let profiles: Vec<serde_json::Value> = config
            .profiles
            .iter()
            .map(|(name, profile)| {
                serde_json::json!({
                    "name": name,
                    "default": Some(name.as_str()) == default,
                    "package": profile.package,
                    "interpreter": profile.interpreter,
                    "venv_path": profile.venv_path,
                    "probes": profile.probes.len(),
                    "secondary": profile.secondary.as_ref().map(|s| s.name.as_str()),
                })
            })
            .collect();
        serde_json::to_string_pretty(&profiles).map_err(|e| anyhow::Error::from(e).into())
    }

    fn show(config: &ProvisorConfig, ui: &mut dyn UserInterface) {
        let theme = ProvisorTheme::new();
        let default = config.default_profile_name();

        ui.message(&format!("  {}", theme.header.apply_to("Profiles:")));
        for (name, profile) in &config.profiles {
            let marker = if Some(name.as_str()) == default {
                format!(" {}", theme.dim.apply_to("(default)"))
            } else {
                String::new()
            };
            ui.message(&format!(
                "    {}{} {} {}",
                theme.highlight.apply_to(name),
                marker,
                theme.dim.apply_to("·"),
                theme.command.apply_to(&profile.package)
            ));

            let location = match &profile.venv_path {
                Some(venv) => format!("venv {}", venv.display()),
                None => format!("system {}", profile.interpreter.display()),
            };
            ui.message(&format!("      {}", theme.dim.apply_to(location)));
        }
    }
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = match self.source.load() {
            Ok(Some(config)) => config,
            Ok(None) => {
                let err = ProvisorError::ConfigNotFound {
                    path: ConfigPaths::project_config_path(&self.source.project_root),
                };
                return config_failure(err, ui);
            }
            Err(e) => return config_failure(e, ui),
        };

        apply_default_output(ui, &config);

        if self.args.json {
            println!("{}", Self::to_json(&config)?);
        } else if config.profiles.is_empty() {
            ui.warning("No profiles defined");
        } else {
            Self::show(&config, ui);
        }

        Ok(CommandResult::success())
    }
}
