//! Run command implementation.
//!
//! The `provisor run` command provisions a profile and verifies it.

use crate::cli::args::RunArgs;
use crate::error::Result;
use crate::provision::preflight::DEFAULT_TIMEOUT;
use crate::provision::{
    index_urls, provision_and_verify, CommandRunner, IndexChecker, ProcessRunner, Profile,
    VerifyOptions,
};
use crate::ui::UserInterface;
use tracing::debug;

use super::dispatcher::{config_failure, Command, CommandResult, ConfigSource};

/// The run command implementation.
pub struct RunCommand {
    source: ConfigSource,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(source: ConfigSource, args: RunArgs) -> Self {
        Self { source, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    /// Execute using `runner` for every child process.
    pub fn run_with(
        &self,
        runner: &dyn CommandRunner,
        ui: &mut dyn UserInterface,
    ) -> Result<CommandResult> {
        let profile = match self.source.resolve_profile(&self.args.profile, ui) {
            Ok(profile) => profile,
            Err(e) => return config_failure(e, ui),
        };

        ui.show_header(&format!("Provisioning {}", profile.name));

        if !self.args.no_preflight && !index_urls(&profile.descriptor).is_empty() {
            preflight(IndexChecker::new(DEFAULT_TIMEOUT), &profile, ui);
        }

        let options = VerifyOptions {
            strict: self.args.strict,
            cwd: Some(self.source.project_root.clone()),
        };
        let report = provision_and_verify(&profile, runner, ui, &options)?;
        ui.show_report(&report);

        if let Some(path) = &self.args.report {
            match report.write_json(path) {
                Ok(()) => debug!(path = %path.display(), "Wrote run report"),
                Err(e) => ui.warning(&format!(
                    "Could not write report to {}: {}",
                    path.display(),
                    e
                )),
            }
        }

        match report.ensure_success() {
            Ok(()) => Ok(CommandResult::success()),
            Err(e) => {
                debug!(error = %e, "Run failed");
                Ok(CommandResult::failure(e.exit_code()))
            }
        }
    }
}

/// Warn about unreachable package indexes. Never fails the run.
fn preflight(
    checker: anyhow::Result<IndexChecker>,
    profile: &Profile,
    ui: &mut dyn UserInterface,
) {
    match checker {
        Ok(checker) => {
            for problem in checker.check_descriptor(&profile.descriptor) {
                ui.warning(&format!("Package index check failed: {}", problem));
            }
        }
        Err(e) => ui.warning(&format!("Package index check skipped: {:#}", e)),
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        // Mode must be settled before choosing a runner, so peek at config first.
        if let Ok(Some(config)) = self.source.load() {
            super::dispatcher::apply_default_output(ui, &config);
        }

        let runner = if ui.output_mode().shows_command_output() {
            ProcessRunner::streaming()
        } else {
            ProcessRunner::captured()
        };
        self.run_with(&runner, ui)
    }
}
