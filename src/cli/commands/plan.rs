//! Plan command implementation.
//!
//! The `provisor plan` command shows the steps a run would execute without
//! executing any of them.

use crate::cli::args::PlanArgs;
use crate::error::Result;
use crate::provision::ProvisionPlan;
use crate::ui::UserInterface;

use super::dispatcher::{config_failure, Command, CommandResult, ConfigSource};

/// The plan command implementation.
pub struct PlanCommand {
    source: ConfigSource,
    args: PlanArgs,
}

impl PlanCommand {
    /// Create a new plan command.
    pub fn new(source: ConfigSource, args: PlanArgs) -> Self {
        Self { source, args }
    }
}

impl Command for PlanCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let profile = match self.source.resolve_profile(&self.args.profile, ui) {
            Ok(profile) => profile,
            Err(e) => return config_failure(e, ui),
        };
        let ctx = ProvisionPlan::context(&profile);
        let plan = ProvisionPlan::build(&profile, &ctx)?;

        if self.args.json {
            println!("{}", plan.to_json()?);
        } else {
            ui.message(plan.render().trim_end());
        }
        Ok(CommandResult::success())
    }
}
