//! Schema command implementation.
//!
//! The `provisor schema` command prints the JSON Schema of the config file,
//! for editor completion and validation.

use crate::config::ProvisorConfig;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The schema command implementation.
pub struct SchemaCommand;

impl SchemaCommand {
    /// Render the config schema as pretty JSON.
    pub fn render() -> Result<String> {
        let schema = schemars::schema_for!(ProvisorConfig);
        serde_json::to_string_pretty(&schema).map_err(|e| anyhow::Error::from(e).into())
    }
}

impl Command for SchemaCommand {
    fn execute(&self, _ui: &mut dyn UserInterface) -> Result<CommandResult> {
        println!("{}", Self::render()?);
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_describes_profiles() {
        let json: serde_json::Value = serde_json::from_str(&SchemaCommand::render().unwrap()).unwrap();
        assert_eq!(json["title"], "ProvisorConfig");
        assert!(json["properties"]["profiles"].is_object());
        assert!(json["properties"]["default_profile"].is_object());
    }
}
