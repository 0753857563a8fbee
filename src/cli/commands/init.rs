//! Init command implementation.
//!
//! The `provisor init` command writes a starter `.provisor/config.yml`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::args::InitArgs;
use crate::config::{parse_config, validate, ConfigPaths, CONFIG_DIR};
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

const LOCAL_OVERRIDE_ENTRY: &str = ".provisor/config.local.yml";

/// The init command implementation.
pub struct InitCommand {
    project_root: PathBuf,
    args: InitArgs,
}

impl InitCommand {
    /// Create a new init command.
    pub fn new(project_root: &Path, args: InitArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Starter configuration content.
    pub fn starter_config() -> String {
        let interpreter = if cfg!(target_os = "windows") {
            "python"
        } else {
            "python3"
        };
        format!(
            "# provisor configuration\n\
             #\n\
             # Local overrides go in .provisor/config.local.yml.\n\
             # Probe arguments may use ${{python}}, ${{venv}}, ${{bin_dir}} and ${{profile}}.\n\
             \n\
             default_profile: default\n\
             \n\
             settings:\n\
             \x20 default_output: verbose  # verbose | normal | quiet | silent\n\
             \n\
             profiles:\n\
             \x20 default:\n\
             \x20   interpreter: {interpreter}\n\
             \x20   venv_path: .venv\n\
             \x20   package: \".[default]\"\n\
             \x20   # index_url: https://pypi.org/simple\n\
             \x20   # extra_index_url: https://example.com/simple\n\
             \x20   probes: []\n\
             \x20   # probes:\n\
             \x20   #   - command: my-tool\n\
             \x20   #     args: [\"--version\"]\n\
             \x20   #     policy: best_effort\n\
             \x20   # secondary:\n\
             \x20   #   name: deno\n\
             \x20   #   query: \"import deno; print(deno.find_deno_bin())\"\n"
        )
    }

    /// Add the local override file to an existing `.gitignore`.
    fn update_gitignore(&self, ui: &mut dyn UserInterface) -> Result<()> {
        let gitignore_path = self.project_root.join(".gitignore");
        if !gitignore_path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(&gitignore_path)?;
        if content.lines().any(|l| l.trim() == LOCAL_OVERRIDE_ENTRY) {
            return Ok(());
        }

        let separator = if content.is_empty() || content.ends_with('\n') {
            ""
        } else {
            "\n"
        };
        fs::write(
            &gitignore_path,
            format!("{}{}{}\n", content, separator, LOCAL_OVERRIDE_ENTRY),
        )?;
        ui.message(&format!("Added {} to .gitignore", LOCAL_OVERRIDE_ENTRY));
        Ok(())
    }
}

impl Command for InitCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let path = ConfigPaths::project_config_path(&self.project_root);
        if path.exists() && !self.args.force {
            ui.warning("Configuration already exists. Use --force to overwrite.");
            return Ok(CommandResult::failure(1));
        }

        let content = Self::starter_config();
        validate(&parse_config(&content, &path)?)?;

        fs::create_dir_all(self.project_root.join(CONFIG_DIR))?;
        fs::write(&path, content)?;
        ui.success(&format!("Created {}", path.display()));

        self.update_gitignore(ui)?;

        ui.show_hint("Edit the profile, then run `provisor plan` to review the steps.");
        Ok(CommandResult::success())
    }
}
