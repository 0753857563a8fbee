//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::provision::ProfileOverrides;

/// provisor - Provision a Python package into an environment and verify it.
#[derive(Debug, Parser)]
#[command(name = "provisor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides .provisor/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides discovery from the current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Stream command output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Provision and verify a profile (default if no command specified)
    Run(RunArgs),

    /// Show the steps a run would execute
    Plan(PlanArgs),

    /// Validate configuration files
    Lint(LintArgs),

    /// List configured profiles
    List(ListArgs),

    /// Write a starter configuration
    Init(InitArgs),

    /// Print the JSON Schema of the config file
    Schema,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Profile selection and overrides shared by `run` and `plan`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ProfileArgs {
    /// Profile to use
    #[arg(long)]
    pub profile: Option<String>,

    /// Interpreter that creates the venv
    #[arg(long, value_name = "PATH")]
    pub interpreter: Option<PathBuf>,

    /// Virtual environment root
    #[arg(long, value_name = "DIR")]
    pub venv: Option<PathBuf>,

    /// Package spec to install (e.g. ".[default]")
    #[arg(long, value_name = "SPEC")]
    pub package: Option<String>,

    /// Extra to add to the package spec (repeatable)
    #[arg(long = "extra", value_name = "NAME")]
    pub extras: Vec<String>,

    /// Package index replacing the default one
    #[arg(long, value_name = "URL")]
    pub index_url: Option<String>,

    /// Additional package index
    #[arg(long, value_name = "URL")]
    pub extra_index_url: Option<String>,

    /// Recreate the venv from scratch
    #[arg(long)]
    pub clear: bool,

    /// Skip upgrading pip
    #[arg(long)]
    pub no_upgrade_installer: bool,
}

impl ProfileArgs {
    /// Overrides to apply on top of the selected profile.
    pub fn overrides(&self) -> ProfileOverrides {
        ProfileOverrides {
            interpreter: self.interpreter.clone(),
            venv_path: self.venv.clone(),
            package: self.package.clone(),
            extras: self.extras.clone(),
            index_url: self.index_url.clone(),
            extra_index_url: self.extra_index_url.clone(),
            clear_venv: self.clear,
            no_upgrade_installer: self.no_upgrade_installer,
        }
    }
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Treat failing best-effort probes as fatal
    #[arg(long)]
    pub strict: bool,

    /// Write a JSON run report to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Skip the package index reachability check
    #[arg(long)]
    pub no_preflight: bool,
}

/// Arguments for the `plan` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `lint` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct LintArgs {
    /// Output format: human, json
    #[arg(long, default_value = "human")]
    pub format: String,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `init` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InitArgs {
    /// Overwrite existing configuration
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
