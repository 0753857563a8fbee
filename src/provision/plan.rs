//! Turning a profile into an ordered list of steps.
//!
//! Every command a run could execute is known before the first one starts,
//! except the secondary executable's path, which only the resolve step can
//! produce. Its version step carries a placeholder program until then.

use crate::config::interpolation::{resolve_string, InterpolationContext};
use crate::error::Result;
use crate::provision::descriptor::{EnvironmentDescriptor, Profile};
use crate::provision::probe::FailurePolicy;
use crate::provision::venv::ActiveEnvironment;
use crate::shell::Invocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use tracing::debug;

/// What a step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    CreateVenv,
    UpgradeInstaller,
    Install,
    Probe,
    ResolveSecondary,
    SecondaryVersion,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepKind::CreateVenv => "create-venv",
            StepKind::UpgradeInstaller => "upgrade-installer",
            StepKind::Install => "install",
            StepKind::Probe => "probe",
            StepKind::ResolveSecondary => "resolve-secondary",
            StepKind::SecondaryVersion => "secondary-version",
        };
        write!(f, "{}", s)
    }
}

/// One step of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    /// Unique name within the plan.
    pub name: String,

    /// What the step does.
    pub kind: StepKind,

    /// Policy before `--strict` is applied.
    pub policy: FailurePolicy,

    /// Command to run. For [`StepKind::SecondaryVersion`] the program is a
    /// placeholder; see [`PlannedStep::with_program`].
    pub invocation: Invocation,

    /// Whether the step runs inside the activated venv.
    pub activated: bool,
}

impl PlannedStep {
    /// The command as shown to users.
    pub fn display_command(&self) -> String {
        if self.kind == StepKind::SecondaryVersion && !self.invocation.args.is_empty() {
            format!("{} {}", self.invocation.program, self.invocation.quoted_args())
        } else if self.kind == StepKind::SecondaryVersion {
            self.invocation.program.clone()
        } else {
            self.invocation.to_string()
        }
    }

    /// Copy of the invocation with a concrete program.
    pub fn with_program(&self, program: &str) -> Invocation {
        Invocation::new(program).args(self.invocation.args.iter().cloned())
    }
}

/// Machine-readable view of a step.
#[derive(Debug, Serialize)]
struct StepView<'a> {
    name: &'a str,
    kind: StepKind,
    policy: FailurePolicy,
    command: String,
    activated: bool,
}

/// The full, ordered set of steps for one profile.
#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    /// Profile name.
    pub profile: String,

    /// Fingerprint of the profile's descriptor.
    pub fingerprint: String,

    /// Steps in execution order.
    pub steps: Vec<PlannedStep>,

    /// Environment for steps before activation.
    pub base: ActiveEnvironment,

    /// Environment for activated steps.
    pub environment: ActiveEnvironment,
}

impl ProvisionPlan {
    /// Interpolation context for a profile: its `env`, the built-ins and the
    /// process environment.
    pub fn context(profile: &Profile) -> InterpolationContext {
        let env = profile.descriptor.active_environment();
        let mut ctx = InterpolationContext::new()
            .with_system_env()
            .with_builtin("python", env.python().display().to_string())
            .with_builtin("profile", profile.name.clone());
        if let Some(venv) = env.venv() {
            ctx = ctx.with_builtin("venv", venv.display().to_string());
        }
        if let Some(bin) = env.bin_dir() {
            ctx = ctx.with_builtin("bin_dir", bin.display().to_string());
        }
        ctx.vars.extend(
            profile
                .descriptor
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        ctx
    }

    /// Build the plan for `profile`.
    ///
    /// # Errors
    ///
    /// Fails if a probe or secondary argument names an unknown variable.
    pub fn build(profile: &Profile, ctx: &InterpolationContext) -> Result<Self> {
        let descriptor = &profile.descriptor;
        let base = ActiveEnvironment::system(&descriptor.interpreter, &descriptor.env);
        let environment = descriptor.active_environment();
        let python = environment.python().display().to_string();
        let mut steps = Vec::new();

        if let Some(venv) = &descriptor.venv_path {
            let mut invocation = Invocation::new(descriptor.interpreter.display().to_string())
                .args(["-m", "venv"]);
            if descriptor.clear_venv {
                invocation = invocation.arg("--clear");
            }
            steps.push(PlannedStep {
                name: "create-venv".to_string(),
                kind: StepKind::CreateVenv,
                policy: FailurePolicy::Fatal,
                invocation: invocation.arg(venv.display().to_string()),
                activated: false,
            });
        }

        if descriptor.upgrade_installer {
            steps.push(PlannedStep {
                name: "upgrade-installer".to_string(),
                kind: StepKind::UpgradeInstaller,
                policy: FailurePolicy::Fatal,
                invocation: pip_install(&python, descriptor.verbose_install)
                    .args(["-U", "pip"]),
                activated: true,
            });
        }

        steps.push(PlannedStep {
            name: "install".to_string(),
            kind: StepKind::Install,
            policy: FailurePolicy::Fatal,
            invocation: install_invocation(&python, descriptor),
            activated: true,
        });

        for probe in &profile.probes {
            let command = resolve_string(&probe.command, ctx)?;
            let args = probe
                .args
                .iter()
                .map(|a| resolve_string(a, ctx))
                .collect::<Result<Vec<_>>>()?;
            steps.push(PlannedStep {
                name: unique_name(&steps, &probe.name),
                kind: StepKind::Probe,
                policy: probe.failure_policy,
                invocation: Invocation::new(command).args(args),
                activated: true,
            });
        }

        if let Some(secondary) = &profile.secondary {
            steps.push(PlannedStep {
                name: unique_name(&steps, &format!("resolve-{}", secondary.name)),
                kind: StepKind::ResolveSecondary,
                policy: FailurePolicy::Fatal,
                invocation: Invocation::new(python.clone()).args(["-c", secondary.query.as_str()]),
                activated: true,
            });

            let args = secondary
                .args
                .iter()
                .map(|a| resolve_string(a, ctx))
                .collect::<Result<Vec<_>>>()?;
            steps.push(PlannedStep {
                name: unique_name(&steps, &format!("{}-version", secondary.name)),
                kind: StepKind::SecondaryVersion,
                policy: secondary.failure_policy,
                invocation: Invocation::new(format!("<{}>", secondary.name)).args(args),
                activated: true,
            });
        }

        debug!(profile = %profile.name, steps = steps.len(), "Built provisioning plan");

        Ok(Self {
            profile: profile.name.clone(),
            fingerprint: descriptor.fingerprint(),
            steps,
            base,
            environment,
        })
    }

    /// Human-readable listing, one line per step.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Profile: {} ({})",
            self.profile,
            &self.fingerprint[..self.fingerprint.len().min(12)]
        );
        for (i, step) in self.steps.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:>3}. {:<20} {:<12} {}",
                i + 1,
                step.name,
                step.policy.to_string(),
                step.display_command()
            );
        }
        out
    }

    /// JSON listing.
    pub fn to_json(&self) -> Result<String> {
        let steps: Vec<StepView<'_>> = self
            .steps
            .iter()
            .map(|s| StepView {
                name: &s.name,
                kind: s.kind,
                policy: s.policy,
                command: s.display_command(),
                activated: s.activated,
            })
            .collect();
        let value = serde_json::json!({
            "profile": self.profile,
            "fingerprint": self.fingerprint,
            "steps": steps,
        });
        serde_json::to_string_pretty(&value).map_err(|e| anyhow::Error::from(e).into())
    }
}

fn pip_install(python: &str, verbose: bool) -> Invocation {
    let invocation = Invocation::new(python).args(["-m", "pip", "install"]);
    if verbose {
        invocation.arg("-v")
    } else {
        invocation
    }
}

fn install_invocation(python: &str, descriptor: &EnvironmentDescriptor) -> Invocation {
    let mut invocation = pip_install(python, descriptor.verbose_install);
    if descriptor.upgrade_package {
        invocation = invocation.arg("-U");
    }
    if let Some(url) = &descriptor.index_url {
        invocation = invocation.args(["--index-url", url.as_str()]);
    }
    if let Some(url) = &descriptor.extra_index_url {
        invocation = invocation.args(["--extra-index-url", url.as_str()]);
    }
    invocation.arg(descriptor.package.install_target())
}

fn unique_name(steps: &[PlannedStep], name: &str) -> String {
    if !steps.iter().any(|s| s.name == name) {
        return name.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", name, n))
        .find(|candidate| !steps.iter().any(|s| &s.name == candidate))
        .unwrap_or_else(|| name.to_string())
}
