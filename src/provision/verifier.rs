//! The provisioning verifier.
//!
//! Runs a [`ProvisionPlan`] step by step. Fatal steps stop the run at the
//! first failure and hand their exit code to the report; best-effort steps
//! are recorded as ignored and the run goes on.

use crate::error::{ProvisorError, Result};
use crate::provision::descriptor::Profile;
use crate::provision::plan::{PlannedStep, ProvisionPlan, StepKind};
use crate::provision::probe::FailurePolicy;
use crate::provision::report::{extract_version, FatalFailure, ProvisionReport, StepRecord, StepStatus};
use crate::provision::runner::CommandRunner;
use crate::provision::secondary::{ensure_executable, resolve_path};
use crate::shell::{CommandResult, Invocation};
use crate::ui::UserInterface;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Options for a run.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Treat every best-effort step as fatal.
    pub strict: bool,

    /// Working directory for every step.
    pub cwd: Option<PathBuf>,
}

/// Provision `profile` and verify the result.
///
/// A failing fatal step is not an `Err`: it ends the run and is recorded in
/// the returned report, whose [`ProvisionReport::exit_code`] is that step's
/// exit code.
///
/// # Errors
///
/// Fails before running anything if the plan cannot be built.
pub fn provision_and_verify(
    profile: &Profile,
    runner: &dyn CommandRunner,
    ui: &mut dyn UserInterface,
    options: &VerifyOptions,
) -> Result<ProvisionReport> {
    let ctx = ProvisionPlan::context(profile);
    let plan = ProvisionPlan::build(profile, &ctx)?;
    Ok(execute_plan(&plan, runner, ui, options))
}

/// Run an already built plan.
pub fn execute_plan(
    plan: &ProvisionPlan,
    runner: &dyn CommandRunner,
    ui: &mut dyn UserInterface,
    options: &VerifyOptions,
) -> ProvisionReport {
    let mut report = ProvisionReport::start(&plan.profile, &plan.fingerprint);
    let streamed = ui.output_mode().shows_command_output();

    info!(profile = %plan.profile, steps = plan.steps.len(), strict = options.strict, "Starting provisioning run");

    for step in &plan.steps {
        let policy = step.policy.promoted(options.strict);

        if report.failure.is_some() {
            report.steps.push(StepRecord::not_run(step, policy));
            continue;
        }

        let invocation = match prepare(step, &report) {
            Ok(invocation) => invocation,
            Err(message) => {
                ui.error(&format!("{}: {}", step.name, message));
                warn!(step = %step.name, %message, "Could not prepare step");
                let mut record = StepRecord::not_run(step, policy);
                record.status = StepStatus::Failed;
                record.exit_code = Some(1);
                report.steps.push(record);
                report.failure = Some(FatalFailure {
                    step: step.name.clone(),
                    exit_code: 1,
                    message: Some(message),
                });
                continue;
            }
        };

        let env = if step.activated {
            &plan.environment
        } else {
            &plan.base
        };
        let capture = !streamed || step.kind == StepKind::ResolveSecondary;
        let command_options = env.command_options(options.cwd.as_deref(), capture);
        debug!(step = %step.name, command = %invocation, env = ?env.env(), "Running step");

        let mut spinner = ui.start_spinner(&format!("{} · {}", step.name, invocation));
        let started = Instant::now();
        let outcome = runner.run(&invocation, &command_options);
        let elapsed = started.elapsed();

        let (exit_code, result, spawn_error) = match outcome {
            Ok(result) => (result.exit_code, Some(result), None),
            Err(err) => {
                let code = err.exit_code();
                (Some(code), None, Some(err))
            }
        };
        let succeeded = result.as_ref().is_some_and(|r| r.success);

        let mut record = StepRecord::ran(
            step,
            policy,
            invocation.to_string(),
            StepStatus::Completed,
            exit_code,
            result.as_ref().map_or(elapsed, |r| r.duration.max(elapsed)),
        );

        if succeeded {
            if matches!(step.kind, StepKind::Probe | StepKind::SecondaryVersion) {
                let output = result.as_ref().map(CommandResult::combined_output);
                record.version = output.as_deref().and_then(extract_version);
            }

            if step.kind == StepKind::ResolveSecondary {
                let stdout = result.as_ref().map_or("", |r| r.stdout.as_str());
                match resolve_path(stdout) {
                    Some(path) => {
                        info!(path = %path.display(), "Resolved secondary executable");
                        report.resolved_executable = Some(path);
                    }
                    None => {
                        spinner.finish_error(&format!("{} printed no path", step.name));
                        record.status = StepStatus::Failed;
                        record.exit_code = Some(1);
                        report.steps.push(record);
                        report.failure = Some(FatalFailure {
                            step: step.name.clone(),
                            exit_code: 1,
                            message: Some(
                                ProvisorError::ResolutionFailed {
                                    name: step.name.clone(),
                                    message: "query printed nothing".to_string(),
                                }
                                .to_string(),
                            ),
                        });
                        continue;
                    }
                }
            }

            let label = match &record.version {
                Some(version) => format!("{} ({})", step.name, version),
                None => step.name.clone(),
            };
            spinner.finish_success(&label);
            info!(step = %step.name, duration_ms = record.duration_ms, "Step completed");
            report.steps.push(record);
            continue;
        }

        let code = failure_code(exit_code);
        let detail = spawn_error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| describe_exit(exit_code));

        if policy == FailurePolicy::BestEffort {
            spinner.finish_warning(&format!("{} {} (ignored)", step.name, detail));
            warn!(step = %step.name, exit_code = code, "Best-effort step failed; continuing");
            record.status = StepStatus::Ignored;
            report.steps.push(record);
            continue;
        }

        spinner.finish_error(&format!("{} {}", step.name, detail));
        warn!(step = %step.name, exit_code = code, "Fatal step failed; stopping");
        if let Some(result) = &result {
            ui.show_error_block(&invocation.to_string(), &result.combined_output(), hint_for(step));
        }
        record.status = StepStatus::Failed;
        report.steps.push(record);
        report.failure = Some(FatalFailure {
            step: step.name.clone(),
            exit_code: code,
            message: spawn_error.map(|e| e.to_string()),
        });
    }

    report.finish();
    info!(
        profile = %report.profile,
        exit_code = report.exit_code(),
        "Provisioning run finished"
    );
    report
}

/// Final invocation for a step, filling in the resolved secondary path.
fn prepare(step: &PlannedStep, report: &ProvisionReport) -> std::result::Result<Invocation, String> {
    if step.kind != StepKind::SecondaryVersion {
        return Ok(step.invocation.clone());
    }
    let path = report
        .resolved_executable
        .as_ref()
        .ok_or_else(|| "secondary executable was not resolved".to_string())?;
    ensure_executable(path)
        .map_err(|e| format!("cannot make {} executable: {}", path.display(), e))?;
    Ok(step.with_program(&path.display().to_string()))
}

/// Exit code a failed step hands to the run. Signals map to 1.
fn failure_code(exit_code: Option<i32>) -> i32 {
    match exit_code {
        Some(0) | None => 1,
        Some(code) => code,
    }
}

fn describe_exit(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

fn hint_for(step: &PlannedStep) -> Option<&'static str> {
    match step.kind {
        StepKind::CreateVenv => Some("Check that the interpreter exists and ships the venv module"),
        StepKind::Install => Some("Check the package spec and any --index-url"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::descriptor::EnvironmentDescriptor;
    use crate::provision::package::PackageSpec;
    use crate::provision::probe::{SecondaryExecutable, VerificationProbe};
    use crate::provision::runner::ScriptedRunner;
    use crate::ui::{MockUI, SpinnerStatus};
    use std::io;

    fn profile() -> Profile {
        let descriptor = EnvironmentDescriptor::new(
            "python3",
            PackageSpec::parse(".[default,X]").unwrap(),
        )
        .with_venv("/tmp/env1");
        Profile::new("ci", descriptor)
            .with_probe(VerificationProbe::best_effort("yt-dlp", ["-v"]))
            .with_probe(VerificationProbe::best_effort("yt-dlp-ejs", ["--version"]))
    }

    fn run(profile: &Profile, runner: &ScriptedRunner, strict: bool) -> (ProvisionReport, MockUI) {
        let mut ui = MockUI::new();
        let options = VerifyOptions {
            strict,
            cwd: None,
        };
        let report = provision_and_verify(profile, runner, &mut ui, &options).unwrap();
        (report, ui)
    }

    #[test]
    fn all_steps_succeed() {
        let runner = ScriptedRunner::new();
        let (report, _) = run(&profile(), &runner, false);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.count(StepStatus::Completed), 5);
        assert_eq!(runner.invocations().len(), 5);
    }

    #[test]
    fn failing_best_effort_probes_keep_exit_zero() {
        let runner = ScriptedRunner::new()
            .fail_on("yt-dlp -v", 2)
            .fail_on("yt-dlp-ejs", 1);
        let (report, ui) = run(&profile(), &runner, false);

        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.count(StepStatus::Ignored), 2);
        assert_eq!(report.step("yt-dlp").unwrap().exit_code, Some(2));
        let warnings = ui
            .spinner_results()
            .iter()
            .filter(|(_, s)| *s == SpinnerStatus::Warning)
            .count();
        assert_eq!(warnings, 2);
    }

    #[test]
    fn install_failure_stops_before_probes() {
        let runner = ScriptedRunner::new().fail_on("install -v -U .[default,X]", 23);
        let (report, ui) = run(&profile(), &runner, false);

        assert_eq!(report.exit_code(), 23);
        assert!(!runner.was_run("yt-dlp"));
        assert_eq!(report.step("install").unwrap().status, StepStatus::Failed);
        assert_eq!(report.step("yt-dlp").unwrap().status, StepStatus::NotRun);
        assert_eq!(report.count(StepStatus::NotRun), 2);
        assert_eq!(ui.error_blocks().len(), 1);
    }

    #[test]
    fn venv_failure_stops_everything() {
        let runner = ScriptedRunner::new().fail_on("-m venv", 1);
        let (report, _) = run(&profile(), &runner, false);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(runner.invocations().len(), 1);
    }

    #[test]
    fn strict_makes_probe_failures_fatal() {
        let runner = ScriptedRunner::new().fail_on("yt-dlp -v", 2);
        let (report, _) = run(&profile(), &runner, true);

        assert_eq!(report.exit_code(), 2);
        assert!(!runner.was_run("yt-dlp-ejs"));
        assert!(report.step("yt-dlp").unwrap().policy.is_fatal());
    }

    #[test]
    fn fatal_probe_stops_run() {
        let profile = profile().with_probe(VerificationProbe::fatal("must-pass", ["-v"]));
        let runner = ScriptedRunner::new().fail_on("must-pass", 4);
        let (report, _) = run(&profile, &runner, false);
        assert_eq!(report.exit_code(), 4);
    }

    #[test]
    fn signal_maps_to_one() {
        let runner = ScriptedRunner::new().signal_on("install -v -U");
        let (report, _) = run(&profile(), &runner, false);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn missing_program_maps_to_127() {
        let runner = ScriptedRunner::new().spawn_error_on("-m venv", io::ErrorKind::NotFound);
        let (report, _) = run(&profile(), &runner, false);
        assert_eq!(report.exit_code(), 127);
        assert!(report.failure.unwrap().message.is_some());
    }

    #[test]
    fn missing_probe_program_is_ignored() {
        let runner = ScriptedRunner::new().spawn_error_on("yt-dlp -v", io::ErrorKind::NotFound);
        let (report, _) = run(&profile(), &runner, false);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.step("yt-dlp").unwrap().exit_code, Some(127));
    }

    #[test]
    fn extras_go_into_a_single_install() {
        let runner = ScriptedRunner::new();
        run(&profile(), &runner, false);
        let installs: Vec<_> = runner
            .command_lines()
            .into_iter()
            .filter(|c| c.contains(".[default"))
            .collect();
        assert_eq!(installs, vec!["/tmp/env1/bin/python -m pip install -v -U .[default,X]"]);
    }

    #[test]
    fn activated_steps_get_venv_overlay() {
        let runner = ScriptedRunner::new();
        run(&profile(), &runner, false);
        let options = runner.options();
        assert!(!options[0].env.contains_key("VIRTUAL_ENV"));
        assert_eq!(options[1].env["VIRTUAL_ENV"], "/tmp/env1");
        assert!(options[1].env_remove.contains(&"PYTHONHOME".to_string()));
    }

    #[test]
    fn versions_are_extracted_from_probe_output() {
        let runner = ScriptedRunner::new().output_on("yt-dlp -v", "[debug] yt-dlp version 2025.01.15\n");
        let (report, _) = run(&profile(), &runner, false);
        assert_eq!(
            report.step("yt-dlp").unwrap().version.as_deref(),
            Some("2025.01.15")
        );
    }

    #[cfg(unix)]
    #[test]
    fn secondary_is_resolved_chmodded_and_checked() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let deno = temp.path().join("deno");
        std::fs::write(&deno, "").unwrap();
        std::fs::set_permissions(&deno, std::fs::Permissions::from_mode(0o644)).unwrap();

        let profile = profile().with_secondary(SecondaryExecutable::new(
            "deno",
            "import deno; print(deno.find_deno_bin())",
        ));
        let runner = ScriptedRunner::new()
            .output_on("-c", &format!("noise\n{}\n", deno.display()))
            .output_on("--version", "deno 2.1.4\n");

        let (report, _) = run(&profile, &runner, false);

        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.resolved_executable.as_deref(), Some(deno.as_path()));
        let mode = std::fs::metadata(&deno).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
        assert_eq!(report.step("deno-version").unwrap().version.as_deref(), Some("2.1.4"));
        assert!(runner.was_run(&format!("{} --version", deno.display())));
    }

    #[cfg(unix)]
    fn deno_fixture() -> (tempfile::TempDir, std::path::PathBuf) {
        let temp = tempfile::TempDir::new().unwrap();
        let deno = temp.path().join("deno");
        std::fs::write(&deno, "").unwrap();
        (temp, deno)
    }

    #[cfg(unix)]
    #[test]
    fn failing_version_check_is_fatal_by_default() {
        let (_temp, deno) = deno_fixture();
        let profile = profile().with_secondary(SecondaryExecutable::new("deno", "q"));
        let runner = ScriptedRunner::new()
            .output_on(" -c q", &format!("{}\n", deno.display()))
            .fail_on(&format!("{} --version", deno.display()), 9);

        let (report, _) = run(&profile, &runner, false);

        assert_eq!(report.exit_code(), 9);
        let step = report.step("deno-version").unwrap();
        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(step.exit_code, Some(9));
        assert_eq!(report.failure.as_ref().unwrap().step, "deno-version");
    }

    #[cfg(unix)]
    #[test]
    fn best_effort_version_check_is_ignored() {
        let (_temp, deno) = deno_fixture();
        let mut secondary = SecondaryExecutable::new("deno", "q");
        secondary.failure_policy = FailurePolicy::BestEffort;
        let profile = profile().with_secondary(secondary);
        let runner = ScriptedRunner::new()
            .output_on(" -c q", &format!("{}\n", deno.display()))
            .fail_on(&format!("{} --version", deno.display()), 9);

        let (report, _) = run(&profile, &runner, false);

        assert_eq!(report.exit_code(), 0);
        assert!(report.success());
        let step = report.step("deno-version").unwrap();
        assert_eq!(step.status, StepStatus::Ignored);
        assert_eq!(step.exit_code, Some(9));
    }

    #[test]
    fn empty_resolution_output_is_fatal() {
        let profile = profile().with_secondary(SecondaryExecutable::new("deno", "print()"));
        let runner = ScriptedRunner::new();
        let (report, _) = run(&profile, &runner, false);

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.step("resolve-deno").unwrap().status, StepStatus::Failed);
        assert_eq!(report.step("deno-version").unwrap().status, StepStatus::NotRun);
    }

    #[test]
    fn failed_resolution_passes_code_through() {
        let profile = profile().with_secondary(SecondaryExecutable::new("deno", "import deno"));
        let runner = ScriptedRunner::new().fail_on("import deno", 5);
        let (report, _) = run(&profile, &runner, false);
        assert_eq!(report.exit_code(), 5);
    }

    #[test]
    fn unexecutable_path_is_fatal() {
        let profile = profile().with_secondary(SecondaryExecutable::new("deno", "q"));
        let runner = ScriptedRunner::new().output_on(" -c q", "/nonexistent/provisor/deno\n");
        let (report, ui) = run(&profile, &runner, false);

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.step("deno-version").unwrap().status, StepStatus::Failed);
        assert!(ui.has_error("deno-version"));
    }
}
