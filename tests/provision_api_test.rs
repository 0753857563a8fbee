//! Integration tests for the provision module public API.
#![cfg(unix)]

use provisor::provision::{
    provision_and_verify, EnvironmentDescriptor, FailurePolicy, PackageSpec, Profile,
    ScriptedRunner, SecondaryExecutable, StepStatus, VerificationProbe, VerifyOptions,
};
use provisor::ui::{MockUI, OutputMode};

fn ci_profile() -> Profile {
    let mut package = PackageSpec::parse(".[default]").unwrap();
    package.add_extra("X");
    let descriptor = EnvironmentDescriptor::new("python3", package).with_venv("/tmp/env1");
    Profile::new("ci", descriptor)
        .with_probe(VerificationProbe::best_effort("yt-dlp", ["-v"]))
        .with_probe(VerificationProbe::best_effort("yt-dlp", ["--version"]))
}

fn quiet_ui() -> MockUI {
    MockUI::with_mode(OutputMode::Quiet)
}

#[test]
fn failing_best_effort_probes_keep_exit_zero() {
    let runner = ScriptedRunner::new().fail_on("yt-dlp", 2);
    let mut ui = quiet_ui();

    let report =
        provision_and_verify(&ci_profile(), &runner, &mut ui, &VerifyOptions::default()).unwrap();

    assert_eq!(report.exit_code(), 0);
    assert!(report.success());
    assert_eq!(report.count(StepStatus::Ignored), 2);
    assert_eq!(report.step("yt-dlp-2").unwrap().exit_code, Some(2));
    assert_eq!(ui.reports().len(), 0);
}

#[test]
fn extras_are_installed_in_one_invocation() {
    let runner = ScriptedRunner::new();
    let mut ui = quiet_ui();

    provision_and_verify(&ci_profile(), &runner, &mut ui, &VerifyOptions::default()).unwrap();

    let installs: Vec<String> = runner
        .command_lines()
        .into_iter()
        .filter(|line| line.contains("pip install") && !line.ends_with(" pip"))
        .collect();
    assert_eq!(installs, vec!["/tmp/env1/bin/python -m pip install -v -U .[default,X]"]);
}

#[test]
fn steps_run_in_order() {
    let runner = ScriptedRunner::new();
    let mut ui = quiet_ui();

    provision_and_verify(&ci_profile(), &runner, &mut ui, &VerifyOptions::default()).unwrap();

    assert_eq!(
        runner.command_lines(),
        vec![
            "python3 -m venv /tmp/env1",
            "/tmp/env1/bin/python -m pip install -v -U pip",
            "/tmp/env1/bin/python -m pip install -v -U .[default,X]",
            "yt-dlp -v",
            "yt-dlp --version",
        ]
    );
}

#[test]
fn install_failure_halts_and_passes_code_through() {
    let runner = ScriptedRunner::new().fail_on(".[default,X]", 42);
    let mut ui = quiet_ui();

    let report =
        provision_and_verify(&ci_profile(), &runner, &mut ui, &VerifyOptions::default()).unwrap();

    assert_eq!(report.exit_code(), 42);
    assert!(!runner.was_run("yt-dlp"));
    assert_eq!(report.step("yt-dlp").unwrap().status, StepStatus::NotRun);
    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.step, "install");
}

#[test]
fn venv_creation_is_not_activated_but_later_steps_are() {
    let runner = ScriptedRunner::new();
    let mut ui = quiet_ui();

    provision_and_verify(&ci_profile(), &runner, &mut ui, &VerifyOptions::default()).unwrap();

    let options = runner.options();
    assert!(!options[0].env.contains_key("VIRTUAL_ENV"));
    assert_eq!(
        options[3].env.get("VIRTUAL_ENV").map(String::as_str),
        Some("/tmp/env1")
    );
}

#[test]
fn fatal_probe_stops_the_run() {
    let profile = ci_profile().with_probe(VerificationProbe::fatal("tool", ["check"]).named("check"));
    let runner = ScriptedRunner::new().fail_on("tool check", 5);
    let mut ui = quiet_ui();

    let report = provision_and_verify(&profile, &runner, &mut ui, &VerifyOptions::default()).unwrap();

    assert_eq!(report.exit_code(), 5);
    assert_eq!(report.step("check").unwrap().policy, FailurePolicy::Fatal);
}

#[test]
fn strict_promotes_best_effort_probes() {
    let runner = ScriptedRunner::new().fail_on("yt-dlp -v", 3);
    let mut ui = quiet_ui();
    let options = VerifyOptions {
        strict: true,
        ..Default::default()
    };

    let report = provision_and_verify(&ci_profile(), &runner, &mut ui, &options).unwrap();

    assert_eq!(report.exit_code(), 3);
    assert!(!runner.was_run("yt-dlp --version"));
}

#[test]
fn signal_termination_maps_to_one() {
    let runner = ScriptedRunner::new().signal_on("pip install -v -U pip");
    let mut ui = quiet_ui();

    let report =
        provision_and_verify(&ci_profile(), &runner, &mut ui, &VerifyOptions::default()).unwrap();

    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.failure.as_ref().unwrap().step, "upgrade-installer");
}

#[test]
fn missing_interpreter_maps_to_127() {
    let runner = ScriptedRunner::new().spawn_error_on("-m venv", std::io::ErrorKind::NotFound);
    let mut ui = quiet_ui();

    let report =
        provision_and_verify(&ci_profile(), &runner, &mut ui, &VerifyOptions::default()).unwrap();

    assert_eq!(report.exit_code(), 127);
    assert_eq!(report.count(StepStatus::NotRun), 4);
}

#[test]
fn empty_resolution_fails_the_secondary_check() {
    let profile = ci_profile().with_secondary(SecondaryExecutable::new(
        "deno",
        "import deno; print(deno.find_deno_bin())",
    ));
    let runner = ScriptedRunner::new().output_on("import deno", "\n");
    let mut ui = quiet_ui();

    let report = provision_and_verify(&profile, &runner, &mut ui, &VerifyOptions::default()).unwrap();

    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.failure.as_ref().unwrap().step, "resolve-deno");
    assert_eq!(report.step("deno-version").unwrap().status, StepStatus::NotRun);
}

#[test]
fn identical_profiles_share_a_fingerprint() {
    let a = ci_profile().descriptor.fingerprint();
    let b = ci_profile().descriptor.fingerprint();
    let mut changed = ci_profile().descriptor;
    changed.clear_venv = true;

    assert_eq!(a, b);
    assert_ne!(a, changed.fingerprint());
}
