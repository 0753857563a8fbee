//! The process-execution seam.
//!
//! The verifier only talks to a [`CommandRunner`]. [`ProcessRunner`] spawns
//! real processes; [`ScriptedRunner`] returns canned results and records
//! every invocation, so failure paths can be tested without Python or a
//! network.

use crate::error::{ProvisorError, Result};
use crate::shell::{
    execute, execute_streaming, CommandOptions, CommandResult, Invocation, OutputLine,
};
use std::cell::RefCell;
use std::io;
use std::time::Duration;

/// Runs one command to completion.
pub trait CommandRunner {
    /// Run `invocation` and wait for it.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisorError::SpawnFailed`] if the program could not be
    /// started. A non-zero exit is an `Ok` result.
    fn run(&self, invocation: &Invocation, options: &CommandOptions) -> Result<CommandResult>;
}

/// Spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    stream: bool,
}

impl ProcessRunner {
    /// Capture output silently.
    pub fn captured() -> Self {
        Self { stream: false }
    }

    /// Echo output lines as they arrive, while still capturing them.
    pub fn streaming() -> Self {
        Self { stream: true }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation, options: &CommandOptions) -> Result<CommandResult> {
        if self.stream {
            execute_streaming(
                invocation,
                options,
                Box::new(|line| match line {
                    OutputLine::Stdout(text) => println!("    {}", text),
                    OutputLine::Stderr(text) => eprintln!("    {}", text),
                }),
            )
        } else {
            execute(invocation, options)
        }
    }
}

/// Scripted outcome for a matching invocation.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// The process ran; `None` means it was killed by a signal.
    Exit { code: Option<i32>, stdout: String },

    /// The process could not be spawned.
    SpawnError(io::ErrorKind),
}

impl ScriptedOutcome {
    fn into_result(self, invocation: &Invocation) -> Result<CommandResult> {
        match self {
            ScriptedOutcome::Exit {
                code: Some(0),
                stdout,
            } => Ok(CommandResult::success(stdout, String::new(), Duration::ZERO)),
            ScriptedOutcome::Exit { code, stdout } => Ok(CommandResult::failure(
                code,
                stdout,
                String::new(),
                Duration::ZERO,
            )),
            ScriptedOutcome::SpawnError(kind) => Err(ProvisorError::SpawnFailed {
                command: invocation.to_string(),
                source: io::Error::new(kind, "scripted spawn failure"),
            }),
        }
    }
}

/// Test double that returns scripted results.
///
/// Rules match when the rendered command line contains their pattern; the
/// first matching rule wins. Unmatched commands succeed with no output.
///
/// # Example
///
/// ```
/// use provisor::provision::{CommandRunner, ScriptedRunner};
/// use provisor::shell::{CommandOptions, Invocation};
///
/// let runner = ScriptedRunner::new().fail_on("pip install", 23);
/// let result = runner
///     .run(&Invocation::new("python").args(["-m", "pip", "install", "x"]), &CommandOptions::default())
///     .unwrap();
/// assert_eq!(result.exit_code, Some(23));
/// assert_eq!(runner.invocations().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, ScriptedOutcome)>,
    calls: RefCell<Vec<(Invocation, CommandOptions)>>,
}

impl ScriptedRunner {
    /// A runner where every command succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `outcome` for commands containing `pattern`.
    pub fn on(mut self, pattern: &str, outcome: ScriptedOutcome) -> Self {
        self.rules.push((pattern.to_string(), outcome));
        self
    }

    /// Commands containing `pattern` exit with `code`.
    pub fn fail_on(self, pattern: &str, code: i32) -> Self {
        self.on(
            pattern,
            ScriptedOutcome::Exit {
                code: Some(code),
                stdout: String::new(),
            },
        )
    }

    /// Commands containing `pattern` succeed and print `stdout`.
    pub fn output_on(self, pattern: &str, stdout: &str) -> Self {
        self.on(
            pattern,
            ScriptedOutcome::Exit {
                code: Some(0),
                stdout: stdout.to_string(),
            },
        )
    }

    /// Commands containing `pattern` are killed by a signal.
    pub fn signal_on(self, pattern: &str) -> Self {
        self.on(
            pattern,
            ScriptedOutcome::Exit {
                code: None,
                stdout: String::new(),
            },
        )
    }

    /// Commands containing `pattern` cannot be spawned.
    pub fn spawn_error_on(self, pattern: &str, kind: io::ErrorKind) -> Self {
        self.on(pattern, ScriptedOutcome::SpawnError(kind))
    }

    /// Every invocation so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.borrow().iter().map(|(i, _)| i.clone()).collect()
    }

    /// Rendered command lines so far, in order.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(i, _)| i.to_string()).collect()
    }

    /// Options passed with each invocation.
    pub fn options(&self) -> Vec<CommandOptions> {
        self.calls.borrow().iter().map(|(_, o)| o.clone()).collect()
    }

    /// Whether any invocation's command line contains `pattern`.
    pub fn was_run(&self, pattern: &str) -> bool {
        self.command_lines().iter().any(|c| c.contains(pattern))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation, options: &CommandOptions) -> Result<CommandResult> {
        self.calls
            .borrow_mut()
            .push((invocation.clone(), options.clone()));

        let line = invocation.to_string();
        let outcome = self
            .rules
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or(ScriptedOutcome::Exit {
                code: Some(0),
                stdout: String::new(),
            });
        outcome.into_result(invocation)
    }
}
