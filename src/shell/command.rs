//! Process execution.
//!
//! Commands are spawned directly from a program and an argument vector, never
//! through an intermediate shell, so arguments such as `.[default,X]` reach
//! the child unmodified.

use crate::error::{ProvisorError, Result};
use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// A program plus its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path.
    pub program: String,

    /// Arguments, passed verbatim.
    pub args: Vec<String>,
}

impl Invocation {
    /// Create an invocation with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The arguments, quoted and joined with spaces.
    pub fn quoted_args(&self) -> String {
        self.args
            .iter()
            .map(|a| quote(a))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        if !self.args.is_empty() {
            write!(f, " {}", self.quoted_args())?;
        }
        Ok(())
    }
}

/// Quote a word for display the way a POSIX shell would need it.
fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(
                    c,
                    '-' | '_' | '.' | '/' | ',' | '=' | ':' | '+' | '@' | '[' | ']'
                )
        });
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
        }
    }

    /// Combined stdout and stderr.
    pub fn combined_output(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Environment variables removed from the child.
    pub env_remove: Vec<String>,

    /// Capture stdout (if false, inherits from parent).
    pub capture_stdout: bool,

    /// Capture stderr (if false, inherits from parent).
    pub capture_stderr: bool,
}

/// Output line from command execution.
#[derive(Debug, Clone)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Callback for streaming output.
pub type OutputCallback = Box<dyn Fn(OutputLine) + Send>;

fn build_command(invocation: &Invocation, options: &CommandOptions) -> Command {
    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for key in &options.env_remove {
        cmd.env_remove(key);
    }

    // A PATH set here is also used to look up `program` on unix.
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd
}

fn spawn_error(invocation: &Invocation, source: std::io::Error) -> ProvisorError {
    ProvisorError::SpawnFailed {
        command: invocation.to_string(),
        source,
    }
}

/// Execute a command and wait for it.
pub fn execute(invocation: &Invocation, options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();
    let mut cmd = build_command(invocation, options);

    cmd.stdin(Stdio::null());

    if options.capture_stdout {
        cmd.stdout(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit());
    }

    if options.capture_stderr {
        cmd.stderr(Stdio::piped());
    } else {
        cmd.stderr(Stdio::inherit());
    }

    tracing::debug!("Executing: {}", invocation);

    let output = cmd.output().map_err(|e| spawn_error(invocation, e))?;

    let duration = start.elapsed();

    let stdout = if options.capture_stdout {
        String::from_utf8_lossy(&output.stdout).to_string()
    } else {
        String::new()
    };

    let stderr = if options.capture_stderr {
        String::from_utf8_lossy(&output.stderr).to_string()
    } else {
        String::new()
    };

    if output.status.success() {
        Ok(CommandResult::success(stdout, stderr, duration))
    } else {
        Ok(CommandResult::failure(
            output.status.code(),
            stdout,
            stderr,
            duration,
        ))
    }
}

fn drain<R, F>(source: R, tx: mpsc::Sender<OutputLine>, wrap: F) -> thread::JoinHandle<String>
where
    R: Read + Send + 'static,
    F: Fn(String) -> OutputLine + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut output = String::new();
        let mut buf = Vec::new();
        // Keep draining past undecodable bytes; the child writes until EOF.
        while matches!(reader.read_until(b'\n', &mut buf), Ok(n) if n > 0) {
            let line = String::from_utf8_lossy(&buf)
                .trim_end_matches(['\n', '\r'])
                .to_string();
            output.push_str(&line);
            output.push('\n');
            let _ = tx.send(wrap(line));
            buf.clear();
        }
        output
    })
}

/// Execute a command, forwarding each output line to `callback` while
/// also collecting stdout and stderr.
pub fn execute_streaming(
    invocation: &Invocation,
    options: &CommandOptions,
    callback: OutputCallback,
) -> Result<CommandResult> {
    let start = Instant::now();
    let mut cmd = build_command(invocation, options);

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    tracing::debug!("Executing (streaming): {}", invocation);

    let mut child = cmd.spawn().map_err(|e| spawn_error(invocation, e))?;

    let stdout = child.stdout.take().ok_or_else(|| {
        spawn_error(
            invocation,
            std::io::Error::other("stdout pipe was not created"),
        )
    })?;
    let stderr = child.stderr.take().ok_or_else(|| {
        spawn_error(
            invocation,
            std::io::Error::other("stderr pipe was not created"),
        )
    })?;

    let (tx, rx) = mpsc::channel();
    let stdout_handle = drain(stdout, tx.clone(), OutputLine::Stdout);
    let stderr_handle = drain(stderr, tx, OutputLine::Stderr);

    for line in rx {
        callback(line);
    }

    let stdout_output = stdout_handle.join().unwrap_or_default();
    let stderr_output = stderr_handle.join().unwrap_or_default();

    let status = child.wait()?;

    let duration = start.elapsed();

    if status.success() {
        Ok(CommandResult::success(
            stdout_output,
            stderr_output,
            duration,
        ))
    } else {
        Ok(CommandResult::failure(
            status.code(),
            stdout_output,
            stderr_output,
            duration,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured() -> CommandOptions {
        CommandOptions {
            capture_stdout: true,
            capture_stderr: true,
            ..Default::default()
        }
    }

    #[test]
    fn invocation_display_leaves_plain_words_alone() {
        let inv = Invocation::new("python3").args(["-m", "pip", "install", ".[default,X]"]);
        assert_eq!(inv.to_string(), "python3 -m pip install .[default,X]");
    }

    #[test]
    fn invocation_display_quotes_spaces_and_quotes() {
        let inv = Invocation::new("python").arg("-c").arg("print('hi')");
        assert_eq!(inv.to_string(), r"python -c 'print('\''hi'\'')'");
    }

    #[test]
    fn invocation_display_quotes_empty_argument() {
        let inv = Invocation::new("tool").arg("");
        assert_eq!(inv.to_string(), "tool ''");
    }

    #[test]
    fn combined_output_joins_streams() {
        let result = CommandResult::success("out".into(), "err\n".into(), Duration::ZERO);
        assert_eq!(result.combined_output(), "out\nerr\n");
    }

    #[cfg(unix)]
    #[test]
    fn execute_successful_command() {
        let inv = Invocation::new("echo").arg("hello");
        let result = execute(&inv, &captured()).unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[cfg(unix)]
    #[test]
    fn execute_failing_command_reports_code() {
        let inv = Invocation::new("sh").args(["-c", "exit 3"]);
        let result = execute(&inv, &captured()).unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn execute_passes_arguments_verbatim() {
        let inv = Invocation::new("printf").args(["%s", "$HOME [a,b]"]);
        let result = execute(&inv, &captured()).unwrap();
        assert_eq!(result.stdout, "$HOME [a,b]");
    }

    #[cfg(unix)]
    #[test]
    fn execute_with_env() {
        let mut options = captured();
        options
            .env
            .insert("MY_VAR".to_string(), "my_value".to_string());

        let inv = Invocation::new("sh").args(["-c", "echo $MY_VAR"]);
        let result = execute(&inv, &options).unwrap();

        assert!(result.success);
        assert!(result.stdout.contains("my_value"));
    }

    #[cfg(unix)]
    #[test]
    fn execute_with_env_remove() {
        let mut options = captured();
        options
            .env
            .insert("DROPPED_VAR".to_string(), "present".to_string());
        let inv = Invocation::new("sh").args(["-c", "echo ${DROPPED_VAR:-absent}"]);
        assert!(execute(&inv, &options).unwrap().stdout.contains("present"));

        let mut options = captured();
        options.env_remove.push("HOME".to_string());
        let inv = Invocation::new("sh").args(["-c", "echo ${HOME:-absent}"]);
        assert!(execute(&inv, &options).unwrap().stdout.contains("absent"));
    }

    #[cfg(unix)]
    #[test]
    fn execute_with_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let options = CommandOptions {
            cwd: Some(temp.path().to_path_buf()),
            ..captured()
        };

        let result = execute(&Invocation::new("pwd"), &options).unwrap();

        assert!(result.success);
        let name = temp.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(result.stdout.contains(&name));
    }

    #[test]
    fn execute_missing_program_is_spawn_failure() {
        let inv = Invocation::new("provisor-test-definitely-missing-binary");
        let err = execute(&inv, &captured()).unwrap_err();
        assert!(matches!(err, ProvisorError::SpawnFailed { .. }));
        assert_eq!(err.exit_code(), 127);
    }

    #[cfg(unix)]
    #[test]
    fn execute_streaming_captures_output() {
        use std::sync::{Arc, Mutex};

        let lines = Arc::new(Mutex::new(Vec::new()));
        let lines_clone = Arc::clone(&lines);

        let callback: OutputCallback = Box::new(move |line| {
            lines_clone.lock().unwrap().push(line);
        });

        let inv = Invocation::new("sh").args(["-c", "echo line1; echo line2; echo oops >&2"]);
        let result = execute_streaming(&inv, &CommandOptions::default(), callback).unwrap();

        assert!(result.success);
        assert_eq!(result.stdout, "line1\nline2\n");
        assert_eq!(result.stderr, "oops\n");

        let captured = lines.lock().unwrap();
        assert_eq!(captured.len(), 3);
        assert!(captured.iter().any(|l| matches!(l, OutputLine::Stderr(_))));
    }

    #[cfg(unix)]
    #[test]
    fn execute_streaming_reports_failure_code() {
        let inv = Invocation::new("sh").args(["-c", "exit 7"]);
        let result =
            execute_streaming(&inv, &CommandOptions::default(), Box::new(|_| {})).unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(7));
    }

    #[cfg(unix)]
    #[test]
    fn execute_streaming_survives_non_utf8_output() {
        let inv = Invocation::new("sh").args([
            "-c",
            "printf 'caf\\351\\n'; sleep 0.2; i=0; while [ $i -lt 20000 ]; do echo line; i=$((i+1)); done; exit 0",
        ]);
        let result =
            execute_streaming(&inv, &CommandOptions::default(), Box::new(|_| {})).unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.starts_with("caf\u{FFFD}\n"));
        assert_eq!(result.stdout.lines().count(), 20001);
    }
}
