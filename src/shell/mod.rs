//! Process execution and platform conventions.

pub mod command;
pub mod platform;

pub use command::{
    execute, execute_streaming, CommandOptions, CommandResult, Invocation, OutputCallback,
    OutputLine,
};
pub use platform::{
    executable_name, exit_status_byte, is_ci, prepend_path, venv_bin_dir,
};
