//! Non-interactive UI for CI/headless environments.

use super::spinner::LineSpinner;
use super::terminal::{render_error_block, render_report};
use super::{OutputMode, ProgressSpinner, ProvisorTheme, SpinnerHandle, UserInterface};
use crate::provision::ProvisionReport;

/// UI implementation for non-interactive mode.
///
/// Spinners become plain start and finish lines, and nothing is styled, so
/// the output reads well in CI logs.
pub struct NonInteractiveUI {
    mode: OutputMode,
    theme: ProvisorTheme,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            theme: ProvisorTheme::plain(),
        }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", self.theme.format_success(msg));
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("{}", self.theme.format_warning(msg));
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_error(msg));
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_status() {
            Box::new(LineSpinner::start(message, self.theme.clone()))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("\n{}\n", self.theme.format_header(title));
        }
    }

    fn show_hint(&mut self, hint: &str) {
        if self.mode.shows_status() {
            println!("  {}", hint);
        }
    }

    fn show_error_block(&mut self, command: &str, output: &str, hint: Option<&str>) {
        eprint!("{}", render_error_block(&self.theme, command, output, hint));
    }

    fn show_report(&mut self, report: &ProvisionReport) {
        if self.mode.shows_status() {
            print!("{}", render_report(&self.theme, report));
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }

    fn set_output_mode(&mut self, mode: OutputMode) {
        self.mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_is_not_interactive() {
        let ui = NonInteractiveUI::new(OutputMode::Normal);
        assert!(!ui.is_interactive());
    }

    #[test]
    fn output_mode_preserved() {
        let ui = NonInteractiveUI::new(OutputMode::Quiet);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }

    #[test]
    fn spinner_lines_do_not_panic() {
        let mut ui = NonInteractiveUI::new(OutputMode::Normal);
        let mut spinner = ui.start_spinner("install");
        spinner.finish_success("install");
        let mut silent = NonInteractiveUI::new(OutputMode::Silent);
        silent.start_spinner("install").finish_error("install");
    }
}
