//! Progress spinners.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::theme::ProvisorTheme;
use super::SpinnerHandle;

/// An animated spinner for a running step.
pub struct ProgressSpinner {
    bar: ProgressBar,
    theme: ProvisorTheme,
}

impl ProgressSpinner {
    /// Create a new spinner with a message.
    pub fn new(message: &str, theme: ProvisorTheme) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("  {spinner:.cyan} {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self { bar, theme }
    }

    /// Create a spinner that doesn't show (for silent mode).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            theme: ProvisorTheme::plain(),
        }
    }

    fn finish(&mut self, line: String) {
        if let Ok(style) = ProgressStyle::default_spinner().template("  {msg}") {
            self.bar.set_style(style);
        }
        self.bar.finish_with_message(line);
    }
}

impl SpinnerHandle for ProgressSpinner {
    fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.finish(line);
    }

    fn finish_error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.finish(line);
    }

    fn finish_warning(&mut self, msg: &str) {
        let line = self.theme.format_warning(msg);
        self.finish(line);
    }
}

/// Line-oriented stand-in for a spinner: prints the start message and the
/// outcome as plain lines. Used when output is streamed or not a terminal.
pub struct LineSpinner {
    theme: ProvisorTheme,
}

impl LineSpinner {
    /// Print `message` and return the handle.
    pub fn start(message: &str, theme: ProvisorTheme) -> Self {
        println!("  {}", theme.info.apply_to(message));
        Self { theme }
    }
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        println!("  {}", self.theme.format_success(msg));
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("  {}", self.theme.format_error(msg));
    }

    fn finish_warning(&mut self, msg: &str) {
        eprintln!("  {}", self.theme.format_warning(msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_spinner_finishes() {
        let mut spinner = ProgressSpinner::hidden();
        spinner.set_message("install");
        spinner.finish_success("install");
    }

    #[test]
    fn spinner_finish_variants() {
        ProgressSpinner::new("a", ProvisorTheme::plain()).finish_success("a");
        ProgressSpinner::new("b", ProvisorTheme::plain()).finish_error("b");
        ProgressSpinner::new("c", ProvisorTheme::plain()).finish_warning("c");
    }

    #[test]
    fn line_spinner_prints_without_panicking() {
        let mut spinner = LineSpinner::start("install", ProvisorTheme::plain());
        spinner.set_message("ignored");
        spinner.finish_warning("probe (ignored)");
    }
}
