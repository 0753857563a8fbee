//! Interactive terminal UI.

use console::Term;
use std::io::Write;
use std::time::Duration;

use crate::provision::{ProvisionReport, StepStatus};

use super::spinner::LineSpinner;
use super::{
    format_duration, should_use_colors, NonInteractiveUI, OutputMode, ProgressSpinner,
    ProvisorTheme, SpinnerHandle, UserInterface,
};

/// Interactive terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    theme: ProvisorTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode) -> Self {
        let theme = if should_use_colors() {
            ProvisorTheme::new()
        } else {
            ProvisorTheme::plain()
        };

        Self {
            term: Term::stdout(),
            theme,
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_error(msg)).ok();
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else if self.mode.shows_status() {
            Box::new(LineSpinner::start(message, self.theme.clone()))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn show_hint(&mut self, hint: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "  {}", self.theme.hint.apply_to(hint)).ok();
        }
    }

    fn show_error_block(&mut self, command: &str, output: &str, hint: Option<&str>) {
        write!(self.term, "{}", render_error_block(&self.theme, command, output, hint)).ok();
    }

    fn show_report(&mut self, report: &ProvisionReport) {
        if self.mode.shows_status() {
            write!(self.term, "{}", render_report(&self.theme, report)).ok();
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }

    fn set_output_mode(&mut self, mode: OutputMode) {
        self.mode = mode;
    }
}

/// Boxed view of a failed command and its output.
pub(crate) fn render_error_block(
    theme: &ProvisorTheme,
    command: &str,
    output: &str,
    hint: Option<&str>,
) -> String {
    let b = &theme.border;
    let mut out = String::new();
    out.push_str(&format!(
        "    {} {}\n",
        b.apply_to("┌─"),
        b.apply_to("Command ──────────────────────────")
    ));
    out.push_str(&format!(
        "    {} {}\n",
        b.apply_to("│"),
        theme.command.apply_to(command)
    ));
    if !output.trim().is_empty() {
        out.push_str(&format!(
            "    {} {}\n",
            b.apply_to("├─"),
            b.apply_to("Output ───────────────────────────")
        ));
        for line in output.lines() {
            out.push_str(&format!("    {} {}\n", b.apply_to("│"), line));
        }
    }
    out.push_str(&format!(
        "    {}\n",
        b.apply_to("└────────────────────────────────────")
    ));
    if let Some(h) = hint {
        out.push_str(&format!(
            "\n    {} {}\n",
            theme.hint.apply_to("Hint:"),
            theme.hint.apply_to(h)
        ));
    }
    out
}

/// Summary box listing every step of a run.
pub(crate) fn render_report(theme: &ProvisorTheme, report: &ProvisionReport) -> String {
    let b = &theme.border;
    let mut out = String::new();

    out.push_str(&format!(
        "\n  {} {}\n",
        b.apply_to("┌─"),
        b.apply_to("Summary ──────────────────────────")
    ));

    for step in &report.steps {
        let right_side = match step.status {
            StepStatus::NotRun => theme.dim.apply_to("not run").to_string(),
            _ => {
                let mut detail =
                    format_duration(Duration::from_millis(step.duration_ms));
                if let Some(version) = &step.version {
                    detail = format!("{} · {}", version, detail);
                }
                if step.status == StepStatus::Ignored {
                    detail = format!("ignored · {}", detail);
                }
                theme.duration.apply_to(detail).to_string()
            }
        };
        out.push_str(&format!(
            "  {} {} {:<20} {}\n",
            b.apply_to("│"),
            theme.status_icon(step.status),
            step.name,
            right_side,
        ));
    }

    let total = (report.finished_at - report.started_at)
        .to_std()
        .unwrap_or_default();
    out.push_str(&format!(
        "  {}\n",
        b.apply_to("├────────────────────────────────────")
    ));
    out.push_str(&format!(
        "  {} Total: {} {} {} completed {} {} ignored {} {} not run\n",
        b.apply_to("│"),
        theme.duration.apply_to(format_duration(total)),
        theme.dim.apply_to("·"),
        report.count(StepStatus::Completed),
        theme.dim.apply_to("·"),
        report.count(StepStatus::Ignored),
        theme.dim.apply_to("·"),
        report.count(StepStatus::NotRun),
    ));
    out.push_str(&format!(
        "  {}\n",
        b.apply_to("└────────────────────────────────────")
    ));

    match &report.failure {
        None => out.push_str(&format!(
            "  {}\n",
            theme.format_success(&format!("Profile '{}' provisioned", report.profile))
        )),
        Some(failure) => out.push_str(&format!(
            "  {}\n",
            theme.format_error(&format!(
                "Step '{}' failed (exit code {})",
                failure.step, failure.exit_code
            ))
        )),
    }
    out
}

/// Create the appropriate UI based on context.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive && Term::stdout().is_term() {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}
