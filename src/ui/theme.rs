//! Visual theme and styling.

use console::Style;

use crate::provision::StepStatus;

/// provisor's visual theme.
#[derive(Debug, Clone)]
pub struct ProvisorTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warnings and ignored failures (yellow).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for running elements (cyan).
    pub info: Style,
    /// Style for dim/secondary text.
    pub dim: Style,
    /// Style for highlighted text (bold).
    pub highlight: Style,
    /// Style for headers (cyan bold).
    pub header: Style,
    /// Style for durations (dim).
    pub duration: Style,
    /// Style for commands shown in output (dim italic).
    pub command: Style,
    /// Style for box-drawing borders (dim).
    pub border: Style,
    /// Style for hints (cyan dim).
    pub hint: Style,
}

impl Default for ProvisorTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvisorTheme {
    /// Create the default theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            info: Style::new().cyan(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().cyan(),
            duration: Style::new().dim(),
            command: Style::new().dim().italic(),
            border: Style::new().dim(),
            hint: Style::new().cyan().dim(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            duration: Style::new(),
            command: Style::new(),
            border: Style::new(),
            hint: Style::new(),
        }
    }

    /// Format a success message (icon + text in green).
    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    /// Format a warning message (icon + text in yellow).
    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    /// Format an error message (icon + text in red bold).
    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    /// Format a header banner.
    pub fn format_header(&self, title: &str) -> String {
        format!(
            "{} {}",
            self.header.apply_to("▶"),
            self.highlight.apply_to(title)
        )
    }

    /// Styled icon for a step status.
    pub fn status_icon(&self, status: StepStatus) -> String {
        match status {
            StepStatus::Completed => self.success.apply_to("✓").to_string(),
            StepStatus::Failed => self.error.apply_to("✗").to_string(),
            StepStatus::Ignored => self.warning.apply_to("⚠").to_string(),
            StepStatus::NotRun => self.dim.apply_to("○").to_string(),
        }
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_formats_messages() {
        let theme = ProvisorTheme::plain();
        assert_eq!(theme.format_success("install"), "✓ install");
        assert_eq!(theme.format_warning("yt-dlp (ignored)"), "⚠ yt-dlp (ignored)");
        assert_eq!(theme.format_error("install"), "✗ install");
    }

    #[test]
    fn theme_formats_header() {
        let theme = ProvisorTheme::plain();
        assert_eq!(theme.format_header("provisor · ci"), "▶ provisor · ci");
    }

    #[test]
    fn status_icons_are_distinct() {
        let theme = ProvisorTheme::plain();
        assert_eq!(theme.status_icon(StepStatus::Completed), "✓");
        assert_eq!(theme.status_icon(StepStatus::Failed), "✗");
        assert_eq!(theme.status_icon(StepStatus::Ignored), "⚠");
        assert_eq!(theme.status_icon(StepStatus::NotRun), "○");
    }

    #[test]
    fn default_impl_matches_new() {
        assert_eq!(
            ProvisorTheme::default().format_success("test"),
            ProvisorTheme::new().format_success("test")
        );
    }
}
