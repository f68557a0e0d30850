//! Progress bar implementation for CLI exports.

use console::Term;
use gamepak_core::ExportFailure;
use gamepak_core::ExportProgress;
use gamepak_core::ExportReport;
use indicatif::ProgressBar;
use indicatif::ProgressState;
use indicatif::ProgressStyle;
use std::fmt::Write;

/// CLI progress bar wrapper implementing `ExportProgress`.
///
/// Tracks the catalog currently being exported: nested containers report
/// their own totals and the bar follows them. Failures are printed above
/// the bar. Cleans up on drop.
pub struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    /// Creates a new CLI progress bar.
    ///
    /// # Arguments
    ///
    /// * `message` - Message to display (e.g., "Exporting")
    #[must_use]
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(0);

        // Template: "Exporting [████░░░░] 42/100 entries (12s) maps/e1m1.bsp"
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} [{bar:40.cyan/blue}] {pos}/{len} entries ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .with_key("eta", |state: &ProgressState, w: &mut dyn Write| {
                    write!(w, "{}", humanize_duration(state.eta())).unwrap_or(());
                })
                .progress_chars("█▓░"),
        );
        bar.set_prefix(message.to_string());

        Self { bar }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stderr().is_term()
    }

    #[cfg(test)]
    fn position(&self) -> (u64, Option<u64>) {
        (self.bar.position(), self.bar.length())
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl ExportProgress for CliProgress {
    fn on_item(&self, index: usize, total: usize, path: &str) {
        self.bar.set_length(total as u64);
        self.bar.set_position(index as u64 + 1);
        self.bar.set_message(path.to_string());
    }

    fn on_error(&self, failure: &ExportFailure) {
        self.bar
            .println(format!("failed: {} ({})", failure.path, failure.message));
    }

    fn on_complete(&self, _report: &ExportReport) {
        self.bar.finish_and_clear();
    }
}

/// Converts duration to human-readable format.
fn humanize_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_duration() {
        assert_eq!(humanize_duration(std::time::Duration::from_secs(0)), "0s");
        assert_eq!(humanize_duration(std::time::Duration::from_secs(30)), "30s");
        assert_eq!(
            humanize_duration(std::time::Duration::from_secs(90)),
            "1m30s"
        );
        assert_eq!(
            humanize_duration(std::time::Duration::from_secs(3661)),
            "1h1m"
        );
    }

    #[test]
    fn test_progress_follows_items() {
        let progress = CliProgress::new("Testing");

        progress.on_item(0, 10, "a.txt");
        assert_eq!(progress.position(), (1, Some(10)));

        progress.on_item(9, 10, "j.txt");
        assert_eq!(progress.position(), (10, Some(10)));

        progress.on_error(&ExportFailure {
            index: 3,
            path: "d.txt".into(),
            message: "boom".into(),
        });
    }
}
