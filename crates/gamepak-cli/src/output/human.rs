//! Human-readable output formatter with colors and styling.

use super::formatter::ContainerInfo;
use super::formatter::ListedEntry;
use super::formatter::OutputFormatter;
use anyhow::Result;
use console::Term;
use console::style;
use gamepak_core::ExportReport;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        let mut count = 0;

        for c in s.chars().rev() {
            if count == 3 {
                result.push(',');
                count = 0;
            }
            result.push(c);
            count += 1;
        }

        result.chars().rev().collect()
    }

    fn size_column(bytes: u64, human_readable: bool) -> String {
        if human_readable {
            Self::format_size(bytes)
        } else {
            bytes.to_string()
        }
    }

    fn heading(&self, mark: &str, text: &str) {
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {text}", style(mark).green().bold()));
        } else {
            let _ = self.term.write_line(text);
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_listing(
        &self,
        entries: &[ListedEntry],
        long: bool,
        human_readable: bool,
    ) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if !long {
            for entry in entries {
                let _ = self.term.write_line(&entry.address());
            }
            return Ok(());
        }

        for entry in entries {
            let id = entry.id.map_or_else(|| "-".to_string(), |id| id.to_string());
            let flag = if entry.compressed { "c" } else { "-" };
            let _ = self.term.write_line(&format!(
                "{flag} {id:>6} {:>10} {:>10}  {}",
                Self::size_column(entry.packed_size, human_readable),
                Self::size_column(entry.size, human_readable),
                entry.address()
            ));
        }

        let total: u64 = entries.iter().map(|e| e.size).sum();
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "Total: {} entries, {}",
            Self::format_number(entries.len()),
            Self::format_size(total)
        ));

        Ok(())
    }

    fn format_export_result(&self, report: &ExportReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if report.has_failures() {
            if self.use_colors {
                let _ = self.term.write_line(&format!(
                    "{} Export finished with {} failures",
                    style("✗").red().bold(),
                    report.failures.len()
                ));
            } else {
                let _ = self.term.write_line(&format!(
                    "Export finished with {} failures",
                    report.failures.len()
                ));
            }
        } else {
            self.heading("✓", "Export complete");
        }

        let _ = self.term.write_line(&format!(
            "  Files written: {}",
            Self::format_number(report.files_written)
        ));
        let _ = self
            .term
            .write_line(&format!("  Directories: {}", report.directories_created));
        let _ = self.term.write_line(&format!(
            "  Total size: {}",
            Self::format_size(report.bytes_written)
        ));
        if report.nested_visited > 0 {
            let _ = self
                .term
                .write_line(&format!("  Nested containers: {}", report.nested_visited));
        }

        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Duration: {:?}", report.duration));
        }

        if report.has_failures() {
            let _ = self.term.write_line("");
            let _ = self.term.write_line("Failures:");
            for failure in &report.failures {
                let _ = self
                    .term
                    .write_line(&format!("  - {}: {}", failure.path, failure.message));
            }
        }

        Ok(())
    }

    fn format_info(&self, info: &ContainerInfo) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.heading("▸", &format!("{} ({})", info.name, info.kind));

        for archive in &info.archives {
            let _ = self.term.write_line("");
            let _ = self.term.write_line(&format!("  Archive: {}", archive.name));
            let _ = self
                .term
                .write_line(&format!("  Driver:  {}", archive.driver));
            let _ = self.term.write_line(&format!(
                "  Game:    {} ({})",
                archive.game, archive.engine
            ));
            let _ = self.term.write_line(&format!(
                "  Entries: {}",
                Self::format_number(archive.entries)
            ));
            if self.verbose {
                let _ = self.term.write_line(&format!("  State:   {}", archive.state));
            }
            for duplicate in &archive.duplicates {
                let _ = self.term.write_line(&format!(
                    "  Duplicate: {} ({} entries)",
                    duplicate.path, duplicate.count
                ));
            }
        }

        Ok(())
    }

    fn format_error(&self, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = self.term.write_line(&format!("ERROR: {error:?}"));
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.term.write_line(&format!("WARNING: {message}"));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_units() {
        assert_eq!(HumanFormatter::format_size(0), "0 B");
        assert_eq!(HumanFormatter::format_size(1023), "1023 B");
        assert_eq!(HumanFormatter::format_size(1536), "1.5 KB");
        assert_eq!(HumanFormatter::format_size(3 * 1024 * 1024), "3.0 MB");
        assert_eq!(HumanFormatter::format_size(5 << 30), "5.0 GB");
    }

    #[test]
    fn test_format_number_groups() {
        assert_eq!(HumanFormatter::format_number(999), "999");
        assert_eq!(HumanFormatter::format_number(1000), "1,000");
        assert_eq!(HumanFormatter::format_number(65_536), "65,536");
        assert_eq!(HumanFormatter::format_number(12_345_678), "12,345,678");
    }

    #[test]
    fn test_size_column() {
        assert_eq!(HumanFormatter::size_column(2048, false), "2048");
        assert_eq!(HumanFormatter::size_column(2048, true), "2.0 KB");
    }

    #[test]
    fn test_listed_entry_address() {
        let mut entry = ListedEntry {
            index: 0,
            member: None,
            id: None,
            path: "maps/e1m1.bsp".into(),
            size: 5,
            packed_size: 5,
            compressed: false,
        };
        assert_eq!(entry.address(), "maps/e1m1.bsp");
        entry.member = Some("pak1.pak".into());
        assert_eq!(entry.address(), "pak1.pak/maps/e1m1.bsp");
    }
}
