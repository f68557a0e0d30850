//! JSON output formatter for machine-readable results.

use super::formatter::ContainerInfo;
use super::formatter::JsonOutput;
use super::formatter::ListedEntry;
use super::formatter::OutputFormatter;
use anyhow::Result;
use gamepak_core::ExportReport;
use serde::Serialize;
use std::io::Write;
use std::io::{self};

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct FailureOutput<'a> {
    index: usize,
    path: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct ExportOutput<'a> {
    files_written: usize,
    directories_created: usize,
    bytes_written: u64,
    nested_visited: usize,
    containers: &'a [String],
    failures: Vec<FailureOutput<'a>>,
    duration_ms: u128,
}

impl<'a> From<&'a ExportReport> for ExportOutput<'a> {
    fn from(report: &'a ExportReport) -> Self {
        Self {
            files_written: report.files_written,
            directories_created: report.directories_created,
            bytes_written: report.bytes_written,
            nested_visited: report.nested_visited,
            containers: &report.containers,
            failures: report
                .failures
                .iter()
                .map(|f| FailureOutput {
                    index: f.index,
                    path: &f.path,
                    message: &f.message,
                })
                .collect(),
            duration_ms: report.duration.as_millis(),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_listing(
        &self,
        entries: &[ListedEntry],
        _long: bool,
        _human_readable: bool,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct ListingOutput<'a> {
            total_entries: usize,
            total_size: u64,
            entries: &'a [ListedEntry],
        }

        let data = ListingOutput {
            total_entries: entries.len(),
            total_size: entries.iter().map(|e| e.size).sum(),
            entries,
        };
        Self::output(&JsonOutput::success("list", data))
    }

    fn format_export_result(&self, report: &ExportReport) -> Result<()> {
        Self::output(&JsonOutput::success("export", ExportOutput::from(report)))
    }

    fn format_info(&self, info: &ContainerInfo) -> Result<()> {
        Self::output(&JsonOutput::success("info", info))
    }

    fn format_error(&self, error: &anyhow::Error) {
        let output = JsonOutput::<()>::error("unknown", format!("{error:?}"));
        let _ = Self::output(&output);
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData {
            message: String,
        }

        let output = JsonOutput::success(
            "warning",
            WarningData {
                message: message.to_string(),
            },
        );
        let _ = Self::output(&output);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gamepak_core::ExportFailure;

    #[test]
    fn test_export_output_structure() {
        let mut report = ExportReport::new();
        report.files_written = 3;
        report.containers.push("sub.tar".into());
        report.failures.push(ExportFailure {
            index: 1,
            path: "bad.txt".into(),
            message: "boom".into(),
        });

        let json = serde_json::to_value(JsonOutput::success(
            "export",
            ExportOutput::from(&report),
        ))
        .unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["files_written"], 3);
        assert_eq!(json["data"]["containers"][0], "sub.tar");
        assert_eq!(json["data"]["failures"][0]["path"], "bad.txt");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_error_output_structure() {
        let json = serde_json::to_value(JsonOutput::<()>::error("cat", "missing")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "missing");
        assert!(json.get("data").is_none());
    }
}
