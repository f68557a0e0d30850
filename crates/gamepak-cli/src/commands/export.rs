//! Export command implementation

use super::open_container;
use crate::cli::ExportArgs;
use crate::error::add_container_context;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Result;
use anyhow::bail;
use gamepak_core::ExportConfig;
use gamepak_core::ExportProgress;
use gamepak_core::NoopProgress;
use std::path::Path;

pub fn execute(
    args: &ExportArgs,
    config: Option<&Path>,
    formatter: &dyn OutputFormatter,
    quiet: bool,
) -> Result<()> {
    let export_config = build_config(args);
    let container = open_container(&args.uri, config)?;

    let progress: Box<dyn ExportProgress> = if !quiet && CliProgress::should_show() {
        Box::new(CliProgress::new("Exporting"))
    } else {
        Box::new(NoopProgress)
    };

    let report = add_container_context(
        container.export(&args.dest, &export_config, progress.as_ref()),
        &args.uri,
    )?;
    drop(progress);

    formatter.format_export_result(&report)?;

    if report.has_failures() {
        bail!(
            "{} of {} entries failed to export from '{}'",
            report.failures.len(),
            report.total_items(),
            args.uri
        );
    }
    Ok(())
}

fn build_config(args: &ExportArgs) -> ExportConfig {
    ExportConfig::new()
        .with_option(args.option)
        .with_max_in_flight(usize::from(args.jobs))
        .with_progress_interval(args.progress_interval as usize)
        .with_start_index(args.start)
        .with_include(args.include.clone())
        .with_overwrite(!args.no_overwrite)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::cli::Commands;
    use clap::Parser;
    use gamepak_core::FileOption;

    #[test]
    fn test_build_config_from_args() {
        let cli = Cli::try_parse_from([
            "gamepak",
            "export",
            "pak0.pak",
            "out",
            "--jobs",
            "3",
            "-o",
            "raw",
            "--no-overwrite",
            "--progress-interval",
            "5",
        ])
        .unwrap();
        let Commands::Export(args) = cli.command else {
            panic!("expected export");
        };

        let config = build_config(&args);
        assert_eq!(config.max_in_flight, 3);
        assert_eq!(config.progress_interval, 5);
        assert_eq!(config.option, FileOption::RAW);
        assert!(!config.overwrite);
        assert!(config.validate().is_ok());
    }
}
