//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use gamepak_core::FileOption;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gamepak")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Game families description (JSON); defaults to plain file paths
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the entries of a container
    List(ListArgs),
    /// Write the raw bytes of one entry to stdout
    Cat(CatArgs),
    /// Export container entries to a directory
    Export(ExportArgs),
    /// Show container kind, driver and catalog statistics
    Info(InfoArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Container address (scheme:/path#game) or plain path
    #[arg(value_name = "URI")]
    pub uri: String,

    /// Show ids, packed sizes and totals
    #[arg(short, long)]
    pub long: bool,

    /// Show sizes in human-readable format
    #[arg(short = 'H', long)]
    pub human_readable: bool,
}

#[derive(clap::Args)]
pub struct CatArgs {
    /// Container address (scheme:/path#game) or plain path
    #[arg(value_name = "URI")]
    pub uri: String,

    /// Entry path or numeric id; `a.pak:inner/path` crosses into nested containers
    #[arg(value_name = "ENTRY")]
    pub entry: String,

    /// Look the entry up by numeric id
    #[arg(long)]
    pub id: bool,
}

#[derive(clap::Args)]
pub struct ExportArgs {
    /// Container address (scheme:/path#game) or plain path
    #[arg(value_name = "URI")]
    pub uri: String,

    /// Output directory (created if missing)
    #[arg(value_name = "DEST")]
    pub dest: PathBuf,

    /// Entries exported concurrently
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,

    /// Comma-separated file options (raw, marker, object, binary, stream, unknown, suppress)
    #[arg(short, long, default_value = "default")]
    pub option: FileOption,

    /// Only export entries matching the pattern (glob, can be repeated)
    #[arg(long = "include", short = 'i', value_name = "PATTERN")]
    pub include: Vec<String>,

    /// Catalog index of the first exported entry
    #[arg(long, default_value = "0")]
    pub start: usize,

    /// Report progress every N entries
    #[arg(long, default_value = "50", value_parser = clap::value_parser!(u32).range(1..))]
    pub progress_interval: u32,

    /// Keep files that already exist in DEST
    #[arg(long)]
    pub no_overwrite: bool,
}

#[derive(clap::Args)]
pub struct InfoArgs {
    /// Container address (scheme:/path#game) or plain path
    #[arg(value_name = "URI")]
    pub uri: String,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from([
            "gamepak", "export", "pak0.pak", "out", "--jobs", "4", "-o", "raw,marker", "-i",
            "*.bsp", "--start", "2",
        ])
        .unwrap();
        let Commands::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.jobs, 4);
        assert!(args.option.contains(FileOption::RAW | FileOption::MARKER));
        assert_eq!(args.include, vec!["*.bsp"]);
        assert_eq!(args.start, 2);
    }

    #[test]
    fn test_rejects_zero_jobs_and_bad_option() {
        assert!(Cli::try_parse_from(["gamepak", "export", "a", "b", "--jobs", "0"]).is_err());
        assert!(Cli::try_parse_from(["gamepak", "export", "a", "b", "-o", "shiny"]).is_err());
    }
}
