//! gamepak - command-line browser for game resource containers.

mod cli;
mod commands;
mod error;
mod output;
mod progress;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);
    let config = cli.config.as_deref();

    let result = match &cli.command {
        cli::Commands::List(args) => commands::list::execute(args, config, &*formatter),
        cli::Commands::Cat(args) => commands::cat::execute(args, config),
        cli::Commands::Export(args) => {
            commands::export::execute(args, config, &*formatter, cli.quiet)
        }
        cli::Commands::Info(args) => commands::info::execute(args, config, &*formatter),
        cli::Commands::Completion(args) => {
            commands::completion::execute(args.shell);
            Ok(())
        }
    };

    // JSON consumers get the error on stdout in the same envelope.
    if cli.json
        && let Err(e) = &result
    {
        formatter.format_error(e);
        std::process::exit(1);
    }
    result
}

/// Logs go to stderr so `cat` output stays clean. `RUST_LOG` wins over flags.
fn init_tracing(verbose: bool, quiet: bool) {
    let fallback = if verbose {
        "gamepak_core=debug,gamepak=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
