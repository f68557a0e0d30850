//! Shell completion generation command.

use crate::cli::Cli;
use clap::CommandFactory;
use clap_complete::Shell;
use std::io;

/// Binary name completions are generated for.
const BIN_NAME: &str = "gamepak";

/// Writes completions for `shell` to stdout.
pub fn execute(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, &mut io::stdout());
}
