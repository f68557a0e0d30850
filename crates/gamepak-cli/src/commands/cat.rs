//! Cat command implementation

use super::open_container;
use crate::cli::CatArgs;
use crate::error::add_container_context;
use anyhow::Context;
use anyhow::Result;
use gamepak_core::EntryKey;
use gamepak_core::FileOption;
use std::io::Write;
use std::io::{self};
use std::path::Path;

pub fn execute(args: &CatArgs, config: Option<&Path>) -> Result<()> {
    let key = if args.id {
        let id = args
            .entry
            .parse::<u64>()
            .with_context(|| format!("'{}' is not a numeric entry id", args.entry))?;
        EntryKey::Id(id)
    } else {
        EntryKey::from(args.entry.as_str())
    };

    let container = open_container(&args.uri, config)?;
    let data = add_container_context(container.get_data(key, FileOption::DEFAULT), &args.uri)?;
    tracing::debug!(entry = %args.entry, bytes = data.len(), "writing entry");

    let mut stdout = io::stdout().lock();
    stdout.write_all(&data)?;
    stdout.flush()?;
    Ok(())
}
