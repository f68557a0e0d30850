//! List command implementation

use super::open_container;
use crate::cli::ListArgs;
use crate::error::add_container_context;
use crate::output::ListedEntry;
use crate::output::OutputFormatter;
use anyhow::Result;
use gamepak_core::Container;
use std::path::Path;

pub fn execute(
    args: &ListArgs,
    config: Option<&Path>,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let container = open_container(&args.uri, config)?;
    let entries = collect_entries(&container, &args.uri)?;

    if entries.is_empty() {
        formatter.format_warning(&format!("'{}' has no entries", container.name()));
    }
    formatter.format_listing(&entries, args.long, args.human_readable)
}

/// Flattens the catalogs behind `container`, tagging Multi members.
pub fn collect_entries(container: &Container, uri: &str) -> Result<Vec<ListedEntry>> {
    let multi = matches!(container, Container::Multi(_));
    let mut listed = Vec::new();
    for archive in container.archives() {
        let member = multi.then(|| archive.name().to_string());
        for (index, entry) in add_container_context(archive.entries(), uri)?
            .iter()
            .enumerate()
        {
            let location = entry.location();
            listed.push(ListedEntry {
                index,
                member: member.clone(),
                id: entry.id(),
                path: entry.path().to_string(),
                size: entry.size(),
                packed_size: location.packed_size,
                compressed: location.compressed,
            });
        }
    }
    Ok(listed)
}
