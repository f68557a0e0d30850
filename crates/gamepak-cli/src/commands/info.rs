//! Info command implementation

use super::open_container;
use crate::cli::InfoArgs;
use crate::error::add_container_context;
use crate::output::ArchiveInfo;
use crate::output::ContainerInfo;
use crate::output::DuplicatePath;
use crate::output::OutputFormatter;
use anyhow::Result;
use gamepak_core::Container;
use std::path::Path;

pub fn execute(
    args: &InfoArgs,
    config: Option<&Path>,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let container = open_container(&args.uri, config)?;
    let info = describe(&container, &args.uri)?;
    formatter.format_info(&info)
}

/// Summarizes an opened container.
pub fn describe(container: &Container, uri: &str) -> Result<ContainerInfo> {
    let archives = container
        .archives()
        .iter()
        .map(|archive| {
            let duplicates = add_container_context(archive.duplicates(), uri)?
                .into_iter()
                .map(|(path, count)| DuplicatePath { path, count })
                .collect();
            Ok(ArchiveInfo {
                name: archive.name().to_string(),
                driver: archive.driver_name().to_string(),
                game: archive.game().name.clone(),
                engine: archive.game().engine.clone(),
                state: archive.state().to_string(),
                entries: archive.len(),
                duplicates,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ContainerInfo {
        name: container.name().to_string(),
        kind: container.kind(),
        archives,
    })
}
