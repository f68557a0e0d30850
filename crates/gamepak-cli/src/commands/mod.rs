//! Subcommand implementations.

pub mod cat;
pub mod completion;
pub mod export;
pub mod info;
pub mod list;

use crate::error::add_container_context;
use anyhow::Context;
use anyhow::Result;
use gamepak_core::ArchiveContext;
use gamepak_core::Container;
use std::path::Path;
use std::sync::Arc;

/// Loads the archive context and opens the container behind `uri`.
///
/// Multi members are opened eagerly so listings see every catalog.
pub fn open_container(uri: &str, config: Option<&Path>) -> Result<Container> {
    let context = match config {
        Some(path) => add_container_context(ArchiveContext::load(path), uri)
            .with_context(|| format!("Failed to load '{}'", path.display()))?,
        None => ArchiveContext::default(),
    };
    let context = Arc::new(context);
    tracing::debug!(uri, families = context.families().len(), "opening container");
    let container = add_container_context(context.open(uri), uri)?;
    add_container_context(container.open(), uri)?;
    Ok(container)
}
