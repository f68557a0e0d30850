//! Virtual archive engine for game resource containers.
//!
//! `gamepak-core` opens the packed containers games ship their data in and
//! exposes every member as a catalog entry that can be looked up by path or
//! id, read as bytes, decoded into a typed object, or exported to disk.
//! Containers nest: a path like `pak0.pak:maps/e1m1.bsp` crosses from one
//! container into the one stored inside it.
//!
//! On-disk layouts are handled by [`FormatDriver`]s and typed decoding by
//! [`ObjectFactory`]s, both selected per engine and file extension through
//! the registries held by an [`ArchiveContext`].
//!
//! # Examples
//!
//! ```no_run
//! use gamepak_core::ArchiveContext;
//! use gamepak_core::ExportConfig;
//! use gamepak_core::FileOption;
//! use gamepak_core::NoopProgress;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let context = Arc::new(ArchiveContext::load("games.json")?);
//! let container = context.open("quake:/id1/pak0.pak#q1")?;
//!
//! let bsp = container.get_data("maps/e1m1.bsp", FileOption::DEFAULT)?;
//! println!("{} bytes", bsp.len());
//!
//! let report = container.export("/tmp/out".as_ref(), &ExportConfig::default(), &NoopProgress)?;
//! println!("Exported {} files", report.files_written);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod archive;
pub mod catalog;
pub mod config;
pub mod container;
pub mod context;
pub mod decoder;
pub mod driver;
pub mod error;
pub mod export;
pub mod factory;
pub mod formats;
pub mod multi;
pub mod option;
pub mod pool;
pub mod registry;
pub mod report;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use address::ArchiveUri;
pub use address::EntryKey;
pub use archive::Archive;
pub use archive::ArchiveBuilder;
pub use archive::LifecycleState;
pub use catalog::Catalog;
pub use catalog::CatalogEntry;
pub use config::ExportConfig;
pub use container::Container;
pub use context::ArchiveContext;
pub use context::ContextConfig;
pub use context::Game;
pub use driver::FormatDriver;
pub use error::ArchiveError;
pub use error::Result;
pub use factory::ArchiveObject;
pub use factory::Materialized;
pub use factory::ObjectFactory;
pub use multi::MultiArchive;
pub use option::FileOption;
pub use report::ExportFailure;
pub use report::ExportProgress;
pub use report::ExportReport;
pub use report::NoopProgress;
