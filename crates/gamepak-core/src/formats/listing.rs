//! Driver for Many containers, whose catalog is a supplied file list.

use std::path::PathBuf;

use crate::ArchiveError;
use crate::Result;
use crate::catalog::CatalogEntry;
use crate::catalog::Location;
use crate::driver::DataContext;
use crate::driver::FormatDriver;
use crate::driver::ReadContext;
use crate::pool::ReadSeek;

/// Builds the catalog from a [`Listing`](crate::driver::Listing) and reads
/// entries straight from disk.
///
/// Listed files that are containers themselves open from their own file, so
/// they get their own reader pool and never contend with this one.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListingDriver;

impl FormatDriver for ListingDriver {
    fn name(&self) -> &str {
        "listing"
    }

    fn read(&self, ctx: &mut ReadContext<'_>, _reader: &mut dyn ReadSeek) -> Result<()> {
        let listing = ctx
            .listing()
            .cloned()
            .ok_or_else(|| ArchiveError::DriverContractViolation {
                reason: format!("{} has no file listing", ctx.archive_name()),
            })?;

        for path in &listing.paths {
            let size = match std::fs::metadata(listing.file_path(path)) {
                Ok(meta) => meta.len(),
                Err(err) => {
                    ctx.report(format!("cannot stat listed file {path}: {err}"))?;
                    0
                }
            };
            ctx.push(CatalogEntry::new(path).with_location(Location::stored(0, size)));
        }
        Ok(())
    }

    fn read_data(
        &self,
        ctx: &DataContext<'_>,
        _reader: &mut dyn ReadSeek,
        entry: &CatalogEntry,
    ) -> Result<Vec<u8>> {
        let path = self
            .nested_source(ctx, entry)
            .ok_or_else(|| ArchiveError::not_found(entry.path()))?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ArchiveError::not_found(path.display().to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn nested_source(&self, ctx: &DataContext<'_>, entry: &CatalogEntry) -> Option<PathBuf> {
        ctx.listing().map(|listing| listing.file_path(entry.path()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ArchiveBuilder;
    use crate::ArchiveContext;
    use crate::FileOption;
    use crate::driver::Listing;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_listing_catalog() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("maps")).unwrap();
        std::fs::write(temp.path().join("maps/e1m1.bsp"), b"BSP29").unwrap();
        std::fs::write(temp.path().join("readme.txt"), b"hi").unwrap();

        let listing = Listing {
            root: temp.path().to_path_buf(),
            paths: vec!["maps/e1m1.bsp".into(), "readme.txt".into()],
        };
        let archive = ArchiveBuilder::new(Arc::new(ArchiveContext::default()))
            .listing("game", listing)
            .build()
            .unwrap();
        archive.open().unwrap();

        assert_eq!(archive.driver_name(), "listing");
        assert_eq!(archive.entries().unwrap()[0].size(), 5);
        assert_eq!(archive.get_data("readme.txt", FileOption::DEFAULT).unwrap(), b"hi");
    }

    #[test]
    fn test_missing_listed_file() {
        let temp = TempDir::new().unwrap();
        let listing = Listing {
            root: temp.path().to_path_buf(),
            paths: vec!["gone.pak".into()],
        };
        let archive = ArchiveBuilder::new(Arc::new(ArchiveContext::default()))
            .listing("game", listing.clone())
            .build()
            .unwrap();
        archive.open().unwrap();
        assert!(matches!(
            archive.get_data("gone.pak", FileOption::DEFAULT),
            Err(ArchiveError::NotFound { .. })
        ));

        let strict = ArchiveBuilder::new(Arc::new(ArchiveContext::default()))
            .listing("game", listing)
            .option(FileOption::SUPPRESS)
            .build()
            .unwrap();
        assert!(matches!(strict.open(), Err(ArchiveError::Recoverable { .. })));
    }
}
