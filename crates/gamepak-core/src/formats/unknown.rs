//! Fallback driver for unregistered formats.

use std::io::Seek;
use std::io::SeekFrom;

use crate::Result;
use crate::address::file_name_of;
use crate::catalog::CatalogEntry;
use crate::catalog::Location;
use crate::driver::DataContext;
use crate::driver::FormatDriver;
use crate::driver::ReadContext;
use crate::driver::read_range;
use crate::pool::ReadSeek;

/// Exposes the whole backing stream as a single entry named after the
/// container.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnknownDriver;

impl FormatDriver for UnknownDriver {
    fn name(&self) -> &str {
        "unknown"
    }

    fn read(&self, ctx: &mut ReadContext<'_>, reader: &mut dyn ReadSeek) -> Result<()> {
        let len = reader.seek(SeekFrom::End(0))?;
        let name = file_name_of(ctx.archive_name()).to_string();
        ctx.push(CatalogEntry::new(&name).with_location(Location::stored(0, len)));
        Ok(())
    }

    fn read_data(
        &self,
        _ctx: &DataContext<'_>,
        reader: &mut dyn ReadSeek,
        entry: &CatalogEntry,
    ) -> Result<Vec<u8>> {
        read_range(reader, entry.location().offset, entry.size())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ArchiveBuilder;
    use crate::ArchiveContext;
    use std::sync::Arc;

    #[test]
    fn test_single_entry_named_after_container() {
        let archive = ArchiveBuilder::new(Arc::new(ArchiveContext::default()))
            .bytes("maps/e1m1.bsp", b"BSP29 data".to_vec())
            .driver(Arc::new(UnknownDriver))
            .build()
            .unwrap();
        archive.open().unwrap();

        let entries = archive.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path(), "e1m1.bsp");
        assert_eq!(entries[0].size(), 10);
        assert_eq!(
            archive.get_data("e1m1.bsp", crate::FileOption::DEFAULT).unwrap(),
            b"BSP29 data"
        );
    }
}
