//! Tar driver.
//!
//! Tar stores member data uncompressed and contiguous, so the catalog keeps
//! the data offset from the header and materialization is a plain range
//! read.

use std::io::Seek;
use std::io::SeekFrom;

use crate::ArchiveError;
use crate::Result;
use crate::catalog::CatalogEntry;
use crate::catalog::Location;
use crate::driver::DataContext;
use crate::driver::FormatDriver;
use crate::driver::ReadContext;
use crate::driver::read_range;
use crate::pool::ReadSeek;

/// Driver for ustar/GNU tar containers.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarDriver;

fn corrupt(container: &str, err: &std::io::Error) -> ArchiveError {
    ArchiveError::Corrupt(format!("{container}: {err}"))
}

impl FormatDriver for TarDriver {
    fn name(&self) -> &str {
        "tar"
    }

    fn read(&self, ctx: &mut ReadContext<'_>, reader: &mut dyn ReadSeek) -> Result<()> {
        let stream_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        let container = ctx.archive_name().to_string();
        let mut archive = tar::Archive::new(reader);
        let entries = archive
            .entries_with_seek()
            .map_err(|e| corrupt(&container, &e))?;

        for entry in entries {
            let entry = entry.map_err(|e| corrupt(&container, &e))?;
            let header = entry.header();
            let entry_type = header.entry_type();

            if entry_type.is_dir() {
                continue;
            }
            if !(entry_type.is_file() || entry_type.is_contiguous()) {
                ctx.report(format!(
                    "skipping non-regular tar member {}",
                    String::from_utf8_lossy(&entry.path_bytes())
                ))?;
                continue;
            }

            let path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            let (offset, size) = (entry.raw_file_position(), entry.size());
            if offset.checked_add(size).is_none_or(|end| end > stream_len) {
                return Err(ArchiveError::Corrupt(format!(
                    "{container}: {path} declares {size} bytes at {offset}, \
                     past the end of the {stream_len}-byte stream"
                )));
            }
            let location = Location::stored(offset, size);
            ctx.push(CatalogEntry::new(&path).with_location(location));
        }

        tracing::debug!(container = %container, entries = ctx.len(), "tar catalog read");
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
    use crate::FileOption;
    use crate::test_utils::TarTestBuilder;
    use crate::test_utils::create_test_tar;
    use std::sync::Arc;

    fn tar_archive(bytes: Vec<u8>, option: FileOption) -> Arc<crate::Archive> {
        ArchiveBuilder::new(Arc::new(ArchiveContext::default()))
            .bytes("test.tar", bytes)
            .driver(Arc::new(TarDriver))
            .option(option)
            .build()
            .unwrap()
    }

    #[test]
    fn test_catalog_and_data() {
        let data = create_test_tar(vec![("a.txt", b"hello"), ("dir/b.txt", b"world!")]);
        let archive = tar_archive(data, FileOption::DEFAULT);
        archive.open().unwrap();

        let paths: Vec<String> = archive
            .entries()
            .unwrap()
            .iter()
            .map(|e| e.path().to_string())
            .collect();
        assert_eq!(paths, vec!["a.txt", "dir/b.txt"]);
        assert_eq!(archive.get_data("dir/b.txt", FileOption::DEFAULT).unwrap(), b"world!");
    }

    #[test]
    fn test_directories_skipped_and_links_reported() {
        let data = TarTestBuilder::new()
            .add_directory("dir/")
            .add_file("dir/a.txt", b"a")
            .add_symlink("dir/link", "a.txt")
            .build();

        let archive = tar_archive(data.clone(), FileOption::DEFAULT);
        archive.open().unwrap();
        assert_eq!(archive.entries().unwrap().len(), 1);

        // The same member list fails to open once issues escalate.
        let strict = tar_archive(data, FileOption::SUPPRESS);
        assert!(matches!(strict.open(), Err(ArchiveError::Recoverable { .. })));
    }

    #[test]
    fn test_oversized_member_fails_open() {
        let mut header = tar::Header::new_gnu();
        header.set_path("maps/huge.bsp").unwrap();
        header.set_size(1 << 50);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        let mut data = header.as_bytes().to_vec();
        data.extend_from_slice(b"twelve bytes");
        data.resize(2048, 0);

        let archive = tar_archive(data, FileOption::DEFAULT);
        let err = archive.open().unwrap_err();
        assert!(matches!(err, ArchiveError::Corrupt(_)), "{err}");
        assert!(!archive.is_opened());
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let archive = tar_archive(vec![0x42; 1024], FileOption::DEFAULT);
        let err = archive.open().unwrap_err();
        assert!(err.is_structural(), "{err}");
    }
}
