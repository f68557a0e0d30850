//! Zip driver.
//!
//! The central directory is parsed once, when the container opens. Each
//! catalog entry records where its data starts and how it is compressed, so
//! stored members are a plain range read and deflated members stream through
//! `flate2`. Other methods fall back to the `zip` crate's own reader.

use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;

use flate2::read::DeflateDecoder;
use zip::CompressionMethod;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::ArchiveError;
use crate::Result;
use crate::catalog::CatalogEntry;
use crate::catalog::Location;
use crate::driver::DataContext;
use crate::driver::FormatDriver;
use crate::driver::ReadContext;
use crate::driver::ensure_in_stream;
use crate::driver::read_range;
use crate::pool::ReadSeek;

/// Highest APPNOTE revision (6.3) whose members this driver reads.
const MAX_VERSION_NEEDED: u8 = 63;

/// Driver for zip containers, including `pak` files that are zips.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipDriver;

/// Directory facts of a zip member kept on its catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ZipMember {
    index: usize,
    method: CompressionMethod,
    encrypted: bool,
}

fn zip_error(container: &str, err: ZipError) -> ArchiveError {
    match err {
        ZipError::Io(io) => ArchiveError::Io(io),
        ZipError::InvalidArchive(msg) => ArchiveError::BadMagic {
            container: container.to_string(),
            found: msg.to_string(),
        },
        other => ArchiveError::Corrupt(format!("{container}: {other}")),
    }
}

fn open_directory<'r>(
    container: &str,
    reader: &'r mut dyn ReadSeek,
) -> Result<ZipArchive<&'r mut dyn ReadSeek>> {
    reader.seek(SeekFrom::Start(0))?;
    ZipArchive::new(reader).map_err(|e| zip_error(container, e))
}

/// Inflates a raw deflate stream of `packed` bytes at the reader's position.
fn inflate(reader: &mut dyn ReadSeek, packed: u64, size: u64) -> std::io::Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(reader.take(packed)).take(size);
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

impl ZipDriver {
    // Methods without a direct path: the crate re-reads the directory.
    fn read_via_directory(
        container: &str,
        reader: &mut dyn ReadSeek,
        entry: &CatalogEntry,
        index: usize,
    ) -> Result<Vec<u8>> {
        let mut archive = open_directory(container, reader)?;
        let mut member = archive
            .by_index(index)
            .map_err(|e| zip_error(container, e))?;
        let mut buf = Vec::new();
        member.read_to_end(&mut buf).map_err(|e| {
            ArchiveError::Corrupt(format!("{container}: {}: {e}", entry.path()))
        })?;
        Ok(buf)
    }
}

impl FormatDriver for ZipDriver {
    fn name(&self) -> &str {
        "zip"
    }

    fn read(&self, ctx: &mut ReadContext<'_>, reader: &mut dyn ReadSeek) -> Result<()> {
        let container = ctx.archive_name().to_string();
        let mut archive = open_directory(&container, reader)?;

        let mut members = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let member = archive
                .by_index_raw(index)
                .map_err(|e| zip_error(&container, e))?;
            if member.is_dir() {
                continue;
            }
            let data_start = member.data_start().ok_or_else(|| {
                ArchiveError::Corrupt(format!("{container}: {} has no data offset", member.name()))
            })?;
            let location = Location {
                offset: data_start,
                size: member.size(),
                packed_size: member.compressed_size(),
                compressed: member.compression() != CompressionMethod::Stored,
            };
            let tag = ZipMember {
                index,
                method: member.compression(),
                encrypted: member.encrypted(),
            };
            let header = member.header_start();
            members.push((member.name().to_string(), header, location, tag));
        }

        let reader = archive.into_inner();
        for (path, header, location, tag) in members {
            ensure_in_stream(reader, location.offset, location.packed_size)
                .map_err(|e| ArchiveError::Corrupt(format!("{container}: {path}: {e}")))?;
            // Low byte of the local header's "version needed to extract".
            let version = read_range(reader, header + 4, 1)?[0];
            if version > MAX_VERSION_NEEDED {
                return Err(ArchiveError::UnsupportedVersion {
                    container,
                    version: u32::from(version),
                });
            }
            ctx.push(CatalogEntry::new(&path).with_location(location).with_tag(tag));
        }

        tracing::debug!(container = %container, entries = ctx.len(), "zip catalog read");
        Ok(())
    }

    fn read_data(
        &self,
        ctx: &DataContext<'_>,
        reader: &mut dyn ReadSeek,
        entry: &CatalogEntry,
    ) -> Result<Vec<u8>> {
        let container = ctx.archive_name();
        let member = *entry
            .tag_as::<ZipMember>()
            .ok_or_else(|| ArchiveError::DriverContractViolation {
                reason: format!("{} carries no zip directory record", entry.path()),
            })?;
        let location = entry.location();

        if member.encrypted {
            return Self::read_via_directory(container, reader, entry, member.index);
        }
        let data = match member.method {
            CompressionMethod::Stored => {
                read_range(reader, location.offset, location.packed_size)?
            }
            CompressionMethod::Deflated => {
                ensure_in_stream(reader, location.offset, location.packed_size)?;
                reader.seek(SeekFrom::Start(location.offset))?;
                inflate(reader, location.packed_size, location.size).map_err(|e| {
                    ArchiveError::Corrupt(format!("{container}: {}: {e}", entry.path()))
                })?
            }
            _ => return Self::read_via_directory(container, reader, entry, member.index),
        };

        if data.len() as u64 != location.size {
            return Err(ArchiveError::Corrupt(format!(
                "{container}: {} yielded {} bytes, directory declares {}",
                entry.path(),
                data.len(),
                location.size
            )));
        }
        Ok(data)
    }

    // Parts of a zip member are not stored separately.
    fn read_part(
        &self,
        ctx: &DataContext<'_>,
        reader: &mut dyn ReadSeek,
        entry: &CatalogEntry,
        _part: &Location,
    ) -> Result<Vec<u8>> {
        self.read_data(ctx, reader, entry)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ArchiveBuilder;
    use crate::ArchiveContext;
    use crate::FileOption;
    use crate::test_utils::ZipTestBuilder;
    use crate::test_utils::create_test_zip;
    use std::sync::Arc;

    fn zip_archive(bytes: Vec<u8>) -> Arc<crate::Archive> {
        ArchiveBuilder::new(Arc::new(ArchiveContext::default()))
            .bytes("test.zip", bytes)
            .driver(Arc::new(ZipDriver))
            .build()
            .unwrap()
    }

    #[test]
    fn test_catalog_and_data() {
        let data = create_test_zip(vec![("a.txt", b"hello"), ("maps/e1m1.bsp", b"BSP")]);
        let archive = zip_archive(data);
        archive.open().unwrap();

        assert_eq!(archive.entries().unwrap().len(), 2);
        assert_eq!(archive.get_data("maps/e1m1.bsp", FileOption::DEFAULT).unwrap(), b"BSP");
        assert_eq!(archive.get_data("a.txt", FileOption::DEFAULT).unwrap(), b"hello");
    }

    #[test]
    fn test_deflated_member() {
        let payload = vec![b'z'; 4096];
        let data = ZipTestBuilder::new()
            .add_deflated("big.bin", &payload)
            .add_directory("empty/")
            .build();
        let archive = zip_archive(data);
        archive.open().unwrap();

        let entries = archive.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].location().compressed);
        assert!(entries[0].location().packed_size < 4096);
        assert_eq!(archive.get_data("big.bin", FileOption::DEFAULT).unwrap(), payload);
    }

    #[test]
    fn test_catalog_records_data_offsets() {
        let data = create_test_zip(vec![("a.txt", b"hello"), ("b.txt", b"world")]);
        let archive = zip_archive(data.clone());
        archive.open().unwrap();

        for entry in archive.entries().unwrap() {
            let start = usize::try_from(entry.location().offset).unwrap();
            let end = start + usize::try_from(entry.size()).unwrap();
            assert_eq!(
                &data[start..end],
                archive.get_data(entry.path(), FileOption::DEFAULT).unwrap().as_slice()
            );
        }
    }

    #[test]
    fn test_damaged_deflate_stream_is_corrupt() {
        let payload = vec![b'q'; 2048];
        let mut data = ZipTestBuilder::new().add_deflated("big.bin", &payload).build();
        let archive = zip_archive(data.clone());
        archive.open().unwrap();
        let location = *archive.entries().unwrap()[0].location();

        // Flip the packed bytes so the stream no longer decodes to 2048 bytes.
        let start = usize::try_from(location.offset).unwrap();
        let end = start + usize::try_from(location.packed_size).unwrap();
        for byte in &mut data[start..end] {
            *byte = 0xFF;
        }
        let damaged = zip_archive(data);
        damaged.open().unwrap();
        let err = damaged.get_data("big.bin", FileOption::DEFAULT).unwrap_err();
        assert!(matches!(err, ArchiveError::Corrupt(_)), "{err}");
    }

    #[test]
    fn test_future_member_version_is_unsupported() {
        let mut data = create_test_zip(vec![("a.txt", b"hello")]);
        assert_eq!(&data[..4], b"PK\x03\x04");
        data[4] = 90;

        let archive = zip_archive(data);
        let err = archive.open().unwrap_err();
        let ArchiveError::UnsupportedVersion { container, version } = &err else {
            panic!("expected UnsupportedVersion, got {err:?}");
        };
        assert_eq!((container.as_str(), *version), ("test.zip", 90));
        assert!(err.is_structural());
    }

    #[test]
    fn test_not_a_zip_is_bad_magic() {
        let archive = zip_archive(b"definitely not a zip file".to_vec());
        let err = archive.open().unwrap_err();
        assert!(matches!(err, ArchiveError::BadMagic { .. }), "{err}");
    }
}
