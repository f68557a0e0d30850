//! The format driver contract.
//!
//! A driver is a stateless strategy that knows one on-disk layout. It fills
//! a container's catalog when the container opens and turns catalog entries
//! back into bytes on demand. The container owns the reader pool and hands
//! the driver a positioned reader for every call.

use std::fmt;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use std::path::PathBuf;

use crate::Archive;
use crate::ArchiveError;
use crate::FileOption;
use crate::Result;
use crate::catalog::Catalog;
use crate::catalog::CatalogEntry;
use crate::catalog::EntryTag;
use crate::catalog::Location;
use crate::context::Game;
use crate::pool::PoolPolicy;
use crate::pool::ReadSeek;

/// Pluggable catalog population and byte materialization for one layout.
///
/// # Examples
///
/// ```
/// use gamepak_core::catalog::{CatalogEntry, Location};
/// use gamepak_core::driver::{read_range, DataContext, FormatDriver, ReadContext};
/// use gamepak_core::pool::ReadSeek;
/// use gamepak_core::Result;
/// use std::io::Seek;
///
/// /// Every 4 bytes of the backing stream form one entry.
/// #[derive(Debug)]
/// struct Chunks;
///
/// impl FormatDriver for Chunks {
///     fn name(&self) -> &str {
///         "chunks"
///     }
///
///     fn read(&self, ctx: &mut ReadContext<'_>, reader: &mut dyn ReadSeek) -> Result<()> {
///         let len = reader.seek(std::io::SeekFrom::End(0))?;
///         for (i, offset) in (0..len).step_by(4).enumerate() {
///             let size = (len - offset).min(4);
///             let entry = CatalogEntry::new(&format!("chunk{i}"));
///             ctx.push(entry.with_location(Location::stored(offset, size)));
///         }
///         Ok(())
///     }
///
///     fn read_data(
///         &self,
///         _ctx: &DataContext<'_>,
///         reader: &mut dyn ReadSeek,
///         entry: &CatalogEntry,
///     ) -> Result<Vec<u8>> {
///         read_range(reader, entry.location().offset, entry.location().size)
///     }
/// }
/// ```
pub trait FormatDriver: Send + Sync + fmt::Debug {
    /// Short identifier used in logs and listings.
    fn name(&self) -> &str;

    /// Pool policy the container uses for its backing file.
    fn pool_policy(&self) -> PoolPolicy {
        PoolPolicy::Shared
    }

    /// Whether entries are addressable by numeric id.
    fn uses_ids(&self) -> bool {
        false
    }

    /// Populates the catalog from the backing stream.
    ///
    /// # Errors
    ///
    /// `BadMagic`, `UnsupportedVersion` or `Corrupt` for a layout the driver
    /// cannot parse; any I/O error from the reader.
    fn read(&self, ctx: &mut ReadContext<'_>, reader: &mut dyn ReadSeek) -> Result<()>;

    /// Materializes the bytes of one entry.
    ///
    /// # Errors
    ///
    /// `Corrupt` if the stored data cannot be decoded; any I/O error.
    fn read_data(
        &self,
        ctx: &DataContext<'_>,
        reader: &mut dyn ReadSeek,
        entry: &CatalogEntry,
    ) -> Result<Vec<u8>>;

    /// Materializes one physical part of a multi-part entry.
    ///
    /// The default reads the stored byte range of `part`.
    ///
    /// # Errors
    ///
    /// Same as [`FormatDriver::read_data`].
    fn read_part(
        &self,
        _ctx: &DataContext<'_>,
        reader: &mut dyn ReadSeek,
        _entry: &CatalogEntry,
        part: &Location,
    ) -> Result<Vec<u8>> {
        read_range(reader, part.offset, part.packed_size)
    }

    /// Post-read hook; the default builds the lookup indexes.
    ///
    /// # Errors
    ///
    /// Implementations may reject a catalog that is inconsistent.
    fn process(&self, catalog: &mut Catalog) -> Result<()> {
        catalog.rebuild_indexes(self.uses_ids());
        Ok(())
    }

    /// Backing file for a nested container, when it lives outside this one.
    ///
    /// `None` means the nested container is carved from the bytes returned
    /// by [`FormatDriver::read_data`].
    fn nested_source(&self, _ctx: &DataContext<'_>, _entry: &CatalogEntry) -> Option<PathBuf> {
        None
    }
}

/// Externally supplied file list backing a Many container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Directory the listed paths are relative to.
    pub root: PathBuf,
    /// Logical `/`-separated paths, in catalog order.
    pub paths: Vec<String>,
}

impl Listing {
    /// Resolves a listed logical path to its file on disk.
    #[must_use]
    pub fn file_path(&self, logical: &str) -> PathBuf {
        logical
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

/// What a driver sees while populating a catalog.
pub struct ReadContext<'a> {
    archive: &'a Archive,
    catalog: &'a mut Catalog,
}

impl<'a> ReadContext<'a> {
    pub(crate) fn new(archive: &'a Archive, catalog: &'a mut Catalog) -> Self {
        Self { archive, catalog }
    }

    /// Name of the container being opened.
    pub fn archive_name(&self) -> &str {
        self.archive.name()
    }

    /// Game whose configuration applies.
    pub fn game(&self) -> &Game {
        self.archive.game()
    }

    /// Tag passed by the caller that opened the container.
    pub fn tag(&self) -> Option<&EntryTag> {
        self.archive.open_tag()
    }

    /// Option the container was opened with.
    pub fn option(&self) -> FileOption {
        self.archive.option()
    }

    /// File list, for containers backed by a listing instead of a stream.
    pub fn listing(&self) -> Option<&Listing> {
        self.archive.listing()
    }

    /// Appends an entry to the catalog and returns its index.
    pub fn push(&mut self, entry: CatalogEntry) -> usize {
        self.catalog.push(entry)
    }

    /// Number of entries pushed so far.
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    /// Returns `true` if nothing was pushed yet.
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Reports a recoverable issue.
    ///
    /// # Errors
    ///
    /// Returns `Recoverable` when the container was opened with `SUPPRESS`.
    pub fn report(&self, issue: impl Into<String>) -> Result<()> {
        report_issue(self.archive.name(), self.option(), issue.into())
    }
}

/// What a driver or factory sees while materializing one entry.
pub struct DataContext<'a> {
    archive: &'a Archive,
    option: FileOption,
}

impl<'a> DataContext<'a> {
    pub(crate) fn new(archive: &'a Archive, option: FileOption) -> Self {
        Self { archive, option }
    }

    /// Name of the owning container.
    pub fn archive_name(&self) -> &str {
        self.archive.name()
    }

    /// Game whose configuration applies.
    pub fn game(&self) -> &Game {
        self.archive.game()
    }

    /// Option requested for this materialization.
    pub fn option(&self) -> FileOption {
        self.option
    }

    /// File list, for containers backed by a listing.
    pub fn listing(&self) -> Option<&Listing> {
        self.archive.listing()
    }

    /// Backing file of the owning container, if it has one.
    pub fn backing_path(&self) -> Option<&Path> {
        self.archive.backing_path()
    }

    /// Reports a recoverable issue.
    ///
    /// # Errors
    ///
    /// Returns `Recoverable` when `SUPPRESS` is in effect.
    pub fn report(&self, issue: impl Into<String>) -> Result<()> {
        report_issue(self.archive.name(), self.option, issue.into())
    }
}

fn report_issue(archive: &str, option: FileOption, issue: String) -> Result<()> {
    if option.contains(FileOption::SUPPRESS) {
        return Err(ArchiveError::Recoverable { reason: issue });
    }
    tracing::warn!(archive, issue = %issue, "driver reported a recoverable issue");
    Ok(())
}

/// Checks that `len` bytes at `offset` lie inside the stream.
///
/// Sizes come from container headers and are untrusted; callers check them
/// here before allocating or decoding.
///
/// # Errors
///
/// `Corrupt` if the range runs past the end of the stream.
pub fn ensure_in_stream(reader: &mut dyn ReadSeek, offset: u64, len: u64) -> Result<()> {
    let stream_len = reader.seek(SeekFrom::End(0))?;
    if offset.checked_add(len).is_none_or(|end| end > stream_len) {
        return Err(ArchiveError::Corrupt(format!(
            "range {offset}+{len} runs past end of stream ({stream_len} bytes)"
        )));
    }
    Ok(())
}

/// Reads `len` bytes at `offset`.
///
/// # Errors
///
/// `Corrupt` if the range runs past the end of the stream.
pub fn read_range(reader: &mut dyn ReadSeek, offset: u64, len: u64) -> Result<Vec<u8>> {
    ensure_in_stream(reader, offset, len)?;
    let len = usize::try_from(len)
        .map_err(|_| ArchiveError::Corrupt(format!("entry size {len} exceeds address space")))?;
    reader.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            ArchiveError::Corrupt(format!("range {offset}+{len} runs past end of stream"))
        } else {
            ArchiveError::Io(err)
        }
    })?;
    Ok(buf)
}

/// Reads the whole stream from offset 0.
///
/// # Errors
///
/// Any I/O error from the reader.
pub fn read_all(reader: &mut dyn ReadSeek) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_range() {
        let mut cursor = Cursor::new(b"0123456789".to_vec());
        assert_eq!(read_range(&mut cursor, 2, 3).unwrap(), b"234");
        assert_eq!(read_range(&mut cursor, 0, 0).unwrap(), b"");
    }

    #[test]
    fn test_read_range_past_end_is_corrupt() {
        let mut cursor = Cursor::new(b"0123".to_vec());
        assert!(matches!(
            read_range(&mut cursor, 2, 10),
            Err(ArchiveError::Corrupt(_))
        ));
    }

    #[test]
    fn test_huge_declared_size_is_corrupt_before_allocating() {
        let mut cursor = Cursor::new(vec![0u8; 12]);
        assert!(matches!(
            read_range(&mut cursor, 512, 1 << 50),
            Err(ArchiveError::Corrupt(_))
        ));
        assert!(matches!(
            ensure_in_stream(&mut cursor, u64::MAX, 2),
            Err(ArchiveError::Corrupt(_))
        ));
        assert!(ensure_in_stream(&mut cursor, 4, 8).is_ok());
    }

    #[test]
    fn test_read_all_rewinds() {
        let mut cursor = Cursor::new(b"abc".to_vec());
        cursor.set_position(2);
        assert_eq!(read_all(&mut cursor).unwrap(), b"abc");
    }

    #[test]
    fn test_report_issue_escalates_with_suppress() {
        assert!(report_issue("a.pak", FileOption::DEFAULT, "odd padding".into()).is_ok());
        assert!(matches!(
            report_issue("a.pak", FileOption::SUPPRESS, "odd padding".into()),
            Err(ArchiveError::Recoverable { .. })
        ));
    }

    #[test]
    fn test_listing_file_path() {
        let listing = Listing {
            root: PathBuf::from("/games/quake"),
            paths: vec!["id1/pak0.pak".into()],
        };
        assert_eq!(
            listing.file_path("id1/pak0.pak"),
            PathBuf::from("/games/quake/id1/pak0.pak")
        );
    }
}
