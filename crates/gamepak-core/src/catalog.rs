//! Catalog entries and the per-container catalog.
//!
//! Paths are not unique: two entries may carry the same logical path, and the
//! catalog keeps both. Lookups return every match so callers can tell a miss
//! from an ambiguity.

use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::Archive;
use crate::ArchiveError;
use crate::FileOption;
use crate::Result;
use crate::address::EntryKey;
use crate::address::normalize_path;
use crate::factory::ObjectFactory;

/// Driver-private payload attached to an entry.
///
/// Drivers downcast it back with [`CatalogEntry::tag_as`].
pub type EntryTag = Arc<dyn Any + Send + Sync>;

/// Where an entry's bytes live inside the backing stream.
///
/// The core never interprets these fields beyond handing them back to the
/// driver and using `size` for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    /// Byte offset of the data in the backing stream.
    pub offset: u64,
    /// Size after decompression.
    pub size: u64,
    /// Size as stored.
    pub packed_size: u64,
    /// Whether the stored bytes need decompression.
    pub compressed: bool,
}

impl Location {
    /// Creates an uncompressed location.
    #[must_use]
    pub const fn stored(offset: u64, size: u64) -> Self {
        Self {
            offset,
            size,
            packed_size: size,
            compressed: false,
        }
    }
}

/// Factory choice cached on an entry after its first materialization.
#[derive(Clone)]
pub struct Materializer {
    /// Option in effect when the choice was made.
    pub option: FileOption,
    /// Resolved factory, `None` when raw bytes are the only form.
    pub factory: Option<Arc<dyn ObjectFactory>>,
}

impl fmt::Debug for Materializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Materializer")
            .field("option", &self.option)
            .field("factory", &self.factory.as_ref().map(|factory| factory.name()))
            .finish()
    }
}

/// One addressable unit of a container.
pub struct CatalogEntry {
    path: String,
    id: Option<u64>,
    location: Location,
    parts: Vec<Location>,
    tag: Option<EntryTag>,
    nested: Mutex<Option<Arc<Archive>>>,
    materializer: OnceLock<Materializer>,
}

impl CatalogEntry {
    /// Creates an entry for a logical path; the path is normalized.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_path(path),
            id: None,
            location: Location::default(),
            parts: Vec::new(),
            tag: None,
            nested: Mutex::new(None),
            materializer: OnceLock::new(),
        }
    }

    /// Sets the numeric id.
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the data location.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Sets the physical parts the entry decomposes into.
    #[must_use]
    pub fn with_parts(mut self, parts: Vec<Location>) -> Self {
        self.parts = parts;
        self
    }

    /// Attaches a driver-private tag.
    #[must_use]
    pub fn with_tag<T: Any + Send + Sync>(mut self, tag: T) -> Self {
        self.tag = Some(Arc::new(tag));
        self
    }

    /// Returns the normalized logical path.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the numeric id, if the driver assigned one.
    #[inline]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Returns the data location.
    #[inline]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Returns the physical parts; empty for single-part entries.
    #[inline]
    pub fn parts(&self) -> &[Location] {
        &self.parts
    }

    /// Returns the uncompressed size.
    #[inline]
    pub fn size(&self) -> u64 {
        self.location.size
    }

    /// Returns the driver-private tag downcast to `T`.
    pub fn tag_as<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.tag.as_ref().and_then(|tag| tag.downcast_ref::<T>())
    }

    /// Returns the nested container if it has already been instantiated.
    pub fn nested(&self) -> Option<Arc<Archive>> {
        self.nested.lock().clone()
    }

    /// Returns the cached factory choice, if materialization happened.
    pub fn materializer(&self) -> Option<&Materializer> {
        self.materializer.get()
    }

    /// Returns the nested container, running `init` at most once.
    ///
    /// The slot lock is held while `init` runs, so concurrent first access
    /// waits instead of opening the container twice. An `Ok(None)` from
    /// `init` leaves the slot empty.
    pub(crate) fn nested_or_try_init<F>(&self, init: F) -> Result<Option<Arc<Archive>>>
    where
        F: FnOnce() -> Result<Option<Arc<Archive>>>,
    {
        let mut slot = self.nested.lock();
        if let Some(existing) = slot.as_ref() {
            return Ok(Some(Arc::clone(existing)));
        }
        let created = init()?;
        slot.clone_from(&created);
        Ok(created)
    }

    pub(crate) fn take_nested(&self) -> Option<Arc<Archive>> {
        self.nested.lock().take()
    }

    pub(crate) fn materializer_or_init<F>(&self, init: F) -> &Materializer
    where
        F: FnOnce() -> Materializer,
    {
        self.materializer.get_or_init(init)
    }
}

impl fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("path", &self.path)
            .field("id", &self.id)
            .field("location", &self.location)
            .field("parts", &self.parts.len())
            .field("tagged", &self.tag.is_some())
            .finish_non_exhaustive()
    }
}

// Entries compare by path only.
impl PartialEq for CatalogEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for CatalogEntry {}

impl PartialOrd for CatalogEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CatalogEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}

/// Ordered entries of one container plus lookup indexes.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<Arc<CatalogEntry>>,
    by_path: HashMap<String, Vec<usize>>,
    by_id: Option<HashMap<u64, Vec<usize>>>,
    indexed: bool,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and returns its catalog index.
    ///
    /// Indexes are invalidated until [`Catalog::rebuild_indexes`] runs.
    pub fn push(&mut self, entry: CatalogEntry) -> usize {
        self.entries.push(Arc::new(entry));
        self.indexed = false;
        self.entries.len() - 1
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the catalog has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in catalog order.
    #[inline]
    pub fn entries(&self) -> &[Arc<CatalogEntry>] {
        &self.entries
    }

    /// Returns the entry at `index`.
    pub fn get(&self, index: usize) -> Option<&Arc<CatalogEntry>> {
        self.entries.get(index)
    }

    /// Returns `true` if an id index exists.
    pub fn has_id_index(&self) -> bool {
        self.by_id.is_some()
    }

    /// Rebuilds the by-path index and, when `with_ids` is set, the by-id index.
    pub fn rebuild_indexes(&mut self, with_ids: bool) {
        let mut by_path: HashMap<String, Vec<usize>> = HashMap::with_capacity(self.entries.len());
        let mut by_id: HashMap<u64, Vec<usize>> = HashMap::new();
        for (index, entry) in self.entries.iter().enumerate() {
            by_path.entry(entry.path.clone()).or_default().push(index);
            if with_ids && let Some(id) = entry.id {
                by_id.entry(id).or_default().push(index);
            }
        }
        self.by_path = by_path;
        self.by_id = with_ids.then_some(by_id);
        self.indexed = true;
    }

    /// Returns every entry matching `key`.
    ///
    /// Path keys are normalized first. Id keys only match when an id index
    /// was built.
    pub fn find(&self, key: &EntryKey) -> Vec<Arc<CatalogEntry>> {
        let indices: Vec<usize> = match key {
            EntryKey::Path(path) => {
                let path = normalize_path(path);
                if self.indexed {
                    self.by_path.get(&path).cloned().unwrap_or_default()
                } else {
                    self.entries
                        .iter()
                        .enumerate()
                        .filter(|(_, entry)| entry.path == path)
                        .map(|(index, _)| index)
                        .collect()
                }
            }
            EntryKey::Id(id) => self
                .by_id
                .as_ref()
                .and_then(|by_id| by_id.get(id))
                .cloned()
                .unwrap_or_default(),
        };
        indices
            .into_iter()
            .filter_map(|index| self.entries.get(index).cloned())
            .collect()
    }

    /// Resolves `key` to exactly one entry.
    ///
    /// # Errors
    ///
    /// `NotFound` for zero matches, `Ambiguous` for more than one.
    pub fn resolve_one(&self, key: &EntryKey) -> Result<Arc<CatalogEntry>> {
        let mut matches = self.find(key);
        match matches.len() {
            0 => Err(ArchiveError::not_found(key.to_string())),
            1 => Ok(matches.remove(0)),
            count => Err(ArchiveError::Ambiguous {
                path: key.to_string(),
                count,
            }),
        }
    }

    /// Returns `true` if at least one entry matches `key`.
    pub fn contains(&self, key: &EntryKey) -> bool {
        !self.find(key).is_empty()
    }

    /// Paths that occur more than once, with their occurrence count, sorted.
    pub fn duplicates(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in &self.entries {
            *counts.entry(entry.path.as_str()).or_default() += 1;
        }
        let mut duplicates: Vec<(String, usize)> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(path, count)| (path.to_string(), count))
            .collect();
        duplicates.sort();
        duplicates
    }

    pub(crate) fn take_entries(&mut self) -> Vec<Arc<CatalogEntry>> {
        self.by_path.clear();
        self.by_id = None;
        self.indexed = false;
        std::mem::take(&mut self.entries)
    }
}
