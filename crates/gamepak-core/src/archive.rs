//! The Archive container and its builder.
//!
//! An [`Archive`] owns a catalog filled by its format driver, the reader pool
//! over its backing stream and, through its entries, every nested container
//! it lazily instantiates. Lookups take `self: &Arc<Self>` because a lookup
//! that crosses into a nested container returns that container as the owner
//! of the entry.
//!
//! # Lifecycle
//!
//! `Closed -> Opening -> Opened -> Closing -> Closed`. Opening an opened
//! container does nothing; closing a closed one does nothing. A structural
//! driver error during open (`BadMagic`, `UnsupportedVersion`, `Corrupt`)
//! leaves the container closed for good: later opens fail with `Unusable`
//! and the container has to be built again.

use std::any::Any;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use parking_lot::RwLock;

use crate::ArchiveContext;
use crate::ArchiveError;
use crate::FileOption;
use crate::Result;
use crate::address::EntryKey;
use crate::address::extension_of;
use crate::address::file_name_of;
use crate::address::split_nested;
use crate::catalog::Catalog;
use crate::catalog::CatalogEntry;
use crate::catalog::EntryTag;
use crate::catalog::Materializer;
use crate::context::Game;
use crate::driver::DataContext;
use crate::driver::FormatDriver;
use crate::driver::Listing;
use crate::driver::ReadContext;
use crate::error::lookup_miss_to_none;
use crate::factory::ArchiveObject;
use crate::factory::Materialized;
use crate::factory::UnknownFile;
use crate::formats::ListingDriver;
use crate::pool::ReaderPool;

/// Lifecycle state of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Not readable; the initial state.
    #[default]
    Closed,
    /// Catalog population in progress.
    Opening,
    /// Catalog populated; lookups allowed.
    Opened,
    /// Releasing the pool and nested containers.
    Closing,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Opened => "opened",
            Self::Closing => "closing",
        })
    }
}

/// Where a container's bytes come from.
#[derive(Clone)]
enum ArchiveSource {
    /// A file on disk, read through a file-backed pool.
    File(PathBuf),
    /// Bytes carved from a parent entry, read through a static pool.
    Bytes(Arc<[u8]>),
    /// A list of files on disk forming a Many container.
    Listing(Listing),
}

/// A container over one backing stream.
///
/// # Examples
///
/// ```
/// use gamepak_core::test_utils::create_test_tar;
/// use gamepak_core::{ArchiveBuilder, ArchiveContext, FileOption};
/// use std::sync::Arc;
///
/// # fn main() -> gamepak_core::Result<()> {
/// let context = Arc::new(ArchiveContext::default());
/// let archive = ArchiveBuilder::new(context)
///     .bytes("base.tar", create_test_tar(vec![("maps/e1m1.bsp", b"BSP29")]))
///     .build()?;
/// archive.open()?;
///
/// assert!(archive.contains("maps/e1m1.bsp"));
/// assert_eq!(archive.get_data("maps/e1m1.bsp", FileOption::DEFAULT)?, b"BSP29");
/// assert!(archive.find_entry("missing.bsp")?.is_none());
/// # Ok(())
/// # }
/// ```
pub struct Archive {
    name: String,
    source: ArchiveSource,
    context: Arc<ArchiveContext>,
    game: Game,
    driver: Arc<dyn FormatDriver>,
    tag: Option<EntryTag>,
    option: FileOption,
    state: Mutex<LifecycleState>,
    unusable: AtomicBool,
    transition: Mutex<()>,
    catalog: RwLock<Catalog>,
    pool: RwLock<Option<Arc<ReaderPool>>>,
}

impl Archive {
    /// Builds a Sub container over the bytes of `entry` in `parent`.
    ///
    /// The container is returned closed. Its driver is chosen from the
    /// entry's extension and the parent's game.
    ///
    /// # Errors
    ///
    /// Any error materializing the parent entry.
    pub fn sub(parent: &Arc<Self>, entry: &CatalogEntry) -> Result<Arc<Self>> {
        let bytes = parent.entry_data(entry, parent.option)?;
        parent
            .child_builder(entry)
            .bytes(entry.path(), bytes)
            .build()
    }

    fn child_builder(&self, entry: &CatalogEntry) -> ArchiveBuilder {
        let driver = self
            .context
            .drivers()
            .resolve(&self.game.engine, &extension_of(entry.path()));
        ArchiveBuilder::new(Arc::clone(&self.context))
            .game(self.game.clone())
            .driver(driver)
            .option(self.option)
    }

    /// Container name: the file name for file-backed containers, the entry
    /// path for nested ones.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Game whose drivers and factories apply.
    #[inline]
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Option passed to the driver while opening.
    #[inline]
    pub fn option(&self) -> FileOption {
        self.option
    }

    /// Tag supplied by whoever built the container.
    pub fn open_tag(&self) -> Option<&EntryTag> {
        self.tag.as_ref()
    }

    /// Name of the format driver.
    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }

    /// Process context the container was built in.
    pub fn context(&self) -> &Arc<ArchiveContext> {
        &self.context
    }

    /// Backing file, for file-backed containers.
    pub fn backing_path(&self) -> Option<&Path> {
        match &self.source {
            ArchiveSource::File(path) => Some(path),
            ArchiveSource::Listing(listing) => Some(&listing.root),
            ArchiveSource::Bytes(_) => None,
        }
    }

    /// File list, for Many containers.
    pub fn listing(&self) -> Option<&Listing> {
        match &self.source {
            ArchiveSource::Listing(listing) => Some(listing),
            _ => None,
        }
    }

    /// Returns `true` for containers backed by a file list.
    pub fn is_many(&self) -> bool {
        matches!(self.source, ArchiveSource::Listing(_))
    }

    /// Returns `true` for containers carved from a parent entry.
    pub fn is_sub(&self) -> bool {
        matches!(self.source, ArchiveSource::Bytes(_))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    /// Returns `true` if lookups are allowed.
    pub fn is_opened(&self) -> bool {
        self.state() == LifecycleState::Opened
    }

    /// Readers opened by the pool so far; zero while closed.
    pub fn opened_readers(&self) -> usize {
        self.pool.read().as_ref().map_or(0, |pool| pool.opened_readers())
    }

    fn set_state(&self, state: LifecycleState) {
        *self.state.lock() = state;
    }

    fn ensure_opened(&self) -> Result<()> {
        match self.state() {
            LifecycleState::Opened => Ok(()),
            state => Err(ArchiveError::InvalidState {
                container: self.name.clone(),
                state: state.to_string(),
            }),
        }
    }

    /// Opens the container: creates the pool, runs the driver's `read` and
    /// `process` hooks.
    ///
    /// Calling `open` on an opened container is a no-op, so the driver reads
    /// the catalog exactly once per opened lifetime.
    ///
    /// # Errors
    ///
    /// `NotFound` if the backing file is missing, `Unusable` after an
    /// earlier structural failure, or whatever the driver raises.
    pub fn open(&self) -> Result<()> {
        let _transition = self.transition.lock();
        if self.unusable.load(Ordering::Acquire) {
            return Err(ArchiveError::Unusable {
                container: self.name.clone(),
            });
        }
        match self.state() {
            LifecycleState::Opened => return Ok(()),
            LifecycleState::Closed => {}
            state => {
                return Err(ArchiveError::InvalidState {
                    container: self.name.clone(),
                    state: state.to_string(),
                });
            }
        }

        self.set_state(LifecycleState::Opening);
        match self.load() {
            Ok(()) => {
                self.set_state(LifecycleState::Opened);
                tracing::debug!(
                    archive = %self.name,
                    driver = self.driver.name(),
                    entries = self.catalog.read().len(),
                    "container opened"
                );
                Ok(())
            }
            Err(err) => {
                if err.is_structural() {
                    self.unusable.store(true, Ordering::Release);
                    tracing::warn!(archive = %self.name, error = %err, "container is unusable");
                }
                self.set_state(LifecycleState::Closed);
                Err(err)
            }
        }
    }

    fn load(&self) -> Result<()> {
        let pool = Arc::new(self.create_pool()?);
        let mut catalog = Catalog::new();
        {
            let mut reader = pool.acquire()?;
            let mut ctx = ReadContext::new(self, &mut catalog);
            self.driver.read(&mut ctx, reader.as_dyn())?;
        }
        self.driver.process(&mut catalog)?;

        let duplicates = catalog.duplicates();
        if !duplicates.is_empty() {
            tracing::debug!(
                archive = %self.name,
                paths = duplicates.len(),
                "catalog has duplicate paths"
            );
        }

        *self.catalog.write() = catalog;
        *self.pool.write() = Some(pool);
        Ok(())
    }

    fn create_pool(&self) -> Result<ReaderPool> {
        match &self.source {
            ArchiveSource::File(path) => ReaderPool::open(path, self.driver.pool_policy())
                .ok_or_else(|| ArchiveError::not_found(path.display().to_string())),
            ArchiveSource::Bytes(bytes) => Ok(ReaderPool::bound(
                self.name.clone(),
                Box::new(Cursor::new(Arc::clone(bytes))),
            )),
            ArchiveSource::Listing(listing) => Ok(ReaderPool::bound(
                listing.root.display().to_string(),
                Box::new(Cursor::new(Vec::<u8>::new())),
            )),
        }
    }

    /// Closes the container, releasing the pool and every nested container.
    ///
    /// Closing a closed container does nothing.
    pub fn close(&self) {
        let _transition = self.transition.lock();
        if self.state() == LifecycleState::Closed {
            return;
        }
        self.set_state(LifecycleState::Closing);

        let entries = self.catalog.write().take_entries();
        let mut nested = 0usize;
        for entry in &entries {
            if let Some(child) = entry.take_nested() {
                child.close();
                nested += 1;
            }
        }
        *self.pool.write() = None;

        self.set_state(LifecycleState::Closed);
        tracing::debug!(archive = %self.name, nested, "container closed");
    }

    /// Snapshot of the catalog in order.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the container is opened.
    pub fn entries(&self) -> Result<Vec<Arc<CatalogEntry>>> {
        self.ensure_opened()?;
        Ok(self.catalog.read().entries().to_vec())
    }

    /// Number of catalog entries; zero while closed.
    pub fn len(&self) -> usize {
        self.catalog.read().len()
    }

    /// Returns `true` if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.catalog.read().is_empty()
    }

    /// Paths occurring more than once, with their counts.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the container is opened.
    pub fn duplicates(&self) -> Result<Vec<(String, usize)>> {
        self.ensure_opened()?;
        Ok(self.catalog.read().duplicates())
    }

    fn resolve(self: &Arc<Self>, key: &EntryKey) -> Result<(Arc<Self>, Arc<CatalogEntry>)> {
        self.ensure_opened()?;
        if let EntryKey::Path(path) = key
            && let Some((head, rest)) = split_nested(path)
        {
            let entry = self.catalog.read().resolve_one(&EntryKey::from(head))?;
            let Some(child) = self.nested(&entry)? else {
                return Err(ArchiveError::not_found(path.clone()));
            };
            tracing::debug!(
                archive = %self.name,
                entry = entry.path(),
                rest,
                "crossing into nested container"
            );
            return child.resolve(&EntryKey::from(rest));
        }
        let entry = self.catalog.read().resolve_one(key)?;
        Ok((Arc::clone(self), entry))
    }

    /// Returns `true` if at least one entry matches `key`.
    ///
    /// Duplicate paths count as present. Nested paths are followed; a
    /// closed container contains nothing.
    pub fn contains(self: &Arc<Self>, key: impl Into<EntryKey>) -> bool {
        if !self.is_opened() {
            return false;
        }
        let key = key.into();
        if let EntryKey::Path(path) = &key
            && let Some((head, rest)) = split_nested(path)
        {
            let Ok(entry) = self.catalog.read().resolve_one(&EntryKey::from(head)) else {
                return false;
            };
            return matches!(self.nested(&entry), Ok(Some(child)) if child.contains(rest));
        }
        self.catalog.read().contains(&key)
    }

    /// Resolves `key` to its owning container and entry.
    ///
    /// A path with a `:` is split at the first one: the left part must
    /// resolve to exactly one entry that is a container, and the rest is
    /// resolved inside it.
    ///
    /// # Errors
    ///
    /// `NotFound` for no match, `Ambiguous` for several, `InvalidState`
    /// unless opened, and any error opening a nested container.
    pub fn get_entry(
        self: &Arc<Self>,
        key: impl Into<EntryKey>,
    ) -> Result<(Arc<Self>, Arc<CatalogEntry>)> {
        self.resolve(&key.into())
    }

    /// Like [`Archive::get_entry`], with misses and ambiguities as `None`.
    ///
    /// # Errors
    ///
    /// Every error other than `NotFound` and `Ambiguous`.
    pub fn find_entry(
        self: &Arc<Self>,
        key: impl Into<EntryKey>,
    ) -> Result<Option<(Arc<Self>, Arc<CatalogEntry>)>> {
        lookup_miss_to_none(self.get_entry(key))
    }

    /// Resolves `key` and materializes its bytes.
    ///
    /// # Errors
    ///
    /// Lookup errors as for [`Archive::get_entry`], plus driver errors.
    pub fn get_data(
        self: &Arc<Self>,
        key: impl Into<EntryKey>,
        option: FileOption,
    ) -> Result<Vec<u8>> {
        let (owner, entry) = self.resolve(&key.into())?;
        owner.entry_data(&entry, option)
    }

    /// Like [`Archive::get_data`], with misses and ambiguities as `None`.
    ///
    /// # Errors
    ///
    /// Every error other than `NotFound` and `Ambiguous`.
    pub fn find_data(
        self: &Arc<Self>,
        key: impl Into<EntryKey>,
        option: FileOption,
    ) -> Result<Option<Vec<u8>>> {
        let Some((owner, entry)) = self.find_entry(key)? else {
            return Ok(None);
        };
        owner.entry_data(&entry, option).map(Some)
    }

    /// Resolves `key` and materializes it as a typed object.
    ///
    /// Falls back to raw bytes when no factory is registered for the entry.
    ///
    /// # Errors
    ///
    /// Lookup and driver errors, factory errors, and
    /// `DriverContractViolation` when a binary or stream object was asked
    /// for and the factory built an object without that capability.
    pub fn get_object(
        self: &Arc<Self>,
        key: impl Into<EntryKey>,
        option: FileOption,
    ) -> Result<Materialized> {
        let (owner, entry) = self.resolve(&key.into())?;
        owner.entry_object(&entry, option)
    }

    /// Like [`Archive::get_object`], with misses and ambiguities as `None`.
    ///
    /// # Errors
    ///
    /// Every error other than `NotFound` and `Ambiguous`.
    pub fn find_object(
        self: &Arc<Self>,
        key: impl Into<EntryKey>,
        option: FileOption,
    ) -> Result<Option<Materialized>> {
        let Some((owner, entry)) = self.find_entry(key)? else {
            return Ok(None);
        };
        owner.entry_object(&entry, option).map(Some)
    }

    /// Materializes `key` and downcasts the object to `T`.
    ///
    /// # Errors
    ///
    /// `Unsupported` if no factory is registered for the entry's extension
    /// under the owner's engine, `TypeMismatch` if the object is another
    /// type.
    pub fn get_object_as<T: Any>(
        self: &Arc<Self>,
        key: impl Into<EntryKey>,
        option: FileOption,
    ) -> Result<Box<T>> {
        let (owner, entry) = self.resolve(&key.into())?;
        match owner.entry_object(&entry, option)? {
            Materialized::Object(object) => {
                object.into_any().downcast::<T>().map_err(|_| ArchiveError::TypeMismatch {
                    expected: std::any::type_name::<T>(),
                })
            }
            Materialized::Bytes(_) => Err(ArchiveError::Unsupported {
                engine: owner.game.engine.clone(),
                extension: extension_of(entry.path()),
            }),
        }
    }

    /// Resolves `key` and materializes one of its physical parts.
    ///
    /// # Errors
    ///
    /// `NotFound` if the entry has no part at `index`.
    pub fn read_part(
        self: &Arc<Self>,
        key: impl Into<EntryKey>,
        index: usize,
    ) -> Result<Vec<u8>> {
        let (owner, entry) = self.resolve(&key.into())?;
        owner.entry_part(&entry, index)
    }

    /// Materializes the bytes of an entry of this container.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless opened, plus driver errors.
    pub fn entry_data(&self, entry: &CatalogEntry, option: FileOption) -> Result<Vec<u8>> {
        self.ensure_opened()?;
        let pool = self.current_pool()?;
        let mut reader = pool.acquire()?;
        let ctx = DataContext::new(self, option);
        self.driver.read_data(&ctx, reader.as_dyn(), entry)
    }

    /// Materializes part `index` of an entry of this container.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing part, plus driver errors.
    pub fn entry_part(&self, entry: &CatalogEntry, index: usize) -> Result<Vec<u8>> {
        self.ensure_opened()?;
        let part = entry
            .parts()
            .get(index)
            .ok_or_else(|| ArchiveError::not_found(format!("{}#part{index}", entry.path())))?;
        let pool = self.current_pool()?;
        let mut reader = pool.acquire()?;
        let ctx = DataContext::new(self, self.option);
        self.driver.read_part(&ctx, reader.as_dyn(), entry, part)
    }

    /// Materializes an entry of this container as a typed object.
    ///
    /// The factory is looked up once per entry and cached on it.
    ///
    /// # Errors
    ///
    /// As for [`Archive::get_object`].
    pub fn entry_object(&self, entry: &CatalogEntry, option: FileOption) -> Result<Materialized> {
        let materializer = entry.materializer_or_init(|| Materializer {
            option,
            factory: self
                .context
                .factories()
                .resolve(&self.game.engine, &extension_of(entry.path())),
        });
        let bytes = self.entry_data(entry, option)?;

        if option.contains(FileOption::UNKNOWN_FILE_MODEL) {
            let file = UnknownFile::new(entry.path(), bytes);
            return Ok(Materialized::Object(Box::new(file)));
        }
        let Some(factory) = &materializer.factory else {
            tracing::debug!(
                archive = %self.name,
                entry = entry.path(),
                "no object factory, returning raw bytes"
            );
            return Ok(Materialized::Bytes(bytes));
        };

        let ctx = DataContext::new(self, option);
        let object = factory.create(&ctx, entry, bytes)?;
        check_capabilities(object.as_ref(), option, factory.name(), entry.path())?;
        Ok(Materialized::Object(object))
    }

    /// Returns the nested container for `entry`, instantiating and opening
    /// it on first use.
    ///
    /// `None` if the entry's extension is not a registered container format
    /// for this game. The nested container is owned by the entry and
    /// released when this container closes.
    ///
    /// # Errors
    ///
    /// Any error building or opening the nested container.
    pub fn nested(self: &Arc<Self>, entry: &CatalogEntry) -> Result<Option<Arc<Self>>> {
        self.ensure_opened()?;
        let extension = extension_of(entry.path());
        if !self.context.drivers().is_container(&self.game.engine, &extension) {
            return Ok(None);
        }
        entry.nested_or_try_init(|| {
            let ctx = DataContext::new(self, self.option);
            let child = match self.driver.nested_source(&ctx, entry) {
                Some(path) => self.child_builder(entry).file(path).name(entry.path()).build()?,
                None => Self::sub(self, entry)?,
            };
            child.open()?;
            tracing::debug!(
                archive = %self.name,
                nested = child.name(),
                "nested container opened"
            );
            Ok(Some(child))
        })
    }

    fn current_pool(&self) -> Result<Arc<ReaderPool>> {
        self.pool
            .read()
            .clone()
            .ok_or_else(|| ArchiveError::not_found(self.name.clone()))
    }
}

fn check_capabilities(
    object: &dyn ArchiveObject,
    option: FileOption,
    factory: &str,
    path: &str,
) -> Result<()> {
    let missing = if option.contains(FileOption::STREAM_OBJECT) && object.as_stream().is_none() {
        Some("stream")
    } else if option.contains(FileOption::BINARY_OBJECT) && object.as_binary().is_none() {
        Some("binary")
    } else {
        None
    };
    match missing {
        Some(capability) => Err(ArchiveError::DriverContractViolation {
            reason: format!(
                "factory '{factory}' built a {} for {path} without {capability} capability",
                object.kind()
            ),
        }),
        None => Ok(()),
    }
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("name", &self.name)
            .field("backing", &self.backing_path())
            .field("game", &self.game.id)
            .field("driver", &self.driver.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Archive`] containers.
///
/// # Examples
///
/// ```no_run
/// use gamepak_core::{ArchiveBuilder, ArchiveContext, FileOption};
/// use std::sync::Arc;
///
/// # fn main() -> gamepak_core::Result<()> {
/// let archive = ArchiveBuilder::new(Arc::new(ArchiveContext::default()))
///     .file("id1/pak0.pak")
///     .option(FileOption::SUPPRESS)
///     .build()?;
/// archive.open()?;
/// # Ok(())
/// # }
/// ```
pub struct ArchiveBuilder {
    context: Arc<ArchiveContext>,
    name: Option<String>,
    source: Option<ArchiveSource>,
    game: Option<Game>,
    driver: Option<Arc<dyn FormatDriver>>,
    tag: Option<EntryTag>,
    option: FileOption,
}

impl ArchiveBuilder {
    /// Creates a builder in `context`.
    #[must_use]
    pub fn new(context: Arc<ArchiveContext>) -> Self {
        Self {
            context,
            name: None,
            source: None,
            game: None,
            driver: None,
            tag: None,
            option: FileOption::DEFAULT,
        }
    }

    /// Backs the container with a file.
    #[must_use]
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source = Some(ArchiveSource::File(path.as_ref().to_path_buf()));
        self
    }

    /// Backs the container with in-memory bytes.
    #[must_use]
    pub fn bytes(mut self, name: &str, bytes: Vec<u8>) -> Self {
        self.name = Some(name.to_string());
        self.source = Some(ArchiveSource::Bytes(bytes.into()));
        self
    }

    /// Backs the container with a file list; the listing driver is used
    /// unless another driver is set.
    #[must_use]
    pub fn listing(mut self, name: &str, listing: Listing) -> Self {
        self.name = Some(name.to_string());
        self.source = Some(ArchiveSource::Listing(listing));
        self
    }

    /// Overrides the container name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Selects the game; defaults to the context's default game.
    #[must_use]
    pub fn game(mut self, game: Game) -> Self {
        self.game = Some(game);
        self
    }

    /// Selects the driver; defaults to the registry's choice for the name.
    #[must_use]
    pub fn driver(mut self, driver: Arc<dyn FormatDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Attaches a tag the driver can read while opening.
    #[must_use]
    pub fn tag<T: Any + Send + Sync>(mut self, tag: T) -> Self {
        self.tag = Some(Arc::new(tag));
        self
    }

    /// Sets the option the driver sees while opening.
    #[must_use]
    pub fn option(mut self, option: FileOption) -> Self {
        self.option = option;
        self
    }

    /// Builds the container, closed.
    ///
    /// # Errors
    ///
    /// `Config` if no source was set.
    pub fn build(self) -> Result<Arc<Archive>> {
        let source = self
            .source
            .ok_or_else(|| ArchiveError::Config("archive source not set".to_string()))?;
        let name = match (self.name, &source) {
            (Some(name), _) => name,
            (None, ArchiveSource::File(path)) => file_name_of(&path.to_string_lossy()).to_string(),
            (None, _) => String::from("memory"),
        };
        let game = self
            .game
            .unwrap_or_else(|| self.context.default_game().clone());
        let driver = match (self.driver, &source) {
            (Some(driver), _) => driver,
            (None, ArchiveSource::Listing(_)) => Arc::new(ListingDriver),
            (None, _) => self
                .context
                .drivers()
                .resolve(&game.engine, &extension_of(&name)),
        };

        Ok(Arc::new(Archive {
            name,
            source,
            context: self.context,
            game,
            driver,
            tag: self.tag,
            option: self.option,
            state: Mutex::new(LifecycleState::Closed),
            unusable: AtomicBool::new(false),
            transition: Mutex::new(()),
            catalog: RwLock::new(Catalog::new()),
            pool: RwLock::new(None),
        }))
    }
}
