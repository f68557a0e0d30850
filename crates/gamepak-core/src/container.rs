//! One front over single and multi containers.

use std::path::Path;
use std::sync::Arc;

use crate::Archive;
use crate::ExportConfig;
use crate::ExportProgress;
use crate::ExportReport;
use crate::FileOption;
use crate::Result;
use crate::address::EntryKey;
use crate::catalog::CatalogEntry;
use crate::factory::Materialized;
use crate::multi::MultiArchive;

/// A container opened from an address.
#[derive(Debug)]
pub enum Container {
    /// A single archive, including Many and Sub containers.
    Archive(Arc<Archive>),
    /// Sibling archives under one logical root.
    Multi(MultiArchive),
}

impl Container {
    /// Container name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Archive(archive) => archive.name(),
            Self::Multi(multi) => multi.name(),
        }
    }

    /// Short description of the container kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Archive(archive) if archive.is_many() => "many",
            Self::Archive(archive) if archive.is_sub() => "sub",
            Self::Archive(_) => "archive",
            Self::Multi(_) => "multi",
        }
    }

    /// The archives behind this container: itself, or the Multi members.
    #[must_use]
    pub fn archives(&self) -> Vec<Arc<Archive>> {
        match self {
            Self::Archive(archive) => vec![Arc::clone(archive)],
            Self::Multi(multi) => multi.members().to_vec(),
        }
    }

    /// Opens the container.
    ///
    /// # Errors
    ///
    /// Any error opening the archive or a member.
    pub fn open(&self) -> Result<()> {
        match self {
            Self::Archive(archive) => archive.open(),
            Self::Multi(multi) => multi.open(),
        }
    }

    /// Closes the container.
    pub fn close(&self) {
        match self {
            Self::Archive(archive) => archive.close(),
            Self::Multi(multi) => multi.close(),
        }
    }

    /// Returns `true` if the container is opened.
    #[must_use]
    pub fn is_opened(&self) -> bool {
        match self {
            Self::Archive(archive) => archive.is_opened(),
            Self::Multi(multi) => multi.is_opened(),
        }
    }

    /// Returns `true` if at least one entry matches `key`.
    pub fn contains(&self, key: impl Into<EntryKey>) -> bool {
        match self {
            Self::Archive(archive) => archive.contains(key),
            Self::Multi(multi) => multi.contains(key),
        }
    }

    /// Resolves `key` to its owning archive and entry.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Ambiguous` for lookup misses, plus open errors.
    pub fn get_entry(
        &self,
        key: impl Into<EntryKey>,
    ) -> Result<(Arc<Archive>, Arc<CatalogEntry>)> {
        match self {
            Self::Archive(archive) => archive.get_entry(key),
            Self::Multi(multi) => multi.get_entry(key),
        }
    }

    /// Like [`Container::get_entry`], with misses as `None`.
    ///
    /// # Errors
    ///
    /// Every error other than `NotFound` and `Ambiguous`.
    pub fn find_entry(
        &self,
        key: impl Into<EntryKey>,
    ) -> Result<Option<(Arc<Archive>, Arc<CatalogEntry>)>> {
        match self {
            Self::Archive(archive) => archive.find_entry(key),
            Self::Multi(multi) => multi.find_entry(key),
        }
    }

    /// Resolves `key` and materializes its bytes.
    ///
    /// # Errors
    ///
    /// Lookup and driver errors.
    pub fn get_data(&self, key: impl Into<EntryKey>, option: FileOption) -> Result<Vec<u8>> {
        match self {
            Self::Archive(archive) => archive.get_data(key, option),
            Self::Multi(multi) => multi.get_data(key, option),
        }
    }

    /// Like [`Container::get_data`], with misses as `None`.
    ///
    /// # Errors
    ///
    /// Every error other than `NotFound` and `Ambiguous`.
    pub fn find_data(
        &self,
        key: impl Into<EntryKey>,
        option: FileOption,
    ) -> Result<Option<Vec<u8>>> {
        match self {
            Self::Archive(archive) => archive.find_data(key, option),
            Self::Multi(multi) => multi.find_data(key, option),
        }
    }

    /// Resolves `key` and materializes it as an object, or bytes without a
    /// factory.
    ///
    /// # Errors
    ///
    /// Lookup, driver and factory errors.
    pub fn get_object(
        &self,
        key: impl Into<EntryKey>,
        option: FileOption,
    ) -> Result<Materialized> {
        match self {
            Self::Archive(archive) => archive.get_object(key, option),
            Self::Multi(multi) => multi.get_object(key, option),
        }
    }

    /// Like [`Container::get_object`], with misses as `None`.
    ///
    /// # Errors
    ///
    /// Every error other than `NotFound` and `Ambiguous`.
    pub fn find_object(
        &self,
        key: impl Into<EntryKey>,
        option: FileOption,
    ) -> Result<Option<Materialized>> {
        match self {
            Self::Archive(archive) => archive.find_object(key, option),
            Self::Multi(multi) => multi.find_object(key, option),
        }
    }

    /// Runs the export pipeline over the container.
    ///
    /// # Errors
    ///
    /// Errors that stop the whole run; item failures land in the report.
    pub fn export(
        &self,
        dest: &Path,
        config: &ExportConfig,
        progress: &dyn ExportProgress,
    ) -> Result<ExportReport> {
        match self {
            Self::Archive(archive) => archive.export(dest, config, progress),
            Self::Multi(multi) => multi.export(dest, config, progress),
        }
    }
}

impl From<Arc<Archive>> for Container {
    fn from(archive: Arc<Archive>) -> Self {
        Self::Archive(archive)
    }
}

impl From<MultiArchive> for Container {
    fn from(multi: MultiArchive) -> Self {
        Self::Multi(multi)
    }
}
