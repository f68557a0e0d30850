//! Multi containers: sibling archives under one logical root.

use std::path::Path;
use std::sync::Arc;

use crate::Archive;
use crate::ArchiveError;
use crate::ExportConfig;
use crate::ExportProgress;
use crate::ExportReport;
use crate::FileOption;
use crate::Result;
use crate::address::EntryKey;
use crate::address::normalize_path;
use crate::catalog::CatalogEntry;
use crate::error::lookup_miss_to_none;
use crate::factory::Materialized;

/// Several independently openable archives addressed as one.
///
/// A path `member/inner/path` selects members named `member` and resolves
/// `inner/path` in each. When no member carries the leading segment, the
/// whole path is tried in every member. Members open on first use.
#[derive(Debug)]
pub struct MultiArchive {
    name: String,
    members: Vec<Arc<Archive>>,
}

impl MultiArchive {
    /// Groups `members` under `name`.
    #[must_use]
    pub fn new(name: &str, members: Vec<Arc<Archive>>) -> Self {
        Self {
            name: name.to_string(),
            members,
        }
    }

    /// Logical root name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member containers in order.
    #[must_use]
    pub fn members(&self) -> &[Arc<Archive>] {
        &self.members
    }

    /// Opens every member.
    ///
    /// # Errors
    ///
    /// The first member error; members after it are still attempted.
    pub fn open(&self) -> Result<()> {
        let mut first_error = None;
        for member in &self.members {
            if let Err(e) = member.open() {
                tracing::warn!(
                    multi = %self.name,
                    member = member.name(),
                    error = %e,
                    "member failed to open"
                );
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Closes every member.
    pub fn close(&self) {
        for member in &self.members {
            member.close();
        }
    }

    /// Returns `true` if every member is opened.
    #[must_use]
    pub fn is_opened(&self) -> bool {
        self.members.iter().all(|member| member.is_opened())
    }

    /// Total number of entries over the opened members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.iter().map(|member| member.len()).sum()
    }

    /// Returns `true` if no opened member has entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn candidates(&self, key: &EntryKey) -> (Vec<&Arc<Archive>>, EntryKey) {
        if let EntryKey::Path(path) = key {
            let path = normalize_path(path);
            if let Some((head, rest)) = path.split_once('/') {
                let named: Vec<&Arc<Archive>> =
                    self.members.iter().filter(|m| m.name() == head).collect();
                if !named.is_empty() {
                    return (named, EntryKey::from(rest));
                }
            }
        }
        (self.members.iter().collect(), key.clone())
    }

    fn resolve(&self, key: &EntryKey) -> Result<(Arc<Archive>, Arc<CatalogEntry>)> {
        let (candidates, inner) = self.candidates(key);
        let mut found = Vec::new();
        let mut last_error = None;

        for member in candidates {
            match member.open().and_then(|()| member.get_entry(inner.clone())) {
                Ok(hit) => found.push(hit),
                Err(e @ ArchiveError::Ambiguous { .. }) => return Err(e),
                Err(e) if e.is_lookup_miss() => {}
                Err(e) => {
                    tracing::debug!(
                        multi = %self.name,
                        member = member.name(),
                        error = %e,
                        "member skipped"
                    );
                    last_error = Some(e);
                }
            }
        }

        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err(last_error.unwrap_or_else(|| ArchiveError::not_found(key.to_string()))),
            count => Err(ArchiveError::Ambiguous {
                path: key.to_string(),
                count,
            }),
        }
    }

    /// Returns `true` if at least one member resolves `key`.
    pub fn contains(&self, key: impl Into<EntryKey>) -> bool {
        let key = key.into();
        match self.resolve(&key) {
            Ok(_) | Err(ArchiveError::Ambiguous { .. }) => true,
            Err(_) => false,
        }
    }

    /// Resolves `key` to its owning archive and entry.
    ///
    /// # Errors
    ///
    /// `NotFound` if no member resolves the key, `Ambiguous` if several do.
    pub fn get_entry(
        &self,
        key: impl Into<EntryKey>,
    ) -> Result<(Arc<Archive>, Arc<CatalogEntry>)> {
        self.resolve(&key.into())
    }

    /// Like [`MultiArchive::get_entry`], with misses as `None`.
    ///
    /// # Errors
    ///
    /// Every error other than `NotFound` and `Ambiguous`.
    pub fn find_entry(
        &self,
        key: impl Into<EntryKey>,
    ) -> Result<Option<(Arc<Archive>, Arc<CatalogEntry>)>> {
        lookup_miss_to_none(self.get_entry(key))
    }

    /// Resolves `key` and materializes its bytes.
    ///
    /// # Errors
    ///
    /// Lookup errors plus driver errors.
    pub fn get_data(&self, key: impl Into<EntryKey>, option: FileOption) -> Result<Vec<u8>> {
        let (owner, entry) = self.get_entry(key)?;
        owner.entry_data(&entry, option)
    }

    /// Like [`MultiArchive::get_data`], with misses as `None`.
    ///
    /// # Errors
    ///
    /// Every error other than `NotFound` and `Ambiguous`.
    pub fn find_data(
        &self,
        key: impl Into<EntryKey>,
        option: FileOption,
    ) -> Result<Option<Vec<u8>>> {
        let Some((owner, entry)) = self.find_entry(key)? else {
            return Ok(None);
        };
        owner.entry_data(&entry, option).map(Some)
    }

    /// Resolves `key` and materializes it as an object, or bytes when no
    /// factory is registered.
    ///
    /// # Errors
    ///
    /// Lookup, driver and factory errors.
    pub fn get_object(
        &self,
        key: impl Into<EntryKey>,
        option: FileOption,
    ) -> Result<Materialized> {
        let (owner, entry) = self.get_entry(key)?;
        owner.entry_object(&entry, option)
    }

    /// Like [`MultiArchive::get_object`], with misses as `None`.
    ///
    /// # Errors
    ///
    /// Every error other than `NotFound` and `Ambiguous`.
    pub fn find_object(
        &self,
        key: impl Into<EntryKey>,
        option: FileOption,
    ) -> Result<Option<Materialized>> {
        let Some((owner, entry)) = self.find_entry(key)? else {
            return Ok(None);
        };
        owner.entry_object(&entry, option).map(Some)
    }

    /// Exports every member below `dest/<member name>`.
    ///
    /// # Errors
    ///
    /// As for [`crate::export::export_multi`].
    pub fn export(
        &self,
        dest: &Path,
        config: &ExportConfig,
        progress: &dyn ExportProgress,
    ) -> Result<ExportReport> {
        crate::export::export_multi(self, dest, config, progress)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ArchiveBuilder;
    use crate::ArchiveContext;
    use crate::test_utils::create_test_tar;

    fn member(
        context: &Arc<ArchiveContext>,
        name: &str,
        files: Vec<(&str, &[u8])>,
    ) -> Arc<Archive> {
        ArchiveBuilder::new(Arc::clone(context))
            .bytes(name, create_test_tar(files))
            .build()
            .unwrap()
    }

    fn fixture() -> MultiArchive {
        let context = Arc::new(ArchiveContext::default());
        MultiArchive::new(
            "pak*.tar",
            vec![
                member(
                    &context,
                    "pak0.tar",
                    vec![("maps/e1m1.bsp", b"one"), ("readme.txt", b"0")],
                ),
                member(
                    &context,
                    "pak1.tar",
                    vec![("maps/e1m2.bsp", b"two"), ("readme.txt", b"1")],
                ),
            ],
        )
    }

    #[test]
    fn test_members_open_lazily() {
        let multi = fixture();
        assert!(!multi.is_opened());
        let data = multi.get_data("pak1.tar/maps/e1m2.bsp", FileOption::DEFAULT);
        assert_eq!(data.unwrap(), b"two");
        assert!(multi.members()[1].is_opened());
        assert!(!multi.members()[0].is_opened());
    }

    #[test]
    fn test_unprefixed_path_searches_all_members() {
        let multi = fixture();
        let (owner, entry) = multi.get_entry("maps/e1m1.bsp").unwrap();
        assert_eq!(owner.name(), "pak0.tar");
        assert_eq!(entry.size(), 3);
    }

    #[test]
    fn test_ambiguous_across_members() {
        let multi = fixture();
        assert!(matches!(
            multi.get_entry("readme.txt"),
            Err(ArchiveError::Ambiguous { count: 2, .. })
        ));
        assert!(multi.find_entry("readme.txt").unwrap().is_none());
        assert!(multi.contains("readme.txt"));
        let data = multi.get_data("pak0.tar/readme.txt", FileOption::DEFAULT);
        assert_eq!(data.unwrap(), b"0");
    }

    #[test]
    fn test_missing_and_close() {
        let multi = fixture();
        assert!(matches!(multi.get_entry("nope.txt"), Err(ArchiveError::NotFound { .. })));
        assert!(multi.find_data("nope.txt", FileOption::DEFAULT).unwrap().is_none());

        multi.open().unwrap();
        assert!(multi.is_opened());
        assert_eq!(multi.len(), 4);
        multi.close();
        assert!(!multi.is_opened());
        assert!(multi.is_empty());
    }
}
