//! Validated export destination.

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveError;
use crate::Result;

/// A created, canonical export root.
///
/// Entry paths come from container directories and are untrusted; every
/// destination is built through [`DestRoot::join_entry`], which refuses
/// anything that would land outside the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestRoot(PathBuf);

impl DestRoot {
    /// Creates the directory if needed and canonicalizes it.
    ///
    /// # Errors
    ///
    /// I/O errors creating or resolving the directory.
    pub fn create(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        Ok(Self(path.canonicalize()?))
    }

    /// The canonical root.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Joins a `/`-separated relative path below the root.
    ///
    /// # Errors
    ///
    /// `PathTraversal` for `..`, absolute or prefixed components, NUL bytes
    /// or an empty result.
    pub fn join_entry(&self, relative: &str) -> Result<PathBuf> {
        let traversal = || ArchiveError::PathTraversal {
            path: PathBuf::from(relative),
        };
        if relative.contains('\0') {
            return Err(traversal());
        }

        let mut joined = self.0.clone();
        let mut depth = 0usize;
        for segment in relative.split(['/', '\\']) {
            if segment.is_empty() {
                continue;
            }
            match Path::new(segment).components().next() {
                Some(Component::Normal(_)) => {
                    joined.push(segment);
                    depth += 1;
                }
                Some(Component::CurDir) => {}
                _ => return Err(traversal()),
            }
        }

        if depth == 0 || !joined.starts_with(&self.0) {
            return Err(traversal());
        }
        Ok(joined)
    }

    /// Creates the missing directories between the root and `target`'s
    /// parent, returning how many were created.
    ///
    /// # Errors
    ///
    /// I/O errors other than a directory created concurrently.
    pub fn ensure_parent(&self, target: &Path) -> Result<usize> {
        let Some(parent) = target.parent() else {
            return Ok(0);
        };
        let mut missing = Vec::new();
        let mut current = parent;
        while current != self.0 && current.starts_with(&self.0) && !current.is_dir() {
            missing.push(current);
            match current.parent() {
                Some(next) => current = next,
                None => break,
            }
        }

        let mut created = 0;
        for dir in missing.into_iter().rev() {
            match std::fs::create_dir(dir) {
                Ok(()) => created += 1,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(created)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_join_entry() {
        let temp = TempDir::new().unwrap();
        let root = DestRoot::create(temp.path()).unwrap();
        let path = root.join_entry("maps/./e1m1.bsp").unwrap();
        assert_eq!(path, root.as_path().join("maps").join("e1m1.bsp"));
    }

    #[test]
    fn test_join_entry_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let root = DestRoot::create(temp.path()).unwrap();
        for bad in ["../escape.txt", "maps/../../x", "..\\x", "", "./", "a\0b"] {
            assert!(
                matches!(root.join_entry(bad), Err(ArchiveError::PathTraversal { .. })),
                "{bad:?} was accepted"
            );
        }
    }

    #[test]
    fn test_ensure_parent_counts_created() {
        let temp = TempDir::new().unwrap();
        let root = DestRoot::create(&temp.path().join("out")).unwrap();
        let target = root.join_entry("a/b/c.txt").unwrap();
        assert_eq!(root.ensure_parent(&target).unwrap(), 2);
        assert_eq!(root.ensure_parent(&target).unwrap(), 0);
        assert!(root.as_path().join("a/b").is_dir());
    }
}
