//! Fixture builders for container tests.
//!
//! Containers are built in memory with the `tar` and `zip` writers and, when
//! a test needs a backing file, written below a temporary directory.
//!
//! # Panics
//!
//! Every helper panics on I/O errors; they exist for tests only.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Builds an in-memory tar container from `(path, content)` pairs.
///
/// # Examples
///
/// ```
/// use gamepak_core::test_utils::create_test_tar;
///
/// let tar = create_test_tar(vec![("maps/e1m1.bsp", b"BSP29"), ("readme.txt", b"hi")]);
/// assert_eq!(tar.len() % 512, 0);
/// ```
#[must_use]
pub fn create_test_tar(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    entries
        .into_iter()
        .fold(TarTestBuilder::new(), |builder, (path, data)| {
            builder.add_file(path, data)
        })
        .build()
}

/// Builds an in-memory zip container with stored members.
#[must_use]
pub fn create_test_zip(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    entries
        .into_iter()
        .fold(ZipTestBuilder::new(), |builder, (path, data)| {
            builder.add_file(path, data)
        })
        .build()
}

/// Writes `bytes` to `root/relative`, creating parent directories.
pub fn write_fixture(root: &Path, relative: &str, bytes: &[u8]) -> PathBuf {
    let path = relative
        .split('/')
        .fold(root.to_path_buf(), |path, segment| path.join(segment));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, bytes).unwrap();
    path
}

/// A tar container holding `readme.txt` and `sub.tar`, which itself holds
/// `inner/file.txt` and `inner/other.txt`.
#[must_use]
pub fn nested_tar_fixture() -> Vec<u8> {
    let inner = create_test_tar(vec![
        ("inner/file.txt", b"nested payload"),
        ("inner/other.txt", b"second"),
    ]);
    TarTestBuilder::new()
        .add_file("readme.txt", b"top level")
        .add_file("sub.tar", &inner)
        .build()
}

/// Builder for tar fixtures with directories and links.
///
/// # Examples
///
/// ```
/// use gamepak_core::test_utils::TarTestBuilder;
///
/// let tar = TarTestBuilder::new()
///     .add_directory("textures/")
///     .add_file("textures/wall.dds", b"DDS ")
///     .add_symlink("textures/alias.dds", "wall.dds")
///     .build();
/// assert!(!tar.is_empty());
/// ```
pub struct TarTestBuilder {
    builder: tar::Builder<Vec<u8>>,
}

impl TarTestBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    fn append(
        mut self,
        path: &str,
        entry_type: tar::EntryType,
        data: &[u8],
        link: Option<&str>,
    ) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(if entry_type.is_dir() { 0o755 } else { 0o644 });
        header.set_entry_type(entry_type);
        if let Some(target) = link {
            header.set_link_name(target).unwrap();
        }
        header.set_cksum();
        self.builder.append_data(&mut header, path, data).unwrap();
        self
    }

    /// Adds a regular member.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.append(path, tar::EntryType::Regular, data, None)
    }

    /// Adds a directory member.
    #[must_use]
    pub fn add_directory(self, path: &str) -> Self {
        self.append(path, tar::EntryType::Directory, &[], None)
    }

    /// Adds a symbolic link member.
    #[must_use]
    pub fn add_symlink(self, path: &str, target: &str) -> Self {
        self.append(path, tar::EntryType::Symlink, &[], Some(target))
    }

    /// Finishes the container.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }
}

impl Default for TarTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for zip fixtures with stored and deflated members.
pub struct ZipTestBuilder {
    zip: zip::ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipTestBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zip: zip::ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    fn append(mut self, path: &str, method: CompressionMethod, data: &[u8]) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(method)
            .unix_permissions(0o644);
        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a stored member.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.append(path, CompressionMethod::Stored, data)
    }

    /// Adds a deflated member.
    #[must_use]
    pub fn add_deflated(self, path: &str, data: &[u8]) -> Self {
        self.append(path, CompressionMethod::Deflated, data)
    }

    /// Adds a directory member.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        let options = SimpleFileOptions::default().unix_permissions(0o755);
        self.zip.add_directory(path, options).unwrap();
        self
    }

    /// Finishes the container.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.zip.finish().unwrap().into_inner()
    }
}

impl Default for ZipTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
