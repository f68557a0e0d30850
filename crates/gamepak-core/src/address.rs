//! Entry keys, path normalization and container addresses.
//!
//! Entries are addressed by a `/`-separated logical path or by a numeric id.
//! A single `:` inside a path string crosses into a nested container:
//! `"sub.pak:inner/file.txt"` resolves `sub.pak` first and forwards
//! `inner/file.txt` to the container it becomes.
//!
//! Containers themselves are addressed as `scheme:/containerPath#contextId`,
//! see [`ArchiveUri`].

use std::fmt;
use std::str::FromStr;

use crate::ArchiveError;

/// Scheme assumed for addresses written as a bare filesystem path.
pub const DEFAULT_SCHEME: &str = "file";

/// Normalizes a logical entry path.
///
/// Backslashes become `/`, repeated separators collapse, `.` segments and
/// leading or trailing separators are dropped. Case is preserved.
///
/// # Examples
///
/// ```
/// use gamepak_core::address::normalize_path;
///
/// assert_eq!(normalize_path("\\Data//textures/./a.dds/"), "Data/textures/a.dds");
/// assert_eq!(normalize_path("/"), "");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    for segment in path.split(['/', '\\']) {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if !normalized.is_empty() {
            normalized.push('/');
        }
        normalized.push_str(segment);
    }
    normalized
}

/// Splits a path at the first cross-container delimiter.
///
/// Returns `None` when the path does not cross a container boundary.
///
/// # Examples
///
/// ```
/// use gamepak_core::address::split_nested;
///
/// assert_eq!(split_nested("sub.pak:inner/a.txt"), Some(("sub.pak", "inner/a.txt")));
/// assert_eq!(split_nested("a:b:c"), Some(("a", "b:c")));
/// assert_eq!(split_nested("plain/path"), None);
/// ```
#[must_use]
pub fn split_nested(path: &str) -> Option<(&str, &str)> {
    path.split_once(':')
}

/// Returns the lower-cased extension of a logical path, without the dot.
///
/// The extension is taken from the last segment only.
#[must_use]
pub fn extension_of(path: &str) -> String {
    let name = file_name_of(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Returns the last segment of a logical path.
#[must_use]
pub fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Key used to look up catalog entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    /// Normalized logical path, possibly containing a nested delimiter.
    Path(String),
    /// Numeric id; only meaningful when the driver indexes ids.
    Id(u64),
}

impl From<&str> for EntryKey {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for EntryKey {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<&String> for EntryKey {
    fn from(path: &String) -> Self {
        Self::Path(path.clone())
    }
}

impl From<u64> for EntryKey {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path),
            Self::Id(id) => write!(f, "#{id}"),
        }
    }
}

/// A parsed container address: `scheme:/containerPath#contextId`.
///
/// `scheme` selects a family of games, `container_path` the backing
/// location and `context_id` the game/edition whose drivers and factories
/// apply. A string without a scheme is a bare path in [`DEFAULT_SCHEME`].
///
/// # Examples
///
/// ```
/// use gamepak_core::ArchiveUri;
///
/// let uri: ArchiveUri = "quake:/id1/pak0.pak#quake1".parse().unwrap();
/// assert_eq!(uri.scheme, "quake");
/// assert_eq!(uri.container_path, "/id1/pak0.pak");
/// assert_eq!(uri.context_id.as_deref(), Some("quake1"));
///
/// let bare: ArchiveUri = "data/assets.zip".parse().unwrap();
/// assert_eq!(bare.scheme, "file");
/// assert_eq!(bare.context_id, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveUri {
    /// Family selector.
    pub scheme: String,
    /// Backing location, relative to the family root when it has one.
    pub container_path: String,
    /// Game/edition selector; `None` picks the family default.
    pub context_id: Option<String>,
}

impl FromStr for ArchiveUri {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (body, context_id) = match s.rsplit_once('#') {
            Some((body, ctx)) if !ctx.is_empty() => (body, Some(ctx.to_string())),
            Some((body, _)) => (body, None),
            None => (s, None),
        };

        // A one-letter prefix is a drive letter, not a scheme.
        let (scheme, container_path) = match body.split_once(':') {
            Some((scheme, rest))
                if scheme.len() > 1
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') =>
            {
                (scheme.to_ascii_lowercase(), rest)
            }
            _ => (DEFAULT_SCHEME.to_string(), body),
        };

        if container_path.is_empty() {
            return Err(ArchiveError::InvalidAddress(format!(
                "missing container path in '{s}'"
            )));
        }

        Ok(Self {
            scheme,
            container_path: container_path.to_string(),
            context_id,
        })
    }
}

impl fmt::Display for ArchiveUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.container_path)?;
        if let Some(ctx) = &self.context_id {
            write!(f, "#{ctx}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("a/b/c.txt"), "a/b/c.txt");
        assert_eq!(normalize_path("a\\b\\c.txt"), "a/b/c.txt");
        assert_eq!(normalize_path("//a///b//"), "a/b");
        assert_eq!(normalize_path("./a/./b"), "a/b");
        assert_eq!(normalize_path(""), "");
        assert_eq!(normalize_path("Textures/A.DDS"), "Textures/A.DDS");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("maps/e1m1.BSP"), "bsp");
        assert_eq!(extension_of("data.tar"), "tar");
        assert_eq!(extension_of("dir.v2/readme"), "");
        assert_eq!(extension_of(".hidden"), "");
    }

    #[test]
    fn test_file_name_of() {
        assert_eq!(file_name_of("a/b/c.txt"), "c.txt");
        assert_eq!(file_name_of("c.txt"), "c.txt");
    }

    #[test]
    fn test_entry_key_from() {
        assert_eq!(EntryKey::from("a.txt"), EntryKey::Path("a.txt".into()));
        assert_eq!(EntryKey::from(42u64), EntryKey::Id(42));
        assert_eq!(EntryKey::Id(42).to_string(), "#42");
    }

    #[test]
    fn test_uri_windows_drive_is_bare_path() {
        let uri: ArchiveUri = "C:/games/data.pak".parse().unwrap();
        assert_eq!(uri.scheme, DEFAULT_SCHEME);
        assert_eq!(uri.container_path, "C:/games/data.pak");
    }

    #[test]
    fn test_uri_display_round_trip() {
        let uri: ArchiveUri = "doom:/base/doom.wad#doom2".parse().unwrap();
        assert_eq!(uri.to_string(), "doom:/base/doom.wad#doom2");
    }

    #[test]
    fn test_uri_empty_path_rejected() {
        assert!(matches!(
            "quake:#q1".parse::<ArchiveUri>(),
            Err(ArchiveError::InvalidAddress(_))
        ));
        assert!("".parse::<ArchiveUri>().is_err());
    }
}
