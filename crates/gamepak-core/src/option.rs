//! Materialization and export flags.

use std::fmt;
use std::ops::BitOr;
use std::ops::BitOrAssign;
use std::str::FromStr;

use crate::ArchiveError;

/// Combinable flags steering `get_object` and the export pipeline.
///
/// This is a bitset, not a single-choice enum. `BINARY_OBJECT` and
/// `STREAM_OBJECT` carry the `OBJECT` bit so that either one also asks for
/// factory materialization.
///
/// # Examples
///
/// ```
/// use gamepak_core::FileOption;
///
/// let option = FileOption::RAW | FileOption::MARKER;
/// assert!(option.contains(FileOption::RAW));
/// assert!(!option.wants_object());
///
/// let parsed: FileOption = "stream,suppress".parse().unwrap();
/// assert!(parsed.contains(FileOption::OBJECT));
/// assert!(parsed.contains(FileOption::SUPPRESS));
/// ```
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileOption(u32);

impl FileOption {
    /// Raw bytes only.
    pub const DEFAULT: Self = Self(0);
    /// Export each physical part of an entry as a separate sibling file.
    pub const RAW: Self = Self(1 << 0);
    /// Emit a manifest of member containers at the export root.
    pub const MARKER: Self = Self(1 << 1);
    /// Materialize through the object factory.
    pub const OBJECT: Self = Self(1 << 2);
    /// Object must yield its underlying bytes.
    pub const BINARY_OBJECT: Self = Self(1 << 3 | 1 << 2);
    /// Object must be able to write itself to a stream.
    pub const STREAM_OBJECT: Self = Self(1 << 4 | 1 << 2);
    /// Materialize through the generic format-agnostic model.
    pub const UNKNOWN_FILE_MODEL: Self = Self(1 << 5);
    /// Escalate recoverable driver issues into hard failures.
    pub const SUPPRESS: Self = Self(1 << 6);

    const NAMES: [(&'static str, Self); 8] = [
        ("default", Self::DEFAULT),
        ("raw", Self::RAW),
        ("marker", Self::MARKER),
        ("object", Self::OBJECT),
        ("binary", Self::BINARY_OBJECT),
        ("stream", Self::STREAM_OBJECT),
        ("unknown", Self::UNKNOWN_FILE_MODEL),
        ("suppress", Self::SUPPRESS),
    ];

    /// Returns the raw bit representation.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if no flag is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns `true` if any object flavour is requested.
    #[inline]
    #[must_use]
    pub const fn wants_object(self) -> bool {
        self.contains(Self::OBJECT)
    }

    /// Returns `self` with the bits of `other` removed.
    #[inline]
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for FileOption {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FileOption {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for FileOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileOption({self})")
    }
}

impl fmt::Display for FileOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("default");
        }
        let mut first = true;
        let mut rest = *self;
        // Composite flags first so "stream" is not printed as "object,stream".
        for (name, flag) in Self::NAMES.iter().rev() {
            if flag.is_empty() || !rest.contains(*flag) {
                continue;
            }
            if !first {
                f.write_str(",")?;
            }
            f.write_str(name)?;
            first = false;
            rest = rest.without(*flag);
        }
        Ok(())
    }
}

impl FromStr for FileOption {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut option = Self::DEFAULT;
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let flag = Self::NAMES
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(token))
                .map(|(_, flag)| *flag)
                .ok_or_else(|| ArchiveError::Config(format!("unknown file option: {token}")))?;
            option |= flag;
        }
        Ok(option)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_refined_object_flags_imply_object() {
        assert!(FileOption::BINARY_OBJECT.contains(FileOption::OBJECT));
        assert!(FileOption::STREAM_OBJECT.contains(FileOption::OBJECT));
        assert!(!FileOption::OBJECT.contains(FileOption::STREAM_OBJECT));
        assert!(FileOption::STREAM_OBJECT.wants_object());
        assert!(!FileOption::UNKNOWN_FILE_MODEL.wants_object());
    }

    #[test]
    fn test_default_is_empty() {
        assert!(FileOption::default().is_empty());
        assert_eq!(FileOption::default(), FileOption::DEFAULT);
        assert!(FileOption::DEFAULT.contains(FileOption::DEFAULT));
    }

    #[test]
    fn test_parse_list() {
        let option: FileOption = "raw, Marker".parse().unwrap();
        assert_eq!(option, FileOption::RAW | FileOption::MARKER);

        let option: FileOption = "".parse().unwrap();
        assert!(option.is_empty());

        assert!("raw,bogus".parse::<FileOption>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(FileOption::DEFAULT.to_string(), "default");
        assert_eq!(FileOption::STREAM_OBJECT.to_string(), "stream");
        assert_eq!(
            (FileOption::RAW | FileOption::SUPPRESS).to_string(),
            "suppress,raw"
        );
    }
}
