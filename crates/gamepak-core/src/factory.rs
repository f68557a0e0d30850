//! Object factories and the typed objects they produce.
//!
//! A factory decodes one entry's bytes into a typed object. Objects advertise
//! optional capabilities through accessor methods instead of runtime type
//! tests: [`ArchiveObject::as_binary`] for objects that can yield their
//! underlying bytes and [`ArchiveObject::as_stream`] for objects that can
//! write themselves to a stream.

use std::any::Any;
use std::fmt;
use std::fmt::Write as _;
use std::io::Write;

use crate::Result;
use crate::catalog::CatalogEntry;
use crate::driver::DataContext;

/// A decoded entry.
pub trait ArchiveObject: Send + fmt::Debug {
    /// Short description of the object kind, e.g. `"texture"`.
    fn kind(&self) -> &str;

    /// Borrowed view for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Owned view for downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;

    /// Byte-yielding capability, if the object has one.
    fn as_binary(&self) -> Option<&dyn BinaryObject> {
        None
    }

    /// Stream-writing capability, if the object has one.
    fn as_stream(&self) -> Option<&dyn StreamObject> {
        None
    }
}

/// Objects that can hand back their underlying bytes.
pub trait BinaryObject {
    /// Returns the bytes the object represents.
    ///
    /// # Errors
    ///
    /// Implementations may fail to re-encode their content.
    fn to_bytes(&self) -> Result<Vec<u8>>;
}

/// Objects that can serialize themselves.
pub trait StreamObject {
    /// Writes the object and returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Any I/O error from `out`.
    fn write_to(&self, out: &mut dyn Write) -> Result<u64>;
}

/// Decodes entry bytes into a typed object.
pub trait ObjectFactory: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Builds the object for `entry` from its materialized bytes.
    ///
    /// # Errors
    ///
    /// `Corrupt` when the bytes do not decode.
    fn create(
        &self,
        ctx: &DataContext<'_>,
        entry: &CatalogEntry,
        bytes: Vec<u8>,
    ) -> Result<Box<dyn ArchiveObject>>;
}

/// Result of `get_object`: a typed object, or raw bytes when no factory
/// applies.
#[derive(Debug)]
pub enum Materialized {
    /// Factory-built object.
    Object(Box<dyn ArchiveObject>),
    /// Raw entry bytes.
    Bytes(Vec<u8>),
}

impl Materialized {
    /// Returns `true` for a factory-built object.
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Returns the object, if one was built.
    #[must_use]
    pub fn as_object(&self) -> Option<&dyn ArchiveObject> {
        match self {
            Self::Object(object) => Some(object.as_ref()),
            Self::Bytes(_) => None,
        }
    }

    /// Returns the raw bytes, if no object was built.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Object(_) => None,
        }
    }
}

/// Number of bytes shown by [`UnknownFile::preview`].
const PREVIEW_LEN: usize = 16;

/// Generic model for entries of any format.
///
/// # Examples
///
/// ```
/// use gamepak_core::factory::{ArchiveObject, UnknownFile};
///
/// let file = UnknownFile::new("maps/e1m1.bsp", vec![0x1d, 0x00, 0x00, 0x00]);
/// assert_eq!(file.kind(), "unknown");
/// assert_eq!(file.preview(), "1d 00 00 00");
/// assert!(file.as_stream().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFile {
    path: String,
    bytes: Vec<u8>,
}

impl UnknownFile {
    /// Wraps the bytes of the entry at `path`.
    #[must_use]
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }

    /// Logical path of the wrapped entry.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Wrapped bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex dump of the first bytes.
    #[must_use]
    pub fn preview(&self) -> String {
        let mut out = String::with_capacity(PREVIEW_LEN * 3);
        for (i, byte) in self.bytes.iter().take(PREVIEW_LEN).enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl ArchiveObject for UnknownFile {
    fn kind(&self) -> &str {
        "unknown"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }

    fn as_binary(&self) -> Option<&dyn BinaryObject> {
        Some(self)
    }

    fn as_stream(&self) -> Option<&dyn StreamObject> {
        Some(self)
    }
}

impl BinaryObject for UnknownFile {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

impl StreamObject for UnknownFile {
    fn write_to(&self, out: &mut dyn Write) -> Result<u64> {
        out.write_all(&self.bytes)?;
        Ok(self.bytes.len() as u64)
    }
}
