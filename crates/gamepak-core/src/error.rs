//! Error types for container resolution, materialization and export.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors raised by containers, drivers, factories and the export pipeline.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No entry matched the lookup.
    #[error("entry not found: {path}")]
    NotFound {
        /// The path or id that was looked up.
        path: String,
    },

    /// More than one entry matched a single-result lookup.
    #[error("ambiguous entry: {path} matches {count} entries")]
    Ambiguous {
        /// The path or id that was looked up.
        path: String,
        /// Number of matching entries.
        count: usize,
    },

    /// The container does not start with the expected signature.
    #[error("bad magic in {container}: {found}")]
    BadMagic {
        /// Name of the container being read.
        container: String,
        /// Description of the signature that was found.
        found: String,
    },

    /// The container declares a layout version the driver cannot read.
    #[error("unsupported version {version} in {container}")]
    UnsupportedVersion {
        /// Name of the container being read.
        container: String,
        /// Version reported by the container.
        version: u32,
    },

    /// Container structure or entry data is corrupted.
    #[error("corrupt container: {0}")]
    Corrupt(String),

    /// A driver or factory did not honour a capability it was asked for.
    #[error("driver contract violation: {reason}")]
    DriverContractViolation {
        /// What was missing.
        reason: String,
    },

    /// No driver or factory is registered for the combination.
    #[error("unsupported: no handler for engine '{engine}' and extension '{extension}'")]
    Unsupported {
        /// Engine identifier of the selected game.
        engine: String,
        /// File extension that was looked up.
        extension: String,
    },

    /// A recoverable driver issue escalated because `Suppress` was requested.
    #[error("escalated driver issue: {reason}")]
    Recoverable {
        /// The issue the driver reported.
        reason: String,
    },

    /// The container is not in a state that permits the operation.
    #[error("container {container} is {state}")]
    InvalidState {
        /// Name of the container.
        container: String,
        /// Current lifecycle state.
        state: String,
    },

    /// A previous open failed structurally; the container must be rebuilt.
    #[error("container {container} failed to open earlier and cannot be reopened")]
    Unusable {
        /// Name of the container.
        container: String,
    },

    /// Export destination would escape the destination root.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending entry path.
        path: PathBuf,
    },

    /// An address string could not be parsed or resolved.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A materialized object is not of the requested type.
    #[error("materialized object is not a {expected}")]
    TypeMismatch {
        /// Name of the requested type.
        expected: &'static str,
    },
}

impl ArchiveError {
    /// Returns `true` for the lookup misses that a non-throwing lookup turns
    /// into a no-result value.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepak_core::ArchiveError;
    ///
    /// let err = ArchiveError::Ambiguous { path: "a.txt".into(), count: 2 };
    /// assert!(err.is_lookup_miss());
    ///
    /// let err = ArchiveError::Corrupt("truncated".into());
    /// assert!(!err.is_lookup_miss());
    /// ```
    #[must_use]
    pub const fn is_lookup_miss(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Ambiguous { .. })
    }

    /// Returns `true` if this error describes a broken container layout.
    ///
    /// Structural errors raised while opening leave the container unusable.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::BadMagic { .. } | Self::UnsupportedVersion { .. } | Self::Corrupt(_)
        )
    }

    /// Returns the free-text context of this error, if it has one.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepak_core::ArchiveError;
    ///
    /// let err = ArchiveError::Corrupt("bad header".to_string());
    /// assert_eq!(err.context(), Some("bad header"));
    ///
    /// let err = ArchiveError::NotFound { path: "x".into() };
    /// assert_eq!(err.context(), None);
    /// ```
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Corrupt(msg) | Self::InvalidAddress(msg) | Self::Config(msg) => Some(msg),
            Self::DriverContractViolation { reason } | Self::Recoverable { reason } => Some(reason),
            _ => None,
        }
    }

    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }
}

/// Converts a lookup result into the non-throwing form.
///
/// `NotFound` and `Ambiguous` become `Ok(None)`; every other error is kept.
pub(crate) fn lookup_miss_to_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_lookup_miss() => Ok(None),
        Err(err) => Err(err),
    }
}
