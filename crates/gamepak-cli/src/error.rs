//! Error conversion utilities for CLI.
//!
//! Converts gamepak-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use gamepak_core::ArchiveError;

/// Converts `ArchiveError` to a user-friendly anyhow error with context.
pub fn convert_archive_error(err: ArchiveError, target: &str) -> anyhow::Error {
    match err {
        ArchiveError::NotFound { path } => {
            anyhow!(
                "Not found in '{target}': {path}\n\
                 HINT: Run 'gamepak list {target}' to see entries; nested entries are \
                 addressed as 'container:path'."
            )
        }
        ArchiveError::Ambiguous { path, count } => {
            anyhow!(
                "'{path}' matches {count} entries in '{target}'\n\
                 HINT: Use --id with the entry's numeric id, or prefix the member name."
            )
        }
        ArchiveError::BadMagic { container, found } => {
            anyhow!(
                "'{container}' is not a recognized container: {found}\n\
                 HINT: Check that the file extension matches its format, or select the \
                 right game with '#game' in the address."
            )
        }
        ArchiveError::UnsupportedVersion { container, version } => {
            anyhow!(
                "'{container}' uses unsupported format version {version}\n\
                 HINT: This container needs a newer driver."
            )
        }
        ArchiveError::Corrupt(reason) => {
            anyhow!(
                "Container '{target}' is corrupt: {reason}\n\
                 HINT: The file may be truncated or damaged."
            )
        }
        ArchiveError::DriverContractViolation { reason } => {
            anyhow!(
                "Driver contract violated: {reason}\n\
                 HINT: Retry without object options, e.g. '--option default'."
            )
        }
        ArchiveError::Unsupported { engine, extension } => {
            anyhow!(
                "No driver or factory for '.{extension}' on engine '{engine}'\n\
                 HINT: Check the game selected with '#game' in the address."
            )
        }
        ArchiveError::Recoverable { reason } => {
            anyhow!(
                "Issue in '{target}' escalated by the suppress option: {reason}\n\
                 HINT: Drop 'suppress' from --option to log such issues and continue."
            )
        }
        ArchiveError::PathTraversal { path } => {
            anyhow!(
                "Security violation: '{target}' has an entry escaping the export \
                 directory: '{}'\n\
                 HINT: This container may be malicious. Do not export from untrusted sources.",
                path.display()
            )
        }
        ArchiveError::InvalidAddress(reason) => {
            anyhow!(
                "Invalid address '{target}': {reason}\n\
                 HINT: Addresses look like 'scheme:/path#game'; plain paths use the \
                 'file' scheme."
            )
        }
        ArchiveError::Config(reason) => {
            anyhow!(
                "Configuration error: {reason}\n\
                 HINT: Check the file passed with --config."
            )
        }
        ArchiveError::Io(io_err) => {
            anyhow!("I/O error while processing '{target}': {io_err}")
        }
        _ => anyhow::Error::from(err).context(format!("Error processing '{target}'")),
    }
}

/// Adds container context to a core result.
pub fn add_container_context<T>(
    result: Result<T, ArchiveError>,
    target: &str,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_archive_error(e, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_convert_not_found() {
        let err = ArchiveError::NotFound {
            path: "maps/e9m9.bsp".into(),
        };
        let msg = format!("{:?}", convert_archive_error(err, "pak0.pak"));
        assert!(msg.contains("maps/e9m9.bsp"));
        assert!(msg.contains("gamepak list pak0.pak"));
        assert!(msg.contains("HINT"));
    }

    #[test]
    fn test_convert_ambiguous() {
        let err = ArchiveError::Ambiguous {
            path: "a.txt".into(),
            count: 2,
        };
        let msg = format!("{:?}", convert_archive_error(err, "dup.tar"));
        assert!(msg.contains("matches 2 entries"));
        assert!(msg.contains("--id"));
    }

    #[test]
    fn test_convert_path_traversal() {
        let err = ArchiveError::PathTraversal {
            path: PathBuf::from("../../etc/passwd"),
        };
        let msg = format!("{:?}", convert_archive_error(err, "evil.tar"));
        assert!(msg.contains("Security violation"));
        assert!(msg.contains("evil.tar"));
    }

    #[test]
    fn test_convert_io_error() {
        let err = ArchiveError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        let msg = format!("{:?}", convert_archive_error(err, "pak0.pak"));
        assert!(msg.contains("I/O error"));
    }
}
