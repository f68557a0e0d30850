//! Export reporting.

use std::time::Duration;

/// One entry that failed to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFailure {
    /// Catalog index of the entry in its container.
    pub index: usize,
    /// Destination-relative path of the entry.
    pub path: String,
    /// Error message.
    pub message: String,
}

/// Report of an export run.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    /// Number of files written.
    pub files_written: usize,

    /// Number of directories created.
    pub directories_created: usize,

    /// Total bytes written to disk.
    pub bytes_written: u64,

    /// Number of nested containers exported.
    pub nested_visited: usize,

    /// Member containers of the export, as listed by `containers.marker`.
    pub containers: Vec<String>,

    /// Entries that failed; the run continued past each of them.
    pub failures: Vec<ExportFailure>,

    /// Wall-clock duration of the run.
    pub duration: Duration,
}

impl ExportReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether any entry failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Returns the number of entries processed, failed ones included.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_written + self.failures.len()
    }
}

/// Callbacks fired by the export pipeline.
///
/// Callbacks may arrive from several worker threads and in any order once
/// more than one item is in flight; each carries the catalog index so order
/// can be reconstructed.
///
/// # Examples
///
/// ```
/// use gamepak_core::ExportProgress;
/// use std::sync::atomic::AtomicUsize;
/// use std::sync::atomic::Ordering;
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl ExportProgress for Counter {
///     fn on_item(&self, _index: usize, _total: usize, _path: &str) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait ExportProgress: Send + Sync {
    /// Called for every `progress_interval`-th index and for the last one.
    fn on_item(&self, index: usize, total: usize, path: &str);

    /// Called once per failed entry.
    fn on_error(&self, failure: &ExportFailure) {
        let _ = failure;
    }

    /// Called once when the run completes.
    fn on_complete(&self, report: &ExportReport) {
        let _ = report;
    }
}

/// Progress sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ExportProgress for NoopProgress {
    fn on_item(&self, _index: usize, _total: usize, _path: &str) {}
}
