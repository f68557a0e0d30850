//! Export configuration.

use crate::ArchiveError;
use crate::FileOption;
use crate::Result;

/// Controls one run of the export pipeline.
///
/// Defaults export every entry as raw bytes, one item at a time.
///
/// # Examples
///
/// ```
/// use gamepak_core::ExportConfig;
/// use gamepak_core::FileOption;
///
/// let config = ExportConfig::default()
///     .with_option(FileOption::RAW)
///     .with_max_in_flight(4)
///     .with_include(vec!["*.bsp".into()]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Materialization flags for every entry.
    pub option: FileOption,

    /// Maximum number of entries exported concurrently; 1 is serial.
    pub max_in_flight: usize,

    /// The progress callback fires for every n-th catalog index.
    pub progress_interval: usize,

    /// Catalog index of the first exported entry.
    pub start_index: usize,

    /// Glob-style patterns an entry path must match (empty = all).
    pub include: Vec<String>,

    /// Replace files that already exist at the destination.
    pub overwrite: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            option: FileOption::DEFAULT,
            max_in_flight: 1,
            progress_interval: 50,
            start_index: 0,
            include: Vec::new(),
            overwrite: true,
        }
    }
}

impl ExportConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the materialization flags.
    #[must_use]
    pub fn with_option(mut self, option: FileOption) -> Self {
        self.option = option;
        self
    }

    /// Sets the worker count.
    #[must_use]
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Sets how often progress is reported.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Skips catalog entries before `index`.
    #[must_use]
    pub fn with_start_index(mut self, index: usize) -> Self {
        self.start_index = index;
        self
    }

    /// Restricts export to entries matching any of `patterns`.
    #[must_use]
    pub fn with_include(mut self, patterns: Vec<String>) -> Self {
        self.include = patterns;
        self
    }

    /// Sets whether existing files are replaced.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Checks the configuration before a run.
    ///
    /// # Errors
    ///
    /// `Config` if `max_in_flight` or `progress_interval` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_in_flight == 0 {
            return Err(ArchiveError::Config("max_in_flight must be at least 1".into()));
        }
        if self.progress_interval == 0 {
            return Err(ArchiveError::Config("progress_interval must be at least 1".into()));
        }
        Ok(())
    }

    /// Returns `true` if `path` passes the include patterns.
    #[must_use]
    pub fn includes(&self, path: &str) -> bool {
        self.include.is_empty()
            || self
                .include
                .iter()
                .any(|pattern| crate::export::filters::matches_pattern(path, pattern))
    }
}
