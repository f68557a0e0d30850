//! Output formatter trait for CLI results.

use anyhow::Result;
use gamepak_core::ExportReport;
use serde::Serialize;

/// One listed catalog entry.
#[derive(Debug, Serialize)]
pub struct ListedEntry {
    pub index: usize,
    /// Multi member owning the entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub path: String,
    pub size: u64,
    pub packed_size: u64,
    pub compressed: bool,
}

impl ListedEntry {
    /// Path as addressed through the container: `member/path` for Multi.
    pub fn address(&self) -> String {
        match &self.member {
            Some(member) => format!("{member}/{}", self.path),
            None => self.path.clone(),
        }
    }
}

/// Summary of one archive behind a container.
#[derive(Debug, Serialize)]
pub struct ArchiveInfo {
    pub name: String,
    pub driver: String,
    pub game: String,
    pub engine: String,
    pub state: String,
    pub entries: usize,
    pub duplicates: Vec<DuplicatePath>,
}

/// A path shared by several entries.
#[derive(Debug, Serialize)]
pub struct DuplicatePath {
    pub path: String,
    pub count: usize,
}

/// Summary of a container.
#[derive(Debug, Serialize)]
pub struct ContainerInfo {
    pub name: String,
    pub kind: &'static str,
    pub archives: Vec<ArchiveInfo>,
}

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format a container listing
    fn format_listing(&self, entries: &[ListedEntry], long: bool, human_readable: bool)
    -> Result<()>;

    /// Format export result
    fn format_export_result(&self, report: &ExportReport) -> Result<()>;

    /// Format container summary
    fn format_info(&self, info: &ContainerInfo) -> Result<()>;

    /// Format error message
    fn format_error(&self, error: &anyhow::Error);

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(operation: impl Into<String>, error: impl Into<String>) -> JsonOutput<()> {
        JsonOutput {
            operation: operation.into(),
            status: Status::Error,
            data: None,
            error: Some(error.into()),
        }
    }
}
