//! Types used by the job database.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Job identifier (SQLite rowid, monotonic).
pub type JobId = i64;

/// Message stored on rows found in `downloading` when no run can own them.
pub const INTERRUPTED_MESSAGE: &str = "interrupted before completion";

/// Lifecycle status stored as a string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Downloading,
    Completed,
    Error,
    Canceled,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Downloading => "downloading",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
            JobStatus::Canceled => "canceled",
        }
    }

    /// Parses a stored status. Unknown values map to `Error` so a corrupt row
    /// is surfaced instead of silently re-run.
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "queued" => JobStatus::Queued,
            "downloading" => JobStatus::Downloading,
            "completed" => JobStatus::Completed,
            "error" => JobStatus::Error,
            "canceled" => JobStatus::Canceled,
            _ => JobStatus::Error,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested output: full video or extracted audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadType {
    Video,
    Audio,
}

impl DownloadType {
    pub fn as_str(self) -> &'static str {
        match self {
            DownloadType::Video => "video",
            DownloadType::Audio => "audio",
        }
    }
}

impl fmt::Display for DownloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a download type string other than "video" or "audio".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("download type must be 'video' or 'audio', got '{0}'")]
pub struct UnknownDownloadType(pub String);

impl FromStr for DownloadType {
    type Err = UnknownDownloadType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(DownloadType::Video),
            "audio" => Ok(DownloadType::Audio),
            other => Err(UnknownDownloadType(other.to_string())),
        }
    }
}

/// A queued row as seen by the drain loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedJob {
    pub id: JobId,
    /// Set by a retry; the next run must not reuse an existing output.
    pub retry_pending: bool,
}

/// Full job row. Field set matches what an outer layer (HTTP, CLI) exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub id: JobId,
    pub url: String,
    pub title: Option<String>,
    pub status: JobStatus,
    pub download_type: DownloadType,
    pub file_size: u64,
    pub progress: u8,
    pub file_path: Option<String>,
    pub error_message: Option<String>,
    /// Raw engine flags given at submission; replayed verbatim on retry.
    pub option_overlay: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial update of a job row. Unset fields are left untouched;
/// `updated_at` is always bumped.
///
/// Nullable columns use `Option<Option<_>>`: `Some(None)` writes NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub file_size: Option<u64>,
    pub title: Option<Option<String>>,
    pub file_path: Option<Option<String>>,
    pub error_message: Option<Option<String>>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }

    pub fn file_size(mut self, bytes: u64) -> Self {
        self.file_size = Some(bytes);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(Some(title.into()));
        self
    }

    pub fn clear_title(mut self) -> Self {
        self.title = Some(None);
        self
    }

    pub fn file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(Some(path.into()));
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(Some(message.into()));
        self
    }

    pub fn clear_error_message(mut self) -> Self {
        self.error_message = Some(None);
        self
    }

    /// True when only `updated_at` would change.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
