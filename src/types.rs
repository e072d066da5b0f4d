//! Core types for media-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// Unique identifier for a job
///
/// Assigned once at submission from a monotonically increasing counter and
/// never reused. Serialized as a plain string.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Build the identifier for the `seq`-th submission
    pub fn from_sequence(seq: u64) -> Self {
        Self(seq.to_string())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job status as exposed to pollers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// The worker is running
    Downloading,
    /// The file is on disk
    Completed,
    /// The download failed; see `error`
    Failed,
}

impl JobStatus {
    /// Whether no further transitions can happen
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Downloading)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Downloading => "downloading",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Metadata resolved before a download starts
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VideoMetadata {
    /// Media title
    pub title: String,
    /// Duration in seconds, if known
    pub duration: Option<f64>,
    /// Uploader / author name
    pub author: Option<String>,
    /// Long description
    pub description: Option<String>,
    /// Thumbnail URL
    pub thumbnail: Option<String>,
}

/// Lifecycle state of a job
///
/// Each variant carries only the fields that are meaningful in that state, so
/// a completed job without a file path, or a running job with an error, cannot
/// be constructed.
#[derive(Clone, Debug, PartialEq)]
pub enum JobState {
    /// The worker is running
    Downloading {
        /// Percentage 0-100, never decreasing
        progress: u8,
        /// Bytes written so far
        downloaded_bytes: u64,
        /// Expected size in bytes (0 when unknown)
        total_bytes: u64,
    },
    /// The file is on disk
    Completed {
        /// Bytes written according to the last progress record
        downloaded_bytes: u64,
        /// Expected size according to the last progress record
        total_bytes: u64,
        /// Location of the output file
        file_path: PathBuf,
        /// Size of the output file as read from the filesystem
        file_size: u64,
        /// When the job completed
        finished_at: DateTime<Utc>,
    },
    /// The download failed
    Failed {
        /// Progress reached before the failure
        progress: u8,
        /// Bytes written before the failure
        downloaded_bytes: u64,
        /// Expected size in bytes (0 when unknown)
        total_bytes: u64,
        /// Error message
        error: String,
        /// When the job failed
        finished_at: DateTime<Utc>,
    },
}

impl JobState {
    /// The initial state of every job
    pub fn started() -> Self {
        JobState::Downloading {
            progress: 0,
            downloaded_bytes: 0,
            total_bytes: 0,
        }
    }

    /// Status tag of this state
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Downloading { .. } => JobStatus::Downloading,
            JobState::Completed { .. } => JobStatus::Completed,
            JobState::Failed { .. } => JobStatus::Failed,
        }
    }

    /// Progress percentage (completed jobs report 100)
    pub fn progress(&self) -> u8 {
        match self {
            JobState::Downloading { progress, .. } | JobState::Failed { progress, .. } => {
                *progress
            }
            JobState::Completed { .. } => 100,
        }
    }

    /// (downloaded, total) byte counters
    pub fn bytes(&self) -> (u64, u64) {
        match self {
            JobState::Downloading {
                downloaded_bytes,
                total_bytes,
                ..
            }
            | JobState::Completed {
                downloaded_bytes,
                total_bytes,
                ..
            }
            | JobState::Failed {
                downloaded_bytes,
                total_bytes,
                ..
            } => (*downloaded_bytes, *total_bytes),
        }
    }
}

/// One tracked download request and its lifecycle state
#[derive(Clone, Debug, PartialEq)]
pub struct Job {
    /// Identifier, fixed at creation
    pub id: JobId,
    /// Canonical source URL
    pub url: String,
    /// Metadata resolved at submission
    pub metadata: VideoMetadata,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// Current lifecycle state
    pub state: JobState,
}

impl Job {
    /// A freshly submitted job: `downloading`, progress 0
    pub fn new(id: JobId, url: String, metadata: VideoMetadata) -> Self {
        Self {
            id,
            url,
            metadata,
            created_at: Utc::now(),
            state: JobState::started(),
        }
    }

    /// Flat, serializable view of this job
    pub fn snapshot(&self) -> JobSnapshot {
        let (downloaded_bytes, total_bytes) = self.state.bytes();
        let (file_path, file_size, error, finished_at) = match &self.state {
            JobState::Downloading { .. } => (None, None, None, None),
            JobState::Completed {
                file_path,
                file_size,
                finished_at,
                ..
            } => (Some(file_path.clone()), Some(*file_size), None, Some(*finished_at)),
            JobState::Failed {
                error, finished_at, ..
            } => (None, None, Some(error.clone()), Some(*finished_at)),
        };

        JobSnapshot {
            id: self.id.clone(),
            url: self.url.clone(),
            status: self.state.status(),
            progress: self.state.progress(),
            downloaded_bytes,
            total_bytes,
            title: self.metadata.title.clone(),
            duration: self.metadata.duration,
            author: self.metadata.author.clone(),
            description: self.metadata.description.clone(),
            thumbnail: self.metadata.thumbnail.clone(),
            file_path,
            file_size,
            error,
            created_at: self.created_at,
            finished_at,
        }
    }
}

/// Point-in-time copy of a job, as returned by `GET /progress/{video_id}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JobSnapshot {
    /// Job identifier
    pub id: JobId,
    /// Canonical source URL
    pub url: String,
    /// Current status
    pub status: JobStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Bytes downloaded so far
    pub downloaded_bytes: u64,
    /// Expected total size in bytes (0 when unknown)
    pub total_bytes: u64,
    /// Media title
    pub title: String,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Uploader / author
    pub author: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Thumbnail URL
    pub thumbnail: Option<String>,
    /// Output file path (completed jobs only)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[schema(value_type = Option<String>)]
    pub file_path: Option<PathBuf>,
    /// Output file size in bytes (completed jobs only)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_size: Option<u64>,
    /// Error message (failed jobs only)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// Completion or failure time
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Event emitted during the job lifecycle
///
/// Broadcast to every subscriber of [`MediaDownloader::subscribe`](crate::MediaDownloader::subscribe)
/// and streamed by `GET /events`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job created and worker scheduled
    Queued {
        /// Job ID
        id: JobId,
        /// Canonical URL
        url: String,
        /// Resolved title
        title: String,
    },

    /// Progress applied to the registry
    Downloading {
        /// Job ID
        id: JobId,
        /// Progress percentage (0-100)
        percent: u8,
        /// Bytes downloaded so far
        downloaded_bytes: u64,
        /// Expected size in bytes (0 when unknown)
        total_bytes: u64,
    },

    /// Job completed
    Completed {
        /// Job ID
        id: JobId,
        /// Output file path
        #[schema(value_type = String)]
        file_path: PathBuf,
        /// Output file size in bytes
        file_size: u64,
    },

    /// Job failed
    Failed {
        /// Job ID
        id: JobId,
        /// Error message
        error: String,
    },

    /// A problem that was absorbed instead of failing the job
    /// (e.g. a malformed progress field)
    Diagnostic {
        /// Job ID
        id: JobId,
        /// What was absorbed
        message: String,
    },

    /// Downloader is shutting down
    Shutdown,
}
