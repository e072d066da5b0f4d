//! Traits and types for media extraction

use crate::progress::RawProgress;
use crate::types::VideoMetadata;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Channel a download reports raw progress records on
///
/// The receiving end belongs to the download worker. Sends never block, and a
/// send after the worker stopped listening is silently dropped.
pub type ProgressSender = mpsc::UnboundedSender<RawProgress>;

/// Everything an extractor needs to run one download
#[derive(Clone, Debug, PartialEq)]
pub struct DownloadRequest {
    /// Canonical source URL
    pub url: String,
    /// Where the finished file must end up
    pub output_path: PathBuf,
    /// Format selector (e.g. "best")
    pub format: String,
    /// Skip TLS certificate validation
    pub skip_certificate_check: bool,
    /// Additional extractor arguments
    pub extra_args: Vec<String>,
}

/// Trait for media extraction backends
///
/// Implementations resolve metadata for a URL and fetch the media itself.
/// The `yt-dlp` binary is the production backend; tests plug in scripted
/// implementations.
///
/// # Examples
///
/// ```no_run
/// use media_dl::extractor::{DownloadRequest, Extractor, YtDlpExtractor};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = YtDlpExtractor::from_path().expect("yt-dlp not found");
///
/// let metadata = extractor
///     .fetch_metadata("https://www.youtube.com/watch?v=aqz-KE-bpKQ")
///     .await?;
/// println!("{}", metadata.title);
///
/// let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<media_dl::progress::RawProgress>();
/// let request = DownloadRequest {
///     url: "https://www.youtube.com/watch?v=aqz-KE-bpKQ".into(),
///     output_path: PathBuf::from("downloads/0.mp4"),
///     format: "best".into(),
///     skip_certificate_check: false,
///     extra_args: Vec::new(),
/// };
/// tokio::spawn(async move {
///     while let Some(record) = rx.recv().await {
///         println!("{:?}", record.status);
///     }
/// });
/// extractor.download(&request, tx).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Resolve metadata for a URL without downloading anything
    ///
    /// # Errors
    ///
    /// Any failure (unsupported URL, network error, missing title) is reported
    /// as [`Error::Resolution`](crate::Error::Resolution) carrying the
    /// extractor's message.
    async fn fetch_metadata(&self, url: &str) -> crate::Result<VideoMetadata>;

    /// Download the media to `request.output_path`
    ///
    /// Progress records are sent on `progress` as they are produced. A
    /// `finished` record whose `filename` is missing or equals
    /// `request.output_path` marks the file complete; `finished` records for
    /// other files (separate streams of a merged format) are intermediate.
    /// Returning `Ok` with the output file in place also counts as complete.
    /// The sender is dropped when this call returns.
    ///
    /// # Errors
    ///
    /// [`Error::Extractor`](crate::Error::Extractor) if the download fails.
    async fn download(&self, request: &DownloadRequest, progress: ProgressSender)
    -> crate::Result<()>;

    /// Whether this backend can actually download anything
    fn is_available(&self) -> bool {
        true
    }

    /// Get the name of this extractor implementation
    fn name(&self) -> &'static str;
}
