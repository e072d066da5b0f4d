//! Stand-in extractor used when no yt-dlp binary is available

use super::traits::{DownloadRequest, Extractor, ProgressSender};
use crate::types::VideoMetadata;
use async_trait::async_trait;

const MISSING_BINARY: &str = "media extraction requires the yt-dlp binary. \
     Configure extractor.binary_path or ensure yt-dlp is in PATH.";

/// Extractor used when yt-dlp could not be found
///
/// Lets the downloader and its API start without the binary. Every submission
/// is rejected at metadata resolution, so no job is ever created.
///
/// # Examples
///
/// ```
/// use media_dl::extractor::{Extractor, UnavailableExtractor};
///
/// # #[tokio::main]
/// # async fn main() {
/// let extractor = UnavailableExtractor;
/// assert!(!extractor.is_available());
/// assert!(extractor.fetch_metadata("https://youtu.be/x").await.is_err());
/// # }
/// ```
pub struct UnavailableExtractor;

#[async_trait]
impl Extractor for UnavailableExtractor {
    async fn fetch_metadata(&self, _url: &str) -> crate::Result<VideoMetadata> {
        Err(crate::Error::Resolution(MISSING_BINARY.into()))
    }

    async fn download(
        &self,
        _request: &DownloadRequest,
        _progress: ProgressSender,
    ) -> crate::Result<()> {
        Err(crate::Error::NotSupported(MISSING_BINARY.into()))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
