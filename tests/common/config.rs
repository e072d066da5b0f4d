//! Test configuration helpers for creating test downloaders

use super::fixtures::{Script, ScriptedExtractor};
use media_dl::{Config, MediaDownloader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Configuration rooted in a temporary directory
pub fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");
    config.download.shutdown_timeout = Duration::from_secs(5);
    config.extractor.skip_certificate_check = false;
    config
}

/// Downloader backed by a [`ScriptedExtractor`]
///
/// The tempdir must be kept alive for the duration of the test.
pub async fn create_scripted_downloader(script: Script) -> (Arc<MediaDownloader>, TempDir) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let config = test_config(&temp_dir);
    let downloader =
        MediaDownloader::with_extractor(config, Arc::new(ScriptedExtractor::new(script)))
            .await
            .expect("failed to create downloader");
    (Arc::new(downloader), temp_dir)
}

/// Path of a real yt-dlp binary for live tests
///
/// Honors `YTDLP_PATH`, then searches PATH.
pub fn live_binary() -> Option<PathBuf> {
    std::env::var_os("YTDLP_PATH")
        .map(PathBuf::from)
        .or_else(|| which::which("yt-dlp").ok())
}
