//! Scripted extractor used in place of yt-dlp

use async_trait::async_trait;
use media_dl::extractor::{DownloadRequest, Extractor, ProgressSender};
use media_dl::progress::RawProgress;
use media_dl::{Error, Result, VideoMetadata};
use serde_json::json;
use std::time::Duration;

/// How a scripted download behaves
#[derive(Clone, Debug)]
pub enum Script {
    /// Report `chunks` progress records, write `size` bytes, finish
    Succeed { size: usize, chunks: usize },
    /// Report progress whose numbers are wrapped in color codes, then succeed
    Colored { size: usize },
}

/// Extractor that decides behavior from the URL
///
/// URLs containing `unsupported` fail metadata resolution and URLs
/// containing `broken` fail mid-download. Everything else runs the
/// configured script.
pub struct ScriptedExtractor {
    pub script: Script,
    pub delay: Duration,
}

impl ScriptedExtractor {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            delay: Duration::from_millis(5),
        }
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata> {
        if url.contains("unsupported") {
            return Err(Error::Resolution(format!(
                "ERROR: Unsupported URL: {}",
                url
            )));
        }
        Ok(VideoMetadata {
            title: format!("Clip at {}", url),
            duration: Some(30.0),
            author: Some("Fixture".to_string()),
            description: Some("scripted".to_string()),
            thumbnail: None,
        })
    }

    async fn download(&self, request: &DownloadRequest, progress: ProgressSender) -> Result<()> {
        if request.url.contains("broken") {
            let _ = progress.send(RawProgress::downloading(1, 100));
            tokio::time::sleep(self.delay).await;
            return Err(Error::Extractor(format!(
                "ERROR: unable to download {}",
                request.url
            )));
        }

        match self.script {
            Script::Succeed { size, chunks } => {
                for n in 1..=chunks {
                    let _ = progress.send(RawProgress::downloading(size * n / chunks, size));
                    tokio::time::sleep(self.delay).await;
                }
                tokio::fs::write(&request.output_path, vec![7u8; size]).await?;
            }
            Script::Colored { size } => {
                let _ = progress.send(RawProgress::downloading(
                    json!(format!("\x1b[0;94m{}\x1b[0m", size / 2)),
                    json!(format!("\x1b[0;94m{}\x1b[0m", size)),
                ));
                tokio::time::sleep(self.delay).await;
                tokio::fs::write(&request.output_path, vec![1u8; size]).await?;
            }
        }
        let _ = progress.send(RawProgress::finished());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
