//! Shared test helpers for creating MediaDownloader instances in tests.

use crate::config::Config;
use crate::downloader::MediaDownloader;
use crate::extractor::{DownloadRequest, Extractor, ProgressSender};
use crate::progress::RawProgress;
use crate::types::{JobId, JobSnapshot, VideoMetadata};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::Semaphore;

/// One scripted action of a [`MockExtractor`] download
#[derive(Clone)]
pub(crate) enum Step {
    /// Send a raw progress record
    Progress(RawProgress),
    /// Write the output file with these bytes
    WriteFile(Vec<u8>),
    /// Send a `finished` record
    Finish,
    /// Return an extractor error
    Fail(String),
    /// Block until the gate is opened
    Wait(Arc<Gate>),
    /// Panic inside the download
    Panic(&'static str),
}

/// A latch that stays open once opened, releasing every waiter
pub(crate) struct Gate(Semaphore);

impl Gate {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self(Semaphore::new(0)))
    }

    pub(crate) fn open(&self) {
        self.0.add_permits(1);
    }

    async fn wait(&self) {
        // the permit goes back on drop, so later waiters pass too
        let _permit = self.0.acquire().await;
    }
}

/// Extractor that replays a fixed script instead of touching the network
pub(crate) struct MockExtractor {
    steps: Vec<Step>,
    rejected_urls: HashSet<String>,
    metadata_gate: Option<Arc<Gate>>,
    pub(crate) metadata_calls: AtomicUsize,
    pub(crate) download_calls: AtomicUsize,
}

impl MockExtractor {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            rejected_urls: HashSet::new(),
            metadata_gate: None,
            metadata_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    /// A download that reports some progress then produces a file
    pub(crate) fn succeeding() -> Self {
        Self::new(vec![
            Step::Progress(RawProgress::downloading(256, 1024)),
            Step::Progress(RawProgress::downloading(768, 1024)),
            Step::WriteFile(vec![0u8; 1024]),
            Step::Finish,
        ])
    }

    /// Reject metadata lookups for this URL
    pub(crate) fn rejecting(mut self, url: &str) -> Self {
        self.rejected_urls.insert(url.to_string());
        self
    }

    /// Hold every metadata lookup until the gate is opened
    pub(crate) fn holding_metadata(mut self, gate: Arc<Gate>) -> Self {
        self.metadata_gate = Some(gate);
        self
    }
}

/// Title the mock resolves for a URL
pub(crate) fn mock_title(url: &str) -> String {
    format!("Title of {}", url)
}

#[async_trait]
impl Extractor for MockExtractor {
    async fn fetch_metadata(&self, url: &str) -> crate::Result<VideoMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.metadata_gate {
            gate.wait().await;
        }
        if self.rejected_urls.contains(url) {
            return Err(crate::Error::Resolution(format!(
                "ERROR: Unsupported URL: {}",
                url
            )));
        }
        Ok(VideoMetadata {
            title: mock_title(url),
            duration: Some(12.0),
            author: Some("Mock Uploader".to_string()),
            description: None,
            thumbnail: None,
        })
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        progress: ProgressSender,
    ) -> crate::Result<()> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        for step in &self.steps {
            match step {
                Step::Progress(record) => {
                    let _ = progress.send(record.clone());
                }
                Step::WriteFile(bytes) => {
                    tokio::fs::write(&request.output_path, bytes).await?;
                }
                Step::Finish => {
                    let _ = progress.send(RawProgress::finished());
                }
                Step::Fail(message) => {
                    return Err(crate::Error::Extractor(message.clone()));
                }
                Step::Wait(gate) => gate.wait().await,
                Step::Panic(message) => panic!("{}", message),
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a test MediaDownloader backed by `extractor`.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) async fn create_test_downloader(
    extractor: MockExtractor,
) -> (MediaDownloader, Arc<MockExtractor>, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");
    config.download.shutdown_timeout = Duration::from_secs(5);
    config.extractor.skip_certificate_check = false;

    let extractor = Arc::new(extractor);
    let downloader = MediaDownloader::with_extractor(config, extractor.clone())
        .await
        .unwrap();

    (downloader, extractor, temp_dir)
}

/// Submit, wait for the worker, and return the final snapshot
pub(crate) async fn run_to_end(downloader: &MediaDownloader, url: &str) -> JobSnapshot {
    let id = downloader.submit(url).await.unwrap();
    downloader.join_worker(&id).await.unwrap();
    downloader.get_job(&id).await.unwrap()
}

/// Poll until a job leaves `downloading` (panics after 5 seconds)
pub(crate) async fn wait_for_terminal(downloader: &MediaDownloader, id: &JobId) -> JobSnapshot {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = downloader.get_job(id).await.unwrap();
            if snapshot.status.is_terminal() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job did not reach a terminal state")
}
