//! Core downloader implementation split into focused submodules.
//!
//! The `MediaDownloader` struct and its methods are organized by domain:
//! - [`submit`] - Request validation, metadata resolution and job creation
//! - [`worker`] - Per-job download worker and progress handling
//! - [`lifecycle`] - Worker tracking and shutdown coordination

mod lifecycle;
mod submit;
mod worker;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractor::{Extractor, UnavailableExtractor, YtDlpExtractor};
use crate::registry::JobRegistry;
use crate::types::{Event, JobId, JobSnapshot, VideoMetadata};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

/// Worker tracking and admission state
#[derive(Clone)]
pub(crate) struct WorkerState {
    /// Next job identifier (identifiers are never reused)
    pub(crate) next_job_id: Arc<AtomicU64>,
    /// Join handles of workers that may still be running
    pub(crate) active: Arc<Mutex<HashMap<JobId, JoinHandle<()>>>>,
    /// Flag to indicate whether new submissions are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            next_job_id: Arc::new(AtomicU64::new(0)),
            active: Arc::new(Mutex::new(HashMap::new())),
            accepting_new: Arc::new(AtomicBool::new(true)),
        }
    }
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct MediaDownloader {
    /// Job registry (the source of truth for progress polling)
    pub(crate) registry: Arc<JobRegistry>,
    /// Extraction backend (trait object for pluggable implementations)
    pub(crate) extractor: Arc<dyn Extractor>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Worker tracking and admission state
    pub(crate) workers: WorkerState,
}

impl MediaDownloader {
    /// Create a new MediaDownloader instance
    ///
    /// Validates the configuration, creates the download directory and picks
    /// the extraction backend:
    /// - `extractor.binary_path` if set
    /// - otherwise `yt-dlp` from PATH (unless `extractor.search_path` is off)
    /// - otherwise [`UnavailableExtractor`], which rejects every submission
    pub async fn new(config: Config) -> Result<Self> {
        let extractor: Arc<dyn Extractor> = match YtDlpExtractor::from_config(&config.extractor) {
            Some(ytdlp) => {
                tracing::info!(binary = %ytdlp.binary_path().display(), "Using yt-dlp extractor");
                Arc::new(ytdlp)
            }
            None => {
                tracing::warn!(
                    "yt-dlp not found; submissions will be rejected until it is installed"
                );
                Arc::new(UnavailableExtractor)
            }
        };

        Self::with_extractor(config, extractor).await
    }

    /// Create a MediaDownloader with an explicit extraction backend
    pub async fn with_extractor(config: Config, extractor: Arc<dyn Extractor>) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.download.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.download.download_dir.display(),
                        e
                    ),
                ))
            })?;

        if config.extractor.skip_certificate_check {
            tracing::warn!("TLS certificate validation is disabled for downloads");
        }

        tracing::info!(
            extractor = extractor.name(),
            available = extractor.is_available(),
            download_dir = %config.download.download_dir.display(),
            "Extractor initialized"
        );

        let (event_tx, _rx) = broadcast::channel(config.event_buffer);

        Ok(Self {
            registry: Arc::new(JobRegistry::new()),
            extractor,
            event_tx,
            config: Arc::new(config),
            workers: WorkerState::new(),
        })
    }

    /// Subscribe to job events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// A subscriber that falls behind by more than `event_buffer` events receives
    /// `RecvError::Lagged`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use media_dl::{Config, MediaDownloader};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = MediaDownloader::new(Config::default()).await?;
    ///
    ///     let mut events = downloader.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             tracing::info!(?event, "job event");
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// The job registry backing this downloader
    pub fn registry(&self) -> Arc<JobRegistry> {
        Arc::clone(&self.registry)
    }

    /// Name of the extraction backend and whether it can download
    pub fn extractor_info(&self) -> (&'static str, bool) {
        (self.extractor.name(), self.extractor.is_available())
    }

    /// Look up metadata for a URL
    ///
    /// Every failure is reported as [`Error::Resolution`] so it maps to a
    /// client error at the API boundary.
    pub async fn resolve_metadata(&self, url: &str) -> Result<VideoMetadata> {
        self.extractor.fetch_metadata(url).await.map_err(|e| match e {
            Error::Resolution(msg) => Error::Resolution(msg),
            other => Error::Resolution(other.to_string()),
        })
    }

    /// Snapshot of one job
    pub async fn get_job(&self, id: &JobId) -> Result<JobSnapshot> {
        self.registry.get(id).await
    }

    /// All jobs in submission order
    pub async fn list_jobs(&self) -> Vec<JobSnapshot> {
        self.registry.list().await
    }

    /// Completed jobs in submission order
    pub async fn completed_jobs(&self) -> Vec<JobSnapshot> {
        self.registry.list_completed().await
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    ///
    /// Listens on the configured bind address (default: 127.0.0.1:8000).
    pub fn spawn_api_server(self: &Arc<Self>) -> JoinHandle<Result<()>> {
        let downloader = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }
}
