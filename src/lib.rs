//! # media-dl
//!
//! Backend library for asynchronous media downloads.
//!
//! A client submits a media page URL, gets an identifier back as soon as the
//! URL's metadata has been resolved, and polls that identifier while the
//! download runs in the background. Fetching the media is delegated to an
//! [`Extractor`](extractor::Extractor); the production backend runs `yt-dlp`.
//!
//! ## Design
//!
//! - **Submit returns early** - only metadata resolution happens before the
//!   identifier is handed out
//! - **Progress is advisory** - malformed progress data never fails a download
//! - **Explicit registry** - job state lives in a [`JobRegistry`] owned by the
//!   downloader, never in globals
//! - **Event-driven** - consumers may subscribe to events instead of polling
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::{Config, MediaDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = MediaDownloader::new(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let id = downloader.submit("https://youtu.be/aqz-KE-bpKQ").await?;
//!     downloader.join_worker(&id).await?;
//!
//!     let job = downloader.get_job(&id).await?;
//!     println!("{} -> {:?}", job.title, job.file_path);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Short-link canonicalization
pub mod canonical_url;
/// Configuration types
pub mod config;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Media extraction backends
pub mod extractor;
/// Progress normalization
pub mod progress;
/// In-memory job registry
pub mod registry;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, DownloadConfig, ExtractorConfig};
pub use downloader::MediaDownloader;
pub use error::{ApiError, Error, Result, ToHttpStatus};
pub use extractor::{Extractor, UnavailableExtractor, YtDlpExtractor};
pub use registry::{JobRegistry, JobUpdate, UpdateOutcome};
pub use types::{Event, JobId, JobSnapshot, JobStatus, VideoMetadata};

/// Run the API server until a termination signal, then shut down.
///
/// The server is spawned in the background; on SIGTERM or Ctrl+C the
/// downloader stops accepting submissions and waits for running downloads
/// (bounded by `download.shutdown_timeout`).
///
/// # Example
///
/// ```no_run
/// use media_dl::{Config, MediaDownloader, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = MediaDownloader::new(Config::default()).await?;
///     run_with_shutdown(downloader).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: MediaDownloader) -> Result<()> {
    let downloader = std::sync::Arc::new(downloader);
    let server = downloader.spawn_api_server();

    tokio::select! {
        _ = wait_for_signal() => {}
        result = server => {
            // the server only returns on failure
            match result {
                Ok(Err(e)) => return Err(e),
                Ok(Ok(())) => tracing::warn!("API server stopped unexpectedly"),
                Err(e) => tracing::error!(error = %e, "API server task failed"),
            }
        }
    }

    downloader.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // may fail in restricted environments (containers, tests)
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for Ctrl+C only");
                std::future::pending::<()>().await;
            }
        }
    };

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Could not listen for Ctrl+C, waiting for SIGTERM only");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = terminate => tracing::info!("Received SIGTERM signal"),
        _ = interrupt => tracing::info!("Received SIGINT signal (Ctrl+C)"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
