//! Worker tracking and shutdown coordination.

use crate::error::{Error, Result};
use crate::types::{Event, JobId};
use std::sync::atomic::Ordering;

use super::MediaDownloader;

impl MediaDownloader {
    /// Wait until a job's worker has finished
    ///
    /// Returns immediately if the worker already finished.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no job has this identifier.
    pub async fn join_worker(&self, id: &JobId) -> Result<()> {
        if !self.registry.contains(id).await {
            return Err(Error::NotFound(id.to_string()));
        }

        let handle = self.workers.active.lock().await.remove(id);
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            tracing::error!(job_id = %id, error = %e, "Download worker did not finish cleanly");
        }
        Ok(())
    }

    /// Number of workers that have not finished yet
    pub async fn active_workers(&self) -> usize {
        let mut active = self.workers.active.lock().await;
        active.retain(|_, h| !h.is_finished());
        active.len()
    }

    /// Whether new submissions are accepted
    pub fn is_accepting(&self) -> bool {
        self.workers.accepting_new.load(Ordering::SeqCst)
    }

    /// Gracefully shut down the downloader
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new submissions
    /// 2. Waits for running workers, bounded by `download.shutdown_timeout`
    /// 3. Emits [`Event::Shutdown`]
    ///
    /// Workers still running at the deadline are left to finish on their own;
    /// their jobs stay pollable. Calling this more than once is harmless.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.workers.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new downloads");

        let timeout = self.config.download.shutdown_timeout;
        match tokio::time::timeout(timeout, self.wait_for_active_workers()).await {
            Ok(()) => {
                tracing::info!("All active downloads completed gracefully");
            }
            Err(_) => {
                let remaining = self.active_workers().await;
                tracing::warn!(
                    remaining,
                    "Timeout waiting for downloads to complete, proceeding with shutdown"
                );
            }
        }

        self.emit_event(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Wait for all tracked workers to finish
    async fn wait_for_active_workers(&self) {
        loop {
            let active_count = self.active_workers().await;
            if active_count == 0 {
                return;
            }

            tracing::debug!(active_count, "Waiting for active downloads to complete");
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    }
}
