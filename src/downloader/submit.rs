//! Submission: validation, metadata resolution and job creation.

use crate::canonical_url::normalize_url;
use crate::error::{Error, Result};
use crate::types::{Event, Job, JobId};
use std::sync::atomic::Ordering;

use super::MediaDownloader;

impl MediaDownloader {
    /// Submit a URL for download
    ///
    /// The URL is canonicalized and its metadata resolved before anything is
    /// recorded. On success the job exists in the registry with status
    /// `downloading` and progress 0, and its worker has been scheduled. The
    /// download itself runs in the background; poll
    /// [`get_job`](Self::get_job) or [`subscribe`](Self::subscribe) to
    /// follow it.
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] once [`shutdown`](Self::shutdown) has started
    /// - [`Error::Validation`] if the URL is empty
    /// - [`Error::Resolution`] if metadata lookup fails; no job is created and
    ///   no identifier is consumed
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use media_dl::{Config, MediaDownloader};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let downloader = MediaDownloader::new(Config::default()).await?;
    /// let id = downloader.submit("https://youtu.be/aqz-KE-bpKQ").await?;
    ///
    /// let job = downloader.get_job(&id).await?;
    /// println!("{}: {}%", job.title, job.progress);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit(&self, url: &str) -> Result<JobId> {
        if !self.workers.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let url = url.trim();
        if url.is_empty() {
            return Err(Error::Validation("URL is required".to_string()));
        }

        let url = normalize_url(url);

        let metadata = self.resolve_metadata(&url).await.inspect_err(|e| {
            tracing::warn!(url = %url, error = %e, "Metadata resolution failed");
        })?;

        // Admission is re-checked under the worker lock: shutdown flips the
        // flag before it first takes this lock, so a submission either sees the
        // flag or registers its worker where shutdown will wait for it.
        let mut active = self.workers.active.lock().await;
        if !self.workers.accepting_new.load(Ordering::SeqCst) {
            tracing::info!(url = %url, "Rejecting submission resolved during shutdown");
            return Err(Error::ShuttingDown);
        }

        let id = JobId::from_sequence(self.workers.next_job_id.fetch_add(1, Ordering::SeqCst));
        let title = metadata.title.clone();

        self.registry
            .create(Job::new(id.clone(), url.clone(), metadata))
            .await?;

        tracing::info!(job_id = %id, url = %url, title = %title, "Download queued");

        self.emit_event(Event::Queued {
            id: id.clone(),
            url: url.clone(),
            title,
        });

        self.spawn_worker(&mut active, id.clone(), url);

        Ok(id)
    }
}
