//! Per-job download worker.
//!
//! One worker runs per job. It drives the extractor, applies every progress
//! record to the registry and settles the job as completed or failed. Nothing
//! a worker does can reach the submitter; every failure ends up in the job's
//! `error` field.

use crate::error::{Error, Result};
use crate::extractor::DownloadRequest;
use crate::progress::{ProgressSample, ProgressStatus, RawProgress};
use crate::registry::{JobUpdate, UpdateOutcome};
use crate::types::{Event, JobId};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::MediaDownloader;

/// Failure message when the extractor returns cleanly without a file
pub(crate) const NO_FILE_PRODUCED: &str = "extractor exited without producing a file";

/// What applying one progress record did to the job
#[derive(Debug, PartialEq)]
enum RecordOutcome {
    /// The job is still downloading
    Continue,
    /// The job reached a terminal state
    Settled,
}

impl MediaDownloader {
    /// Deterministic output location for a job
    pub fn output_path(&self, id: &JobId) -> PathBuf {
        self.config.download.download_dir.join(format!(
            "{}.{}",
            id,
            self.config.download.file_extension
        ))
    }

    /// Spawn the worker for a freshly created job and track its handle
    ///
    /// Takes the already-locked worker map so the caller's admission check
    /// and the insertion happen under one lock.
    pub(crate) fn spawn_worker(
        &self,
        active: &mut HashMap<JobId, JoinHandle<()>>,
        id: JobId,
        url: String,
    ) {
        let downloader = self.clone();
        let job_id = id.clone();
        let handle = tokio::spawn(async move { downloader.run_worker(job_id, url).await });

        active.retain(|_, h| !h.is_finished());
        active.insert(id, handle);
    }

    /// Run one download to a terminal state
    ///
    /// A panic anywhere in the download path is caught and recorded as a
    /// failure so the job never stays `downloading` forever.
    async fn run_worker(self, id: JobId, url: String) {
        let request = DownloadRequest {
            url,
            output_path: self.output_path(&id),
            format: self.config.download.format.clone(),
            skip_certificate_check: self.config.extractor.skip_certificate_check,
            extra_args: self.config.extractor.extra_args.clone(),
        };

        tracing::info!(
            job_id = %id,
            url = %request.url,
            output = %request.output_path.display(),
            extractor = self.extractor.name(),
            "Starting download"
        );

        let outcome = AssertUnwindSafe(self.drive_download(&id, &request))
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(job_error_message(e)),
            Err(payload) => Some(panic_message(payload)),
        };

        if let Some(error) = failure {
            self.fail_job(&id, error).await;
        }
    }

    /// Run the extractor and the progress consumer side by side
    ///
    /// A clean extractor exit settles the job from the output file when no
    /// record did so already; merged formats only produce the final file
    /// after the last per-stream `finished` record.
    async fn drive_download(&self, id: &JobId, request: &DownloadRequest) -> Result<()> {
        // a leftover file from an earlier process would pass for this job's output
        match tokio::fs::remove_file(&request.output_path).await {
            Ok(()) => {
                tracing::debug!(job_id = %id, path = %request.output_path.display(), "Removed stale output file");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to remove stale file '{}': {}",
                        request.output_path.display(),
                        e
                    ),
                )));
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();

        let (download_result, settled) = tokio::join!(
            self.extractor.download(request, tx),
            self.consume_progress(id, &request.output_path, rx)
        );

        match (settled, download_result) {
            (true, Ok(())) => Ok(()),
            (true, Err(e)) => {
                tracing::warn!(job_id = %id, error = %e, "Extractor reported an error after the job settled");
                Ok(())
            }
            (false, Err(e)) => Err(e),
            (false, Ok(())) => {
                let produced = tokio::fs::try_exists(&request.output_path)
                    .await
                    .unwrap_or(false);
                if !produced {
                    return Err(Error::Extractor(NO_FILE_PRODUCED.to_string()));
                }
                self.complete_job(id, &request.output_path).await
            }
        }
    }

    /// Apply records until the extractor drops its sender
    ///
    /// Returns whether the job reached a terminal state. Once it has, later
    /// records are drained and discarded.
    async fn consume_progress(
        &self,
        id: &JobId,
        output_path: &Path,
        mut rx: mpsc::UnboundedReceiver<RawProgress>,
    ) -> bool {
        let mut settled = false;

        while let Some(record) = rx.recv().await {
            if settled {
                continue;
            }
            match self.apply_record(id, output_path, record).await {
                Ok(RecordOutcome::Continue) => {}
                Ok(RecordOutcome::Settled) => settled = true,
                Err(e) => {
                    let message = job_error_message(e);
                    self.diagnostic(id, format!("progress handling failed: {}", message));
                    self.fail_job(id, message).await;
                    settled = true;
                }
            }
        }

        settled
    }

    async fn apply_record(
        &self,
        id: &JobId,
        output_path: &Path,
        record: RawProgress,
    ) -> Result<RecordOutcome> {
        match record.status {
            ProgressStatus::Downloading => {
                let sample = ProgressSample::from_raw(&record);
                for issue in &sample.issues {
                    self.diagnostic(id, issue.clone());
                }

                let outcome = self
                    .registry
                    .update(
                        id,
                        JobUpdate::Progress {
                            progress: sample.percent,
                            downloaded_bytes: sample.downloaded_bytes,
                            total_bytes: sample.total_bytes,
                        },
                    )
                    .await?;

                match outcome {
                    UpdateOutcome::Applied(snapshot) => {
                        self.emit_event(Event::Downloading {
                            id: id.clone(),
                            percent: snapshot.progress,
                            downloaded_bytes: snapshot.downloaded_bytes,
                            total_bytes: snapshot.total_bytes,
                        });
                        Ok(RecordOutcome::Continue)
                    }
                    UpdateOutcome::Ignored(_) => Ok(RecordOutcome::Settled),
                }
            }
            ProgressStatus::Finished => {
                // merged formats report one finished record per stream
                if let Some(file) = record.filename.as_deref()
                    && Path::new(file) != output_path
                {
                    tracing::debug!(job_id = %id, file, "Intermediate stream finished");
                    return Ok(RecordOutcome::Continue);
                }
                self.complete_job(id, output_path).await?;
                Ok(RecordOutcome::Settled)
            }
            ProgressStatus::Other(status) => {
                self.diagnostic(id, format!("unrecognized progress status '{}'", status));
                Ok(RecordOutcome::Continue)
            }
        }
    }

    /// Mark a job completed with the size of its output file
    async fn complete_job(&self, id: &JobId, output_path: &Path) -> Result<()> {
        let file_size = tokio::fs::metadata(output_path)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to read downloaded file '{}': {}",
                        output_path.display(),
                        e
                    ),
                ))
            })?
            .len();

        let outcome = self
            .registry
            .update(
                id,
                JobUpdate::Complete {
                    file_path: output_path.to_path_buf(),
                    file_size,
                },
            )
            .await?;

        if outcome.is_applied() {
            tracing::info!(job_id = %id, file_size, "Download completed");
            self.emit_event(Event::Completed {
                id: id.clone(),
                file_path: output_path.to_path_buf(),
                file_size,
            });
        }
        Ok(())
    }

    /// Mark a job failed; a no-op if it already settled
    pub(crate) async fn fail_job(&self, id: &JobId, error: String) {
        match self
            .registry
            .update(
                id,
                JobUpdate::Fail {
                    error: error.clone(),
                },
            )
            .await
        {
            Ok(UpdateOutcome::Applied(_)) => {
                tracing::error!(job_id = %id, error = %error, "Download failed");
                self.emit_event(Event::Failed {
                    id: id.clone(),
                    error,
                });
            }
            Ok(UpdateOutcome::Ignored(snapshot)) => {
                tracing::debug!(
                    job_id = %id,
                    status = %snapshot.status,
                    error = %error,
                    "Ignoring failure for settled job"
                );
            }
            Err(e) => {
                tracing::error!(job_id = %id, error = %e, "Failed to record download failure");
            }
        }
    }

    fn diagnostic(&self, id: &JobId, message: String) {
        tracing::warn!(job_id = %id, message = %message, "Absorbed progress problem");
        self.emit_event(Event::Diagnostic {
            id: id.clone(),
            message,
        });
    }
}

/// Message stored on a failed job
///
/// Extractor messages are stored verbatim; everything else uses its display
/// form.
fn job_error_message(error: Error) -> String {
    match error {
        Error::Extractor(msg) | Error::NotSupported(msg) => msg,
        other => other.to_string(),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("download worker panicked: {}", detail)
}
