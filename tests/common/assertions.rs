//! Custom test assertions for integration tests

use media_dl::{Event, JobId, JobStatus, MediaDownloader};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

/// Result of waiting for a job to settle
#[derive(Debug, PartialEq)]
pub enum WaitResult {
    /// Job completed; carries the file size
    Completed(u64),
    /// Job failed with error
    Failed(String),
    /// Timeout waiting for a terminal event
    Timeout,
    /// Channel closed unexpectedly
    ChannelClosed,
}

/// Wait for a job to reach a terminal state via the event stream
///
/// Subscribe before submitting, otherwise the terminal event may already
/// have been sent.
pub async fn wait_for_completion(
    events: &mut broadcast::Receiver<Event>,
    id: &JobId,
    timeout: Duration,
) -> WaitResult {
    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(Event::Completed {
                    id: event_id,
                    file_size,
                    ..
                }) if &event_id == id => return WaitResult::Completed(file_size),
                Ok(Event::Failed {
                    id: event_id,
                    error,
                }) if &event_id == id => return WaitResult::Failed(error),
                Ok(_) => continue,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return WaitResult::ChannelClosed,
            }
        }
    })
    .await;

    result.unwrap_or(WaitResult::Timeout)
}

/// Assert that a job has the expected status
pub async fn assert_job_status(downloader: &MediaDownloader, id: &JobId, expected: JobStatus) {
    let job = downloader.get_job(id).await.expect("job should exist");
    assert_eq!(
        job.status, expected,
        "job {} has status {:?}, expected {:?}",
        id, job.status, expected
    );
}

/// Assert that a completed job's file exists with the recorded size
pub async fn assert_file_matches(downloader: &MediaDownloader, id: &JobId) {
    let job = downloader.get_job(id).await.expect("job should exist");
    let path = job
        .file_path
        .expect("completed job should have a file path");
    let size = std::fs::metadata(&path)
        .unwrap_or_else(|e| panic!("{} should exist: {}", path.display(), e))
        .len();
    assert_eq!(Some(size), job.file_size, "recorded size differs from disk");
}
