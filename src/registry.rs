//! In-memory job registry
//!
//! The registry is the single source of truth for progress polling. It is an
//! explicitly owned object shared through an `Arc`, not ambient global state.
//! Every operation takes the lock for its whole read or merge, so a poller
//! never observes a partially applied update.
//!
//! Jobs are never evicted; the registry grows with the number of submissions
//! for the lifetime of the process.

use crate::error::{Error, Result};
use crate::types::{Job, JobId, JobSnapshot, JobState, JobStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// A change requested by a download worker
#[derive(Clone, Debug, PartialEq)]
pub enum JobUpdate {
    /// New progress reading while downloading
    Progress {
        /// Percentage 0-100
        progress: u8,
        /// Bytes written so far
        downloaded_bytes: u64,
        /// Expected size (0 when unknown)
        total_bytes: u64,
    },
    /// The output file is complete
    Complete {
        /// Location of the output file
        file_path: PathBuf,
        /// Size of the output file on disk
        file_size: u64,
    },
    /// The download failed
    Fail {
        /// Error message
        error: String,
    },
}

/// What an [`update`](JobRegistry::update) call did
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOutcome {
    /// The update was merged; carries the new snapshot
    Applied(JobSnapshot),
    /// The job was already terminal and was left untouched
    Ignored(JobSnapshot),
}

impl UpdateOutcome {
    /// Whether the update changed the job
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied(_))
    }

    /// Snapshot after the call
    pub fn snapshot(&self) -> &JobSnapshot {
        match self {
            UpdateOutcome::Applied(s) | UpdateOutcome::Ignored(s) => s,
        }
    }
}

#[derive(Default)]
struct Store {
    /// Jobs in insertion order
    jobs: Vec<Job>,
    /// id -> position in `jobs`
    index: HashMap<JobId, usize>,
}

impl Store {
    fn get_mut(&mut self, id: &JobId) -> Option<&mut Job> {
        let pos = *self.index.get(id)?;
        self.jobs.get_mut(pos)
    }
}

/// Thread-safe store of jobs keyed by identifier
#[derive(Default)]
pub struct JobRegistry {
    inner: RwLock<Store>,
}

impl JobRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new job
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateJob`] if a job with the same identifier exists.
    pub async fn create(&self, job: Job) -> Result<JobSnapshot> {
        let mut store = self.inner.write().await;
        if store.index.contains_key(&job.id) {
            return Err(Error::DuplicateJob(job.id.to_string()));
        }

        let snapshot = job.snapshot();
        let pos = store.jobs.len();
        store.index.insert(job.id.clone(), pos);
        store.jobs.push(job);
        Ok(snapshot)
    }

    /// Merge an update into an existing job
    ///
    /// Progress never decreases while downloading and is clamped to 100.
    /// Terminal jobs are left untouched and reported as
    /// [`UpdateOutcome::Ignored`].
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the identifier is unknown.
    pub async fn update(&self, id: &JobId, update: JobUpdate) -> Result<UpdateOutcome> {
        let mut store = self.inner.write().await;
        let job = store
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let JobState::Downloading {
            progress: current,
            downloaded_bytes,
            total_bytes,
        } = job.state
        else {
            return Ok(UpdateOutcome::Ignored(job.snapshot()));
        };

        job.state = match update {
            JobUpdate::Progress {
                progress,
                downloaded_bytes,
                total_bytes,
            } => JobState::Downloading {
                progress: current.max(progress.min(100)),
                downloaded_bytes,
                total_bytes,
            },
            JobUpdate::Complete {
                file_path,
                file_size,
            } => JobState::Completed {
                downloaded_bytes,
                total_bytes,
                file_path,
                file_size,
                finished_at: Utc::now(),
            },
            JobUpdate::Fail { error } => JobState::Failed {
                progress: current,
                downloaded_bytes,
                total_bytes,
                error,
                finished_at: Utc::now(),
            },
        };

        Ok(UpdateOutcome::Applied(job.snapshot()))
    }

    /// Current snapshot of a job
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the identifier is unknown.
    pub async fn get(&self, id: &JobId) -> Result<JobSnapshot> {
        let store = self.inner.read().await;
        store
            .index
            .get(id)
            .and_then(|&pos| store.jobs.get(pos))
            .map(Job::snapshot)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Whether a job with this identifier exists
    pub async fn contains(&self, id: &JobId) -> bool {
        self.inner.read().await.index.contains_key(id)
    }

    /// All jobs in insertion order
    pub async fn list(&self) -> Vec<JobSnapshot> {
        self.inner.read().await.jobs.iter().map(Job::snapshot).collect()
    }

    /// Completed jobs in insertion order
    pub async fn list_completed(&self) -> Vec<JobSnapshot> {
        self.inner
            .read()
            .await
            .jobs
            .iter()
            .filter(|job| job.state.status() == JobStatus::Completed)
            .map(Job::snapshot)
            .collect()
    }

    /// Number of jobs
    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    /// Whether the registry holds no jobs
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.jobs.is_empty()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VideoMetadata;
    use std::sync::Arc;

    fn job(id: &str) -> Job {
        Job::new(
            JobId::from(id),
            format!("https://www.youtube.com/watch?v={id}"),
            VideoMetadata {
                title: format!("video {id}"),
                ..Default::default()
            },
        )
    }

    fn progress(progress: u8) -> JobUpdate {
        JobUpdate::Progress {
            progress,
            downloaded_bytes: progress as u64 * 10,
            total_bytes: 1000,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = JobRegistry::new();
        let created = registry.create(job("0")).await.unwrap();

        assert_eq!(created.status, JobStatus::Downloading);
        assert_eq!(created.progress, 0);
        assert_eq!(registry.get(&JobId::from("0")).await.unwrap(), created);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_duplicate_is_rejected() {
        let registry = JobRegistry::new();
        registry.create(job("0")).await.unwrap();

        let err = registry.create(job("0")).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateJob(ref id) if id == "0"));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let registry = JobRegistry::new();
        assert!(matches!(
            registry.get(&JobId::from("9")).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            registry.update(&JobId::from("9"), progress(10)).await,
            Err(Error::NotFound(_))
        ));

        registry.create(job("0")).await.unwrap();
        assert!(matches!(
            registry.get(&JobId::from("9")).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_progress_never_decreases() {
        let registry = JobRegistry::new();
        let id = JobId::from("0");
        registry.create(job("0")).await.unwrap();

        registry.update(&id, progress(40)).await.unwrap();
        let outcome = registry.update(&id, progress(25)).await.unwrap();

        assert!(outcome.is_applied());
        let snap = registry.get(&id).await.unwrap();
        assert_eq!(snap.progress, 40);
        // byte counters follow the latest reading
        assert_eq!(snap.downloaded_bytes, 250);
    }

    #[tokio::test]
    async fn test_progress_is_clamped() {
        let registry = JobRegistry::new();
        let id = JobId::from("0");
        registry.create(job("0")).await.unwrap();

        registry.update(&id, progress(250)).await.unwrap();
        assert_eq!(registry.get(&id).await.unwrap().progress, 100);
    }

    #[tokio::test]
    async fn test_complete_sets_file_fields() {
        let registry = JobRegistry::new();
        let id = JobId::from("0");
        registry.create(job("0")).await.unwrap();
        registry.update(&id, progress(90)).await.unwrap();

        registry
            .update(
                &id,
                JobUpdate::Complete {
                    file_path: PathBuf::from("downloads/0.mp4"),
                    file_size: 4096,
                },
            )
            .await
            .unwrap();

        let snap = registry.get(&id).await.unwrap();
        assert_eq!(snap.status, JobStatus::Completed);
        assert_eq!(snap.progress, 100);
        assert_eq!(snap.file_path, Some(PathBuf::from("downloads/0.mp4")));
        assert_eq!(snap.file_size, Some(4096));
        assert!(snap.error.is_none());
        assert!(snap.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_terminal_states_absorb_updates() {
        let registry = JobRegistry::new();
        let done = JobId::from("0");
        let failed = JobId::from("1");
        registry.create(job("0")).await.unwrap();
        registry.create(job("1")).await.unwrap();

        registry
            .update(
                &done,
                JobUpdate::Complete {
                    file_path: PathBuf::from("downloads/0.mp4"),
                    file_size: 10,
                },
            )
            .await
            .unwrap();
        registry
            .update(
                &failed,
                JobUpdate::Fail {
                    error: "HTTP Error 404".into(),
                },
            )
            .await
            .unwrap();

        let before_done = registry.get(&done).await.unwrap();
        let before_failed = registry.get(&failed).await.unwrap();

        for update in [
            progress(5),
            JobUpdate::Fail {
                error: "late".into(),
            },
            JobUpdate::Complete {
                file_path: PathBuf::from("other.mp4"),
                file_size: 1,
            },
        ] {
            let outcome = registry.update(&done, update.clone()).await.unwrap();
            assert!(!outcome.is_applied());
            let outcome = registry.update(&failed, update).await.unwrap();
            assert!(!outcome.is_applied());
        }

        assert_eq!(registry.get(&done).await.unwrap(), before_done);
        assert_eq!(registry.get(&failed).await.unwrap(), before_failed);
    }

    #[tokio::test]
    async fn test_fail_keeps_progress_reached() {
        let registry = JobRegistry::new();
        let id = JobId::from("0");
        registry.create(job("0")).await.unwrap();
        registry.update(&id, progress(60)).await.unwrap();

        registry
            .update(
                &id,
                JobUpdate::Fail {
                    error: "connection reset".into(),
                },
            )
            .await
            .unwrap();

        let snap = registry.get(&id).await.unwrap();
        assert_eq!(snap.status, JobStatus::Failed);
        assert_eq!(snap.progress, 60);
        assert_eq!(snap.error.as_deref(), Some("connection reset"));
        assert!(snap.file_path.is_none());
    }

    #[tokio::test]
    async fn test_list_completed_in_insertion_order() {
        let registry = JobRegistry::new();
        for id in ["0", "1", "2", "3"] {
            registry.create(job(id)).await.unwrap();
        }
        for id in ["3", "0", "2"] {
            registry
                .update(
                    &JobId::from(id),
                    JobUpdate::Complete {
                        file_path: PathBuf::from(format!("downloads/{id}.mp4")),
                        file_size: 1,
                    },
                )
                .await
                .unwrap();
        }

        let ids: Vec<String> = registry
            .list_completed()
            .await
            .into_iter()
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(ids, vec!["0", "2", "3"]);
        assert_eq!(registry.list().await.len(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_updates_and_reads_are_consistent() {
        let registry = Arc::new(JobRegistry::new());
        let id = JobId::from("0");
        registry.create(job("0")).await.unwrap();

        let writer = {
            let registry = registry.clone();
            let id = id.clone();
            tokio::spawn(async move {
                for p in 0..=100u8 {
                    registry
                        .update(
                            &id,
                            JobUpdate::Progress {
                                progress: p,
                                downloaded_bytes: p as u64,
                                total_bytes: 100,
                            },
                        )
                        .await
                        .unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        let reader = {
            let registry = registry.clone();
            let id = id.clone();
            tokio::spawn(async move {
                let mut last = 0;
                for _ in 0..200 {
                    let snap = registry.get(&id).await.unwrap();
                    // progress and bytes always come from the same update
                    assert_eq!(snap.progress as u64, snap.downloaded_bytes);
                    assert!(snap.progress >= last);
                    last = snap.progress;
                    tokio::task::yield_now().await;
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
        assert_eq!(registry.get(&id).await.unwrap().progress, 100);
    }
}
