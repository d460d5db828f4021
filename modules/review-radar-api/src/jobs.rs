use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use review_radar_common::{AnalysisResult, ReviewRadarError};

/// Structured failure exposed to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl From<&ReviewRadarError> for ErrorDetail {
    fn from(err: &ReviewRadarError) -> Self {
        let message = match err {
            // Internal details stay in the logs.
            ReviewRadarError::Anyhow(_) => "An unexpected error occurred.".to_string(),
            other => other.to_string(),
        };
        Self {
            code: err.code().to_string(),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Pending,
    Done(Arc<AnalysisResult>),
    Error(ErrorDetail),
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done(_) => "done",
            Self::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory job table. A job leaves `Pending` exactly once, with either a
/// complete result or an error; nothing in between is ever stored.
///
/// Finished jobs are kept for `ttl` after they finish and are swept on the
/// next submission. Pending jobs are never evicted.
#[derive(Clone)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
    ttl: chrono::Duration,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}

const DEFAULT_TTL_SECS: u64 = 3600;

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            jobs: Arc::default(),
            // Out-of-range values mean "keep forever".
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut jobs = self.jobs.write().await;
        self.sweep_locked(&mut jobs, now);
        jobs.insert(
            id,
            Job {
                state: JobState::Pending,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    /// Drop finished jobs older than the TTL. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let mut jobs = self.jobs.write().await;
        self.sweep_locked(&mut jobs, Utc::now())
    }

    fn sweep_locked(&self, jobs: &mut HashMap<Uuid, Job>, now: DateTime<Utc>) -> usize {
        let before = jobs.len();
        jobs.retain(|_, job| {
            job.state == JobState::Pending || now.signed_duration_since(job.updated_at) < self.ttl
        });
        let removed = before - jobs.len();
        if removed > 0 {
            debug!(removed, remaining = jobs.len(), "Evicted expired jobs");
        }
        removed
    }

    /// Commit the outcome of a job. Ignored if the job already finished.
    pub async fn finish(&self, id: Uuid, outcome: Result<AnalysisResult, ReviewRadarError>) {
        let state = match outcome {
            Ok(result) => JobState::Done(Arc::new(result)),
            Err(err) => JobState::Error(ErrorDetail::from(&err)),
        };

        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&id) {
            if job.state == JobState::Pending {
                job.state = state;
                job.updated_at = Utc::now();
            }
        }
    }

    pub async fn get(&self, id: &Uuid) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_job_is_pending() {
        let store = JobStore::new();
        let id = store.create().await;
        let job = store.get(&id).await.unwrap();
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.created_at, job.updated_at);
    }

    #[tokio::test]
    async fn error_is_committed_with_code() {
        let store = JobStore::new();
        let id = store.create().await;
        store
            .finish(id, Err(ReviewRadarError::ScrapeDisallowed("https://x".into())))
            .await;

        let job = store.get(&id).await.unwrap();
        match job.state {
            JobState::Error(detail) => assert_eq!(detail.code, "scrape_disallowed"),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn finished_job_is_not_overwritten() {
        let store = JobStore::new();
        let id = store.create().await;
        store
            .finish(id, Err(ReviewRadarError::Analysis("timed out".into())))
            .await;
        store
            .finish(id, Err(ReviewRadarError::Input("late".into())))
            .await;

        let state = store.get(&id).await.unwrap().state;
        assert_eq!(
            state,
            JobState::Error(ErrorDetail {
                code: "analysis_failed".into(),
                message: "Analysis failed: timed out".into(),
            })
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err: ReviewRadarError = anyhow::anyhow!("db password wrong").into();
        let detail = ErrorDetail::from(&err);
        assert_eq!(detail.code, "internal_error");
        assert!(!detail.message.contains("password"));
    }

    #[tokio::test]
    async fn expired_finished_jobs_are_evicted_on_submit() {
        let store = JobStore::with_ttl(Duration::ZERO);
        let finished = store.create().await;
        let pending = store.create().await;
        store
            .finish(finished, Err(ReviewRadarError::Input("empty".into())))
            .await;

        let fresh = store.create().await;

        assert!(store.get(&finished).await.is_none());
        assert_eq!(store.get(&pending).await.unwrap().state, JobState::Pending);
        assert!(store.get(&fresh).await.is_some());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn finished_jobs_survive_within_ttl() {
        let store = JobStore::with_ttl(Duration::from_secs(3600));
        let id = store.create().await;
        store
            .finish(id, Err(ReviewRadarError::Input("empty".into())))
            .await;

        assert_eq!(store.sweep().await, 0);
        assert!(store.get(&id).await.is_some());
    }

    #[tokio::test]
    async fn unknown_job_is_none() {
        let store = JobStore::new();
        assert!(store.get(&Uuid::new_v4()).await.is_none());
        assert_eq!(store.len().await, 0);
    }
}
