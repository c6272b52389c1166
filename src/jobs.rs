//! Background ingestion job registry.
//!
//! A [`JobStore`] is an explicit, cloneable handle to an in-memory map of job
//! records. It is created by the caller (the server owns one) and passed to
//! [`crate::ingest::Indexer::spawn_ingest`]; there is no global registry.
//!
//! Jobs move `running → done` or `running → error` exactly once. Records are
//! kept for the lifetime of the store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::models::IndexMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Running,
    Done,
    Error,
}

/// Snapshot of one ingestion job.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub id: String,
    pub state: JobState,
    pub only_file: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Set when the job finished successfully.
    pub meta: Option<IndexMeta>,
    /// Set when the job failed.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<String, JobStatus>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new running job and returns its id.
    pub fn create(&self, only_file: Option<String>) -> String {
        let id = Uuid::new_v4().to_string();
        let status = JobStatus {
            id: id.clone(),
            state: JobState::Running,
            only_file,
            started_at: Utc::now(),
            finished_at: None,
            meta: None,
            error: None,
        };
        self.write().insert(id.clone(), status);
        id
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.read().get(id).cloned()
    }

    /// All jobs, oldest first.
    pub fn list(&self) -> Vec<JobStatus> {
        let mut jobs: Vec<JobStatus> = self.read().values().cloned().collect();
        jobs.sort_by(|a, b| a.started_at.cmp(&b.started_at).then(a.id.cmp(&b.id)));
        jobs
    }

    pub fn mark_done(&self, id: &str, meta: IndexMeta) {
        self.finish(id, |job| {
            job.state = JobState::Done;
            job.meta = Some(meta);
        });
    }

    pub fn mark_error(&self, id: &str, error: impl Into<String>) {
        let error = error.into();
        self.finish(id, |job| {
            job.state = JobState::Error;
            job.error = Some(error);
        });
    }

    /// Applies a terminal transition. Finished jobs are never changed again.
    fn finish(&self, id: &str, apply: impl FnOnce(&mut JobStatus)) {
        let mut jobs = self.write();
        match jobs.get_mut(id) {
            Some(job) if job.state == JobState::Running => {
                apply(job);
                job.finished_at = Some(Utc::now());
            }
            Some(job) => {
                tracing::debug!(job_id = id, state = ?job.state, "job already finished");
            }
            None => tracing::warn!(job_id = id, "unknown job id"),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, JobStatus>> {
        self.jobs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, JobStatus>> {
        self.jobs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
