//! In-process job queue. Bulk hold work, notifications and legacy hand-off
//! run on worker tasks under a per-job retry policy.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

pub mod retry;
pub mod queue;
pub mod tracker;

pub use queue::JobQueue;
pub use retry::RetryPolicy;
pub use tracker::{JobRecord, JobStatus, JobTracker};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum JobError {
    #[error("systemic failure: {0}")]
    Systemic(String),
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("job queue is closed")]
    QueueClosed,
}

#[async_trait]
pub trait Job: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn policy(&self) -> RetryPolicy;

    /// Org the job acts on, for status lookups.
    fn org_id(&self) -> Option<Uuid> { None }

    async fn handle(&self) -> Result<serde_json::Value, JobError>;

    /// Called once every attempt has failed.
    async fn failed(&self, err: &JobError) {
        error!(job = self.name(), error = %err, "job failed permanently");
    }
}
