//! Hand-off to the legacy background worker. Jobs are opaque to this crate:
//! a class name the worker understands plus a JSON payload.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::jobs::{Job, JobError, JobQueue, RetryPolicy};

#[derive(Debug, Error)]
pub enum LegacyError {
    #[error("enqueue failed: {0}")]
    Enqueue(String),
    #[error("legacy queue write failed: {0}")]
    Write(String),
}

#[async_trait]
pub trait LegacyJobDispatcher: Send + Sync {
    async fn dispatch(&self, job_class: &str, payload: Value) -> Result<(), LegacyError>;
}

/// Writes straight into the `legacy_queue` table.
pub struct SeaOrmLegacyDispatcher {
    db: DatabaseConnection,
    channel: String,
}

impl SeaOrmLegacyDispatcher {
    pub fn new(db: DatabaseConnection, channel: impl Into<String>) -> Self {
        Self { db, channel: channel.into() }
    }
}

#[async_trait]
impl LegacyJobDispatcher for SeaOrmLegacyDispatcher {
    async fn dispatch(&self, job_class: &str, payload: Value) -> Result<(), LegacyError> {
        let row = models::legacy_queue::push(&self.db, &self.channel, job_class, payload)
            .await
            .map_err(|e| LegacyError::Write(e.to_string()))?;
        debug!(id = row.id, channel = %row.channel, class = job_class, "legacy job pushed");
        Ok(())
    }
}

/// Defers the write to the job queue's follow-up lane with the single-item
/// retry policy.
#[derive(Clone)]
pub struct QueuedLegacyDispatcher {
    queue: JobQueue,
    inner: Arc<dyn LegacyJobDispatcher>,
}

impl QueuedLegacyDispatcher {
    pub fn new(queue: JobQueue, inner: Arc<dyn LegacyJobDispatcher>) -> Self { Self { queue, inner } }
}

#[async_trait]
impl LegacyJobDispatcher for QueuedLegacyDispatcher {
    async fn dispatch(&self, job_class: &str, payload: Value) -> Result<(), LegacyError> {
        let job = LegacyDispatchJob { class: job_class.to_string(), payload, inner: self.inner.clone() };
        self.queue
            .enqueue_follow_up(Arc::new(job))
            .map(|_| ())
            .map_err(|e| LegacyError::Enqueue(e.to_string()))
    }
}

pub struct LegacyDispatchJob {
    pub class: String,
    pub payload: Value,
    pub inner: Arc<dyn LegacyJobDispatcher>,
}

#[async_trait]
impl Job for LegacyDispatchJob {
    fn name(&self) -> &'static str { "legacy_dispatch" }

    fn policy(&self) -> RetryPolicy { RetryPolicy::single_item() }

    async fn handle(&self) -> Result<Value, JobError> {
        self.inner
            .dispatch(&self.class, self.payload.clone())
            .await
            .map_err(|e| JobError::Systemic(e.to_string()))?;
        Ok(serde_json::json!({ "class": self.class }))
    }
}

/// Recording dispatcher for tests and doc examples
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingLegacyDispatcher {
        dispatched: Mutex<Vec<(String, Value)>>,
        fail: Mutex<bool>,
    }

    impl RecordingLegacyDispatcher {
        pub fn dispatched(&self) -> Vec<(String, Value)> {
            self.dispatched.lock().unwrap_or_else(|p| p.into_inner()).clone()
        }

        pub fn fail(&self, fail: bool) {
            *self.fail.lock().unwrap_or_else(|p| p.into_inner()) = fail;
        }
    }

    #[async_trait]
    impl LegacyJobDispatcher for RecordingLegacyDispatcher {
        async fn dispatch(&self, job_class: &str, payload: Value) -> Result<(), LegacyError> {
            if *self.fail.lock().unwrap_or_else(|p| p.into_inner()) {
                return Err(LegacyError::Write("legacy queue offline".into()));
            }
            self.dispatched.lock().unwrap_or_else(|p| p.into_inner()).push((job_class.to_string(), payload));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::RecordingLegacyDispatcher;
    use super::*;
    use std::time::Duration;

    use sea_orm::{EntityTrait, QueryFilter, ColumnTrait};
    use crate::jobs::JobStatus;
    use crate::test_support::get_db;

    #[tokio::test(start_paused = true)]
    async fn queued_dispatch_gives_up_after_three_attempts() {
        let queue = JobQueue::start(&configs::QueueConfig { workers: 1, capacity: 8 });
        let inner = Arc::new(RecordingLegacyDispatcher::default());
        inner.fail(true);
        let dispatcher = QueuedLegacyDispatcher::new(queue.clone(), inner.clone());
        dispatcher.dispatch("HoldExpiredJob", serde_json::json!({ "hold_id": 1 })).await.unwrap();

        tokio::time::sleep(Duration::from_secs(120)).await;
        let records = queue.tracker().list();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, JobStatus::Failed);
        assert_eq!(records[0].attempts, 3);
        assert!(inner.dispatched().is_empty());
    }

    #[tokio::test]
    async fn seaorm_dispatcher_writes_queue_row() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()); };
        let channel = format!("test-{}", uuid::Uuid::new_v4().simple());
        let dispatcher = SeaOrmLegacyDispatcher::new(db.clone(), channel.clone());
        dispatcher.dispatch("HoldExpiredJob", serde_json::json!({ "hold_id": "abc" })).await?;
        let rows = models::legacy_queue::Entity::find()
            .filter(models::legacy_queue::Column::Channel.eq(channel))
            .all(&db)
            .await?;
        assert_eq!(rows.len(), 1);
        let envelope: models::legacy_queue::JobEnvelope = serde_json::from_str(&rows[0].job)?;
        assert_eq!(envelope.class, "HoldExpiredJob");
        assert_eq!(envelope.payload["hold_id"], "abc");
        Ok(())
    }
}
