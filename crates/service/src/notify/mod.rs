//! Hold notifications. Delivery providers (mail, push) sit behind
//! `NotificationSink`; the service only sees `NotificationDispatcher`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::jobs::{Job, JobError, JobQueue, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldEvent {
    Created,
    Ended,
    Cancelled,
    Modified,
}

impl HoldEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Ended => "ended",
            Self::Cancelled => "cancelled",
            Self::Modified => "modified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldNotification {
    pub org_id: Uuid,
    pub hold_id: Uuid,
    pub event: HoldEvent,
    pub email: bool,
    pub push: bool,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("enqueue failed: {0}")]
    Enqueue(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Accepts a notification for asynchronous delivery.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: HoldNotification) -> Result<(), NotifyError>;
}

/// Performs the actual delivery.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &HoldNotification) -> Result<(), NotifyError>;
}

/// Sink that only records deliveries in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotificationSink;

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn deliver(&self, n: &HoldNotification) -> Result<(), NotifyError> {
        info!(
            org_id = %n.org_id,
            hold_id = %n.hold_id,
            event = n.event.as_str(),
            email = n.email,
            push = n.push,
            "hold_notification_delivered"
        );
        Ok(())
    }
}

/// Delivers through the job queue's follow-up lane with the single-item
/// retry policy.
#[derive(Clone)]
pub struct QueuedNotificationDispatcher {
    queue: JobQueue,
    sink: Arc<dyn NotificationSink>,
}

impl QueuedNotificationDispatcher {
    pub fn new(queue: JobQueue, sink: Arc<dyn NotificationSink>) -> Self { Self { queue, sink } }
}

#[async_trait]
impl NotificationDispatcher for QueuedNotificationDispatcher {
    async fn dispatch(&self, notification: HoldNotification) -> Result<(), NotifyError> {
        let job = SendHoldNotificationJob { notification, sink: self.sink.clone() };
        self.queue
            .enqueue_follow_up(Arc::new(job))
            .map(|_| ())
            .map_err(|e| NotifyError::Enqueue(e.to_string()))
    }
}

pub struct SendHoldNotificationJob {
    pub notification: HoldNotification,
    pub sink: Arc<dyn NotificationSink>,
}

#[async_trait]
impl Job for SendHoldNotificationJob {
    fn name(&self) -> &'static str { "send_hold_notification" }

    fn policy(&self) -> RetryPolicy { RetryPolicy::single_item() }

    fn org_id(&self) -> Option<Uuid> { Some(self.notification.org_id) }

    async fn handle(&self) -> Result<serde_json::Value, JobError> {
        self.sink
            .deliver(&self.notification)
            .await
            .map_err(|e| JobError::Systemic(e.to_string()))?;
        serde_json::to_value(&self.notification).map_err(|e| JobError::Systemic(e.to_string()))
    }
}

/// Recording dispatcher for tests and doc examples
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingNotificationDispatcher {
        sent: Mutex<Vec<HoldNotification>>,
    }

    impl RecordingNotificationDispatcher {
        pub fn sent(&self) -> Vec<HoldNotification> {
            self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
        }
    }

    #[async_trait]
    impl NotificationDispatcher for RecordingNotificationDispatcher {
        async fn dispatch(&self, notification: HoldNotification) -> Result<(), NotifyError> {
            self.sent.lock().unwrap_or_else(|p| p.into_inner()).push(notification);
            Ok(())
        }
    }
}
