use std::sync::Arc;

use configs::QueueConfig;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, Instrument};
use uuid::Uuid;

use super::retry::run_with_policy;
use super::tracker::JobTracker;
use super::{Job, JobError};
use crate::metrics::{JOB_ATTEMPTS_TOTAL, JOB_FAILURES_TOTAL};

struct Envelope {
    id: Uuid,
    job: Arc<dyn Job>,
}

enum Inbox {
    Bounded(mpsc::Receiver<Envelope>),
    Unbounded(mpsc::UnboundedReceiver<Envelope>),
}

impl Inbox {
    async fn recv(&mut self) -> Option<Envelope> {
        match self {
            Inbox::Bounded(rx) => rx.recv().await,
            Inbox::Unbounded(rx) => rx.recv().await,
        }
    }
}

/// Two lanes drained by separate worker sets.
///
/// - `enqueue`: bounded lane for top-level work (bulk jobs). Callers wait for capacity.
/// - `enqueue_follow_up`: unbounded lane for single-item work produced while
///   another job runs (notifications, legacy hand-offs). Sending never waits.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<Envelope>,
    follow_ups: mpsc::UnboundedSender<Envelope>,
    tracker: JobTracker,
}

impl JobQueue {
    /// Spawn `cfg.workers` workers per lane on the current runtime.
    pub fn start(cfg: &QueueConfig) -> Self {
        let (tx, rx) = mpsc::channel(cfg.capacity.max(1));
        let (follow_ups, follow_rx) = mpsc::unbounded_channel();
        let tracker = JobTracker::default();
        let workers = cfg.workers.max(1);
        spawn_lane("main", workers, Inbox::Bounded(rx), &tracker);
        spawn_lane("follow_up", workers, Inbox::Unbounded(follow_rx), &tracker);
        info!(workers, capacity = cfg.capacity, "job queue started");
        Self { tx, follow_ups, tracker }
    }

    pub async fn enqueue(&self, job: Arc<dyn Job>) -> Result<Uuid, JobError> {
        let id = Uuid::new_v4();
        let name = job.name();
        self.tracker.queued(id, name, job.org_id());
        if self.tx.send(Envelope { id, job }).await.is_err() {
            self.tracker.failed(id, JobError::QueueClosed.to_string());
            return Err(JobError::QueueClosed);
        }
        info!(job_id = %id, job = name, "job_enqueued");
        Ok(id)
    }

    pub fn enqueue_follow_up(&self, job: Arc<dyn Job>) -> Result<Uuid, JobError> {
        let id = Uuid::new_v4();
        let name = job.name();
        self.tracker.queued(id, name, job.org_id());
        if self.follow_ups.send(Envelope { id, job }).is_err() {
            self.tracker.failed(id, JobError::QueueClosed.to_string());
            return Err(JobError::QueueClosed);
        }
        debug!(job_id = %id, job = name, "follow_up_enqueued");
        Ok(id)
    }

    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }
}

fn spawn_lane(lane: &'static str, workers: usize, inbox: Inbox, tracker: &JobTracker) {
    let inbox = Arc::new(Mutex::new(inbox));
    for worker in 0..workers {
        let inbox = inbox.clone();
        let tracker = tracker.clone();
        tokio::spawn(async move { worker_loop(lane, worker, inbox, tracker).await });
    }
}

async fn worker_loop(lane: &'static str, worker: usize, inbox: Arc<Mutex<Inbox>>, tracker: JobTracker) {
    loop {
        let next = { inbox.lock().await.recv().await };
        let Some(Envelope { id, job }) = next else {
            debug!(lane, worker, "job queue closed; worker exiting");
            break;
        };
        let span = tracing::info_span!("job", job_id = %id, job = job.name(), lane, worker);
        execute(id, job, &tracker).instrument(span).await;
    }
}

async fn execute(id: Uuid, job: Arc<dyn Job>, tracker: &JobTracker) {
    let name = job.name();
    let policy = job.policy();
    let result = run_with_policy(
        &policy,
        |attempt| {
            tracker.running(id, attempt);
            JOB_ATTEMPTS_TOTAL.with_label_values(&[name]).inc();
        },
        || job.handle(),
    )
    .await;
    match result {
        Ok(output) => {
            tracker.succeeded(id, output);
            info!("job_succeeded");
        }
        Err(e) => {
            tracker.failed(id, e.to_string());
            JOB_FAILURES_TOTAL.with_label_values(&[name]).inc();
            job.failed(&e).await;
        }
    }
}
