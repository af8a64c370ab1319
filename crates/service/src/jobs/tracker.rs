use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub name: String,
    pub org_id: Option<Uuid>,
    pub status: JobStatus,
    pub attempts: u32,
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
    pub queued_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Finished records kept before the oldest are pruned.
const MAX_FINISHED: usize = 10_000;

/// Shared job status table
#[derive(Clone, Default)]
pub struct JobTracker {
    records: Arc<DashMap<Uuid, JobRecord>>,
}

impl JobTracker {
    pub fn queued(&self, id: Uuid, name: &str, org_id: Option<Uuid>) {
        if self.records.len() >= MAX_FINISHED {
            self.prune();
        }
        self.records.insert(id, JobRecord {
            id,
            name: name.to_string(),
            org_id,
            status: JobStatus::Queued,
            attempts: 0,
            output: None,
            error: None,
            queued_at: Utc::now(),
            finished_at: None,
        });
    }

    pub fn running(&self, id: Uuid, attempt: u32) {
        if let Some(mut r) = self.records.get_mut(&id) {
            r.status = JobStatus::Running;
            r.attempts = attempt;
        }
    }

    pub fn succeeded(&self, id: Uuid, output: serde_json::Value) {
        if let Some(mut r) = self.records.get_mut(&id) {
            r.status = JobStatus::Succeeded;
            r.output = Some(output);
            r.error = None;
            r.finished_at = Some(Utc::now());
        }
    }

    pub fn failed(&self, id: Uuid, error: String) {
        if let Some(mut r) = self.records.get_mut(&id) {
            r.status = JobStatus::Failed;
            r.error = Some(error);
            r.finished_at = Some(Utc::now());
        }
    }

    pub fn get(&self, id: Uuid) -> Option<JobRecord> {
        self.records.get(&id).map(|r| r.clone())
    }

    pub fn list(&self) -> Vec<JobRecord> {
        let mut all: Vec<JobRecord> = self.records.iter().map(|r| r.clone()).collect();
        all.sort_by_key(|r| r.queued_at);
        all
    }

    pub fn list_for_org(&self, org_id: Uuid) -> Vec<JobRecord> {
        self.list().into_iter().filter(|r| r.org_id == Some(org_id)).collect()
    }

    /// Drop the older half of finished records.
    fn prune(&self) {
        let mut finished: Vec<(DateTime<Utc>, Uuid)> = self
            .records
            .iter()
            .filter_map(|r| r.finished_at.map(|at| (at, r.id)))
            .collect();
        finished.sort();
        for (_, id) in finished.iter().take(finished.len() / 2 + 1) {
            self.records.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_move_through_statuses() {
        let t = JobTracker::default();
        let id = Uuid::new_v4();
        let org = Uuid::new_v4();
        t.queued(id, "bulk_hold", Some(org));
        assert_eq!(t.get(id).unwrap().status, JobStatus::Queued);
        t.running(id, 2);
        let r = t.get(id).unwrap();
        assert_eq!((r.status, r.attempts), (JobStatus::Running, 2));
        t.succeeded(id, serde_json::json!({ "success": 1 }));
        let r = t.get(id).unwrap();
        assert_eq!(r.status, JobStatus::Succeeded);
        assert!(r.finished_at.is_some());
        assert_eq!(t.list_for_org(org).len(), 1);
        assert!(t.list_for_org(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let t = JobTracker::default();
        t.running(Uuid::new_v4(), 1);
        t.failed(Uuid::new_v4(), "x".into());
        assert!(t.list().is_empty());
    }
}
