//! Bulk hold jobs. Each item is assessed and applied on its own; one bad
//! item never aborts the batch. Only a failed selection query fails the job.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::hold::domain::Scenario;
use crate::hold::{HoldError, SkipReason};
use crate::jobs::JobError;
use crate::metrics;

pub mod create;
pub mod end;

pub use create::{BulkCreateHoldByGroupJob, BulkHoldJob};
pub use end::{BulkEndHoldByGroupJob, BulkEndHoldJob};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
    pub message: String,
}

/// Aggregate outcome of a bulk job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub skip_reasons: BTreeMap<SkipReason, usize>,
    pub scenarios: BTreeMap<Scenario, usize>,
    pub errors: Vec<ItemError>,
}

impl BulkReport {
    pub(crate) fn succeeded(&mut self, job: &'static str, scenario: Option<Scenario>) {
        self.total += 1;
        self.success += 1;
        if let Some(s) = scenario {
            *self.scenarios.entry(s).or_default() += 1;
        }
        metrics::record_bulk_item(job, "success");
    }

    /// Rejections are skips; anything else is a failure.
    pub(crate) fn record_error(&mut self, job: &'static str, id: Uuid, err: HoldError) {
        self.total += 1;
        match err {
            HoldError::Rejected(r) => {
                let reason = r.skip_reason();
                self.skipped += 1;
                *self.skip_reasons.entry(reason).or_default() += 1;
                self.errors.push(ItemError { id, reason: Some(reason), message: r.to_string() });
                metrics::record_bulk_item(job, "skipped");
            }
            other => {
                warn!(job, item = %id, error = %other, "bulk item failed");
                self.failed += 1;
                self.errors.push(ItemError { id, reason: None, message: other.to_string() });
                metrics::record_bulk_item(job, "failed");
            }
        }
    }

    pub(crate) fn log_summary(&self, job: &'static str, org_id: Uuid) {
        info!(
            job,
            org_id = %org_id,
            total = self.total,
            success = self.success,
            failed = self.failed,
            skipped = self.skipped,
            "bulk_job_finished"
        );
    }
}

pub(crate) fn selection_failed(job: &'static str, err: HoldError) -> JobError {
    warn!(job, error = %err, "bulk selection failed");
    JobError::Systemic(format!("selection failed: {err}"))
}

/// Ids asked for but not returned by the (org-scoped) selection.
pub(crate) fn missing_ids(requested: &[Uuid], found: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let found: std::collections::HashSet<Uuid> = found.into_iter().collect();
    let mut seen = std::collections::HashSet::new();
    requested.iter().copied().filter(|id| !found.contains(id) && seen.insert(*id)).collect()
}

pub(crate) fn to_output(report: &BulkReport) -> Result<serde_json::Value, JobError> {
    serde_json::to_value(report).map_err(|e| JobError::Systemic(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hold::Rejection;

    #[test]
    fn report_classifies_outcomes() {
        let mut r = BulkReport::default();
        r.succeeded("test", Some(Scenario::ActiveMembershipNewHold));
        r.record_error("test", Uuid::new_v4(), Rejection::HoldsDisabled.into());
        r.record_error("test", Uuid::new_v4(), HoldError::Persistence("down".into()));
        assert_eq!((r.total, r.success, r.skipped, r.failed), (3, 1, 1, 1));
        assert_eq!(r.skip_reasons.get(&SkipReason::HoldsDisabled), Some(&1));
        assert_eq!(r.errors.len(), 2);

        let v = to_output(&r).unwrap();
        assert_eq!(v["skip_reasons"]["holds_disabled"], 1);
        assert_eq!(v["scenarios"]["active_membership_new_hold"], 1);
    }

    #[test]
    fn missing_ids_are_deduplicated() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(missing_ids(&[a, b, b], [a]), vec![b]);
    }
}
