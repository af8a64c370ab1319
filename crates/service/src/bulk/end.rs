use std::sync::Arc;

use async_trait::async_trait;
use models::HoldStatus;
use uuid::Uuid;

use super::{missing_ids, selection_failed, to_output, BulkReport};
use crate::hold::domain::{CancelHold, EndHold, HoldSelection};
use crate::hold::repository::HoldRepository;
use crate::hold::{HoldError, HoldService};
use crate::jobs::{Job, JobError, RetryPolicy};

/// End an explicit list of holds.
pub struct BulkEndHoldJob<R: HoldRepository + ?Sized> {
    pub service: Arc<HoldService<R>>,
    pub org_id: Uuid,
    pub hold_ids: Vec<Uuid>,
    pub input: EndHold,
}

/// Terminate every open hold of a group: Active holds end today, Upcoming
/// holds are canceled.
pub struct BulkEndHoldByGroupJob<R: HoldRepository + ?Sized> {
    pub service: Arc<HoldService<R>>,
    pub org_id: Uuid,
    pub group_name: String,
    pub input: EndHold,
}

impl<R: HoldRepository + ?Sized> BulkEndHoldJob<R> {
    pub const NAME: &'static str = "bulk_end_hold";

    pub async fn run(&self) -> Result<BulkReport, JobError> {
        let holds = self
            .service
            .repository()
            .select_holds(self.org_id, &HoldSelection::Ids(self.hold_ids.clone()))
            .await
            .map_err(|e| selection_failed(Self::NAME, e))?;
        let missing = missing_ids(&self.hold_ids, holds.iter().map(|h| h.id));

        let mut report = BulkReport::default();
        for hold in holds {
            match self.service.end_hold(self.org_id, hold.id, self.input.clone()).await {
                Ok(_) => report.succeeded(Self::NAME, None),
                Err(e) => report.record_error(Self::NAME, hold.id, e),
            }
        }
        for id in missing {
            report.record_error(Self::NAME, id, HoldError::not_found("hold"));
        }
        report.log_summary(Self::NAME, self.org_id);
        Ok(report)
    }
}

impl<R: HoldRepository + ?Sized> BulkEndHoldByGroupJob<R> {
    pub const NAME: &'static str = "bulk_end_hold_by_group";

    pub async fn run(&self) -> Result<BulkReport, JobError> {
        let holds = self
            .service
            .repository()
            .select_holds(self.org_id, &HoldSelection::Group(self.group_name.clone()))
            .await
            .map_err(|e| selection_failed(Self::NAME, e))?;

        let mut report = BulkReport::default();
        for hold in holds {
            let result = if hold.status == HoldStatus::Upcoming {
                self.service.cancel_hold(self.org_id, hold.id, CancelHold { note: self.input.note.clone() }).await
            } else {
                self.service.end_hold(self.org_id, hold.id, self.input.clone()).await
            };
            match result {
                Ok(_) => report.succeeded(Self::NAME, None),
                Err(e) => report.record_error(Self::NAME, hold.id, e),
            }
        }
        report.log_summary(Self::NAME, self.org_id);
        Ok(report)
    }
}

#[async_trait]
impl<R: HoldRepository + ?Sized + 'static> Job for BulkEndHoldJob<R> {
    fn name(&self) -> &'static str { Self::NAME }

    fn policy(&self) -> RetryPolicy { RetryPolicy::bulk() }

    fn org_id(&self) -> Option<Uuid> { Some(self.org_id) }

    async fn handle(&self) -> Result<serde_json::Value, JobError> {
        to_output(&self.run().await?)
    }
}

#[async_trait]
impl<R: HoldRepository + ?Sized + 'static> Job for BulkEndHoldByGroupJob<R> {
    fn name(&self) -> &'static str { Self::NAME }

    fn policy(&self) -> RetryPolicy { RetryPolicy::bulk() }

    fn org_id(&self) -> Option<Uuid> { Some(self.org_id) }

    async fn handle(&self) -> Result<serde_json::Value, JobError> {
        to_output(&self.run().await?)
    }
}
