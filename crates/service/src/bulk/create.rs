use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::{missing_ids, selection_failed, to_output, BulkReport};
use crate::hold::domain::{HoldRequest, MembershipSelection};
use crate::hold::repository::HoldRepository;
use crate::hold::{HoldError, HoldService};
use crate::jobs::{Job, JobError, RetryPolicy};

/// Place the same hold on an explicit list of memberships.
pub struct BulkHoldJob<R: HoldRepository + ?Sized> {
    pub service: Arc<HoldService<R>>,
    pub org_id: Uuid,
    pub membership_ids: Vec<Uuid>,
    pub request: HoldRequest,
}

/// Place a hold on every membership of an org (optionally one plan), tagged
/// with a group name so the group can be ended together later.
pub struct BulkCreateHoldByGroupJob<R: HoldRepository + ?Sized> {
    pub service: Arc<HoldService<R>>,
    pub org_id: Uuid,
    pub group_name: String,
    pub plan_name: Option<String>,
    pub request: HoldRequest,
}

impl<R: HoldRepository + ?Sized> BulkHoldJob<R> {
    pub const NAME: &'static str = "bulk_hold";

    pub async fn run(&self) -> Result<BulkReport, JobError> {
        let selection = MembershipSelection::Ids(self.membership_ids.clone());
        let mut outcome = create_for_selection(Self::NAME, &self.service, self.org_id, &selection, &self.request).await?;
        for id in outcome.missing {
            outcome.report.record_error(Self::NAME, id, HoldError::not_found("membership"));
        }
        outcome.report.log_summary(Self::NAME, self.org_id);
        Ok(outcome.report)
    }
}

impl<R: HoldRepository + ?Sized> BulkCreateHoldByGroupJob<R> {
    pub const NAME: &'static str = "bulk_create_hold_by_group";

    pub async fn run(&self) -> Result<BulkReport, JobError> {
        let selection = MembershipSelection::Org { plan_name: self.plan_name.clone() };
        let mut request = self.request.clone();
        request.group_name = Some(self.group_name.clone());
        let outcome = create_for_selection(Self::NAME, &self.service, self.org_id, &selection, &request).await?;
        outcome.report.log_summary(Self::NAME, self.org_id);
        Ok(outcome.report)
    }
}

struct CreateOutcome {
    report: BulkReport,
    missing: Vec<Uuid>,
}

async fn create_for_selection<R: HoldRepository + ?Sized>(
    job: &'static str,
    service: &HoldService<R>,
    org_id: Uuid,
    selection: &MembershipSelection,
    request: &HoldRequest,
) -> Result<CreateOutcome, JobError> {
    let memberships = service
        .repository()
        .select_memberships(org_id, selection)
        .await
        .map_err(|e| selection_failed(job, e))?;
    let missing = match selection {
        MembershipSelection::Ids(ids) => missing_ids(ids, memberships.iter().map(|m| m.id)),
        MembershipSelection::Org { .. } => Vec::new(),
    };

    let mut report = BulkReport::default();
    for membership in memberships {
        let assessment = match service.assess_new_hold(&membership, request.start, request.end).await {
            Ok(a) => a,
            Err(e) => {
                report.record_error(job, membership.id, e);
                continue;
            }
        };
        let mut item = request.clone();
        item.start = assessment.start;
        match service.create_hold(org_id, membership.id, item, true).await {
            Ok(_) => report.succeeded(job, Some(assessment.scenario)),
            Err(e) => report.record_error(job, membership.id, e),
        }
    }
    Ok(CreateOutcome { report, missing })
}

#[async_trait]
impl<R: HoldRepository + ?Sized + 'static> Job for BulkHoldJob<R> {
    fn name(&self) -> &'static str { Self::NAME }

    fn policy(&self) -> RetryPolicy { RetryPolicy::bulk() }

    fn org_id(&self) -> Option<Uuid> { Some(self.org_id) }

    async fn handle(&self) -> Result<serde_json::Value, JobError> {
        to_output(&self.run().await?)
    }
}

#[async_trait]
impl<R: HoldRepository + ?Sized + 'static> Job for BulkCreateHoldByGroupJob<R> {
    fn name(&self) -> &'static str { Self::NAME }

    fn policy(&self) -> RetryPolicy { RetryPolicy::bulk() }

    fn org_id(&self) -> Option<Uuid> { Some(self.org_id) }

    async fn handle(&self) -> Result<serde_json::Value, JobError> {
        to_output(&self.run().await?)
    }
}
