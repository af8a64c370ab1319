//! Bulk endpoints. Each request is validated, enqueued as a job and
//! answered with `202 Accepted`; progress is read from `/orgs/:org_id/jobs/:job_id`.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use common::types::Accepted;
use service::bulk::{BulkCreateHoldByGroupJob, BulkEndHoldByGroupJob, BulkEndHoldJob, BulkHoldJob};
use service::hold::domain::{EndHold, HoldRequest};
use service::jobs::Job;

use crate::auth::OrgScope;
use crate::errors::ApiError;
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct BulkCreateBody {
    pub membership_ids: Vec<Uuid>,
    #[serde(flatten)]
    pub hold: HoldRequest,
}

#[derive(Debug, Deserialize)]
pub struct BulkCreateByGroupBody {
    pub group_name: String,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(flatten)]
    pub hold: HoldRequest,
}

#[derive(Debug, Deserialize)]
pub struct BulkEndBody {
    pub hold_ids: Vec<Uuid>,
    #[serde(flatten)]
    pub end: EndHold,
}

#[derive(Debug, Deserialize)]
pub struct BulkEndByGroupBody {
    pub group_name: String,
    #[serde(flatten)]
    pub end: EndHold,
}

fn require_group(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("group_name must not be empty".into()));
    }
    Ok(name.to_string())
}

async fn enqueue(state: &ServerState, org_id: Uuid, job: Arc<dyn Job>) -> Result<(StatusCode, Json<Accepted>), ApiError> {
    let name = job.name().to_string();
    let job_id = state.queue.enqueue(job).await?;
    info!(%org_id, %job_id, job = %name, "bulk job accepted");
    Ok((StatusCode::ACCEPTED, Json(Accepted { job_id: job_id.to_string(), job: name })))
}

#[utoipa::path(
    post,
    path = "/orgs/{org_id}/holds/bulk",
    tag = "bulk",
    params(("org_id" = Uuid, Path,)),
    request_body = crate::openapi::BulkCreateDoc,
    responses((status = 202, description = "Job accepted", body = crate::openapi::AcceptedDoc), (status = 400, description = "Empty selection", body = crate::errors::JsonApiError))
)]
pub async fn create(
    State(state): State<ServerState>,
    scope: OrgScope,
    Json(body): Json<BulkCreateBody>,
) -> Result<(StatusCode, Json<Accepted>), ApiError> {
    if body.membership_ids.is_empty() {
        return Err(ApiError::BadRequest("membership_ids must not be empty".into()));
    }
    let job = BulkHoldJob {
        service: state.holds.clone(),
        org_id: scope.org_id,
        membership_ids: body.membership_ids,
        request: body.hold,
    };
    enqueue(&state, scope.org_id, Arc::new(job)).await
}

#[utoipa::path(
    post,
    path = "/orgs/{org_id}/holds/bulk/group",
    tag = "bulk",
    params(("org_id" = Uuid, Path,)),
    request_body = crate::openapi::BulkCreateByGroupDoc,
    responses((status = 202, description = "Job accepted", body = crate::openapi::AcceptedDoc))
)]
pub async fn create_by_group(
    State(state): State<ServerState>,
    scope: OrgScope,
    Json(body): Json<BulkCreateByGroupBody>,
) -> Result<(StatusCode, Json<Accepted>), ApiError> {
    let job = BulkCreateHoldByGroupJob {
        service: state.holds.clone(),
        org_id: scope.org_id,
        group_name: require_group(&body.group_name)?,
        plan_name: body.plan_name.filter(|p| !p.trim().is_empty()),
        request: body.hold,
    };
    enqueue(&state, scope.org_id, Arc::new(job)).await
}

#[utoipa::path(
    post,
    path = "/orgs/{org_id}/holds/bulk/end",
    tag = "bulk",
    params(("org_id" = Uuid, Path,)),
    request_body = crate::openapi::BulkEndDoc,
    responses((status = 202, description = "Job accepted", body = crate::openapi::AcceptedDoc))
)]
pub async fn end(
    State(state): State<ServerState>,
    scope: OrgScope,
    Json(mut body): Json<BulkEndBody>,
) -> Result<(StatusCode, Json<Accepted>), ApiError> {
    if body.hold_ids.is_empty() {
        return Err(ApiError::BadRequest("hold_ids must not be empty".into()));
    }
    body.end.ended_by = Some(scope.staff);
    let job = BulkEndHoldJob {
        service: state.holds.clone(),
        org_id: scope.org_id,
        hold_ids: body.hold_ids,
        input: body.end,
    };
    enqueue(&state, scope.org_id, Arc::new(job)).await
}

#[utoipa::path(
    post,
    path = "/orgs/{org_id}/holds/bulk/end/group",
    tag = "bulk",
    params(("org_id" = Uuid, Path,)),
    request_body = crate::openapi::BulkEndByGroupDoc,
    responses((status = 202, description = "Job accepted", body = crate::openapi::AcceptedDoc))
)]
pub async fn end_by_group(
    State(state): State<ServerState>,
    scope: OrgScope,
    Json(mut body): Json<BulkEndByGroupBody>,
) -> Result<(StatusCode, Json<Accepted>), ApiError> {
    body.end.ended_by = Some(scope.staff);
    let job = BulkEndHoldByGroupJob {
        service: state.holds.clone(),
        org_id: scope.org_id,
        group_name: require_group(&body.group_name)?,
        input: body.end,
    };
    enqueue(&state, scope.org_id, Arc::new(job)).await
}
