use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use service::jobs::JobRecord;

use crate::auth::OrgScope;
use crate::errors::ApiError;
use crate::state::ServerState;

#[utoipa::path(
    get,
    path = "/orgs/{org_id}/jobs",
    tag = "jobs",
    params(("org_id" = Uuid, Path,)),
    responses((status = 200, description = "Jobs queued for the org, oldest first"))
)]
pub async fn list(State(state): State<ServerState>, scope: OrgScope) -> Json<Vec<JobRecord>> {
    Json(state.queue.tracker().list_for_org(scope.org_id))
}

/// Jobs of another org are reported as missing.
#[utoipa::path(
    get,
    path = "/orgs/{org_id}/jobs/{job_id}",
    tag = "jobs",
    params(("org_id" = Uuid, Path,), ("job_id" = Uuid, Path,)),
    responses((status = 200, description = "Job status and bulk report"), (status = 404, description = "Unknown job", body = crate::errors::JsonApiError))
)]
pub async fn get(
    State(state): State<ServerState>,
    scope: OrgScope,
    Path((_org_id, job_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<JobRecord>, ApiError> {
    state
        .queue
        .tracker()
        .get(job_id)
        .filter(|r| r.org_id == Some(scope.org_id))
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("job {}", job_id)))
}
