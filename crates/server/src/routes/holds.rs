//! Single-hold endpoints. Each handler maps one `HoldService` operation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::pagination::Pagination;
use service::hold::domain::{CancelHold, EndHold, Hold, HoldRequest, ModifyHold, OverlappingHold, SweepReport};

use crate::auth::OrgScope;
use crate::errors::ApiError;
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct OverlapQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Comma-separated hold ids to ignore.
    #[serde(default)]
    pub exclude: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OverlapResponse {
    pub overlap: Option<OverlappingHold>,
}

fn parse_exclude(raw: Option<&str>) -> Result<Vec<Uuid>, ApiError> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Uuid>().map_err(|_| ApiError::BadRequest(format!("invalid hold id in exclude: {s}"))))
        .collect()
}

#[utoipa::path(
    get,
    path = "/orgs/{org_id}/memberships/{membership_id}/holds",
    tag = "holds",
    params(("org_id" = Uuid, Path,), ("membership_id" = Uuid, Path,), ("page" = Option<u32>, Query,), ("per_page" = Option<u32>, Query,)),
    responses((status = 200, description = "Holds of the membership, newest start first"), (status = 404, description = "Membership not found", body = crate::errors::JsonApiError))
)]
pub async fn list(
    State(state): State<ServerState>,
    scope: OrgScope,
    Path((_org_id, membership_id)): Path<(Uuid, Uuid)>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Hold>>, ApiError> {
    let holds = state.holds.list_holds(scope.org_id, membership_id, page).await?;
    Ok(Json(holds))
}

#[utoipa::path(
    post,
    path = "/orgs/{org_id}/memberships/{membership_id}/holds",
    tag = "holds",
    params(("org_id" = Uuid, Path,), ("membership_id" = Uuid, Path,)),
    request_body = crate::openapi::HoldRequestDoc,
    responses(
        (status = 201, description = "Hold created"),
        (status = 404, description = "Membership not found", body = crate::errors::JsonApiError),
        (status = 422, description = "Hold rejected by a business rule", body = crate::errors::JsonApiError)
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    scope: OrgScope,
    Path((_org_id, membership_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<HoldRequest>,
) -> Result<(StatusCode, Json<Hold>), ApiError> {
    let hold = state.holds.create_hold(scope.org_id, membership_id, input, false).await?;
    Ok((StatusCode::CREATED, Json(hold)))
}

#[utoipa::path(
    get,
    path = "/orgs/{org_id}/memberships/{membership_id}/holds/overlap",
    tag = "holds",
    params(
        ("org_id" = Uuid, Path,),
        ("membership_id" = Uuid, Path,),
        ("start" = String, Query, description = "YYYY-MM-DD"),
        ("end" = String, Query, description = "YYYY-MM-DD"),
        ("exclude" = Option<String>, Query, description = "Comma-separated hold ids")
    ),
    responses((status = 200, description = "First overlapping open hold, if any"))
)]
pub async fn overlap(
    State(state): State<ServerState>,
    scope: OrgScope,
    Path((_org_id, membership_id)): Path<(Uuid, Uuid)>,
    Query(q): Query<OverlapQuery>,
) -> Result<Json<OverlapResponse>, ApiError> {
    let exclude = parse_exclude(q.exclude.as_deref())?;
    let overlap = state
        .holds
        .get_overlapping_hold(scope.org_id, membership_id, q.start, q.end, &exclude)
        .await?;
    Ok(Json(OverlapResponse { overlap }))
}

#[utoipa::path(
    get,
    path = "/orgs/{org_id}/holds/{hold_id}",
    tag = "holds",
    params(("org_id" = Uuid, Path,), ("hold_id" = Uuid, Path,)),
    responses((status = 200, description = "Hold"), (status = 404, description = "Hold not found", body = crate::errors::JsonApiError))
)]
pub async fn get(
    State(state): State<ServerState>,
    scope: OrgScope,
    Path((_org_id, hold_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Hold>, ApiError> {
    Ok(Json(state.holds.get_hold(scope.org_id, hold_id).await?))
}

#[utoipa::path(
    put,
    path = "/orgs/{org_id}/holds/{hold_id}",
    tag = "holds",
    params(("org_id" = Uuid, Path,), ("hold_id" = Uuid, Path,)),
    request_body = crate::openapi::ModifyHoldDoc,
    responses((status = 200, description = "Hold updated"), (status = 422, description = "Change rejected", body = crate::errors::JsonApiError))
)]
pub async fn modify(
    State(state): State<ServerState>,
    scope: OrgScope,
    Path((_org_id, hold_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<ModifyHold>,
) -> Result<Json<Hold>, ApiError> {
    Ok(Json(state.holds.modify_hold(scope.org_id, hold_id, input).await?))
}

#[utoipa::path(
    post,
    path = "/orgs/{org_id}/holds/{hold_id}/cancel",
    tag = "holds",
    params(("org_id" = Uuid, Path,), ("hold_id" = Uuid, Path,)),
    request_body(content = crate::openapi::CancelHoldDoc, description = "Optional"),
    responses((status = 200, description = "Hold canceled"), (status = 422, description = "Hold already closed", body = crate::errors::JsonApiError))
)]
pub async fn cancel(
    State(state): State<ServerState>,
    scope: OrgScope,
    Path((_org_id, hold_id)): Path<(Uuid, Uuid)>,
    body: Option<Json<CancelHold>>,
) -> Result<Json<Hold>, ApiError> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    Ok(Json(state.holds.cancel_hold(scope.org_id, hold_id, input).await?))
}

#[utoipa::path(
    post,
    path = "/orgs/{org_id}/holds/{hold_id}/end",
    tag = "holds",
    params(("org_id" = Uuid, Path,), ("hold_id" = Uuid, Path,)),
    request_body(content = crate::openapi::EndHoldDoc, description = "Optional"),
    responses((status = 200, description = "Hold ended as of today"), (status = 422, description = "Hold not active", body = crate::errors::JsonApiError))
)]
pub async fn end(
    State(state): State<ServerState>,
    scope: OrgScope,
    Path((_org_id, hold_id)): Path<(Uuid, Uuid)>,
    body: Option<Json<EndHold>>,
) -> Result<Json<Hold>, ApiError> {
    let mut input = body.map(|Json(b)| b).unwrap_or_default();
    input.ended_by = Some(scope.staff);
    Ok(Json(state.holds.end_hold(scope.org_id, hold_id, input).await?))
}

/// Run the date-driven status transitions for the org now instead of
/// waiting for the periodic sweep.
#[utoipa::path(
    post,
    path = "/orgs/{org_id}/holds/sync",
    tag = "holds",
    params(("org_id" = Uuid, Path,)),
    responses((status = 200, description = "Transition counts"))
)]
pub async fn sync(State(state): State<ServerState>, scope: OrgScope) -> Result<Json<SweepReport>, ApiError> {
    Ok(Json(state.holds.sync_hold_statuses(scope.org_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclude_list_parses_and_rejects_garbage() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let raw = format!("{a}, {b},");
        assert_eq!(parse_exclude(Some(&raw)).unwrap(), vec![a, b]);
        assert!(parse_exclude(None).unwrap().is_empty());
        assert!(matches!(parse_exclude(Some("nope")), Err(ApiError::BadRequest(_))));
    }
}
