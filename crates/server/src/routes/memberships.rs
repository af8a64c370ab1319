//! Membership endpoints: read a membership and toggle its hold switches.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use service::hold::domain::{Membership, UpdateHoldSettings};

use crate::auth::OrgScope;
use crate::errors::ApiError;
use crate::state::ServerState;

#[utoipa::path(
    get,
    path = "/orgs/{org_id}/memberships/{membership_id}",
    tag = "memberships",
    params(("org_id" = Uuid, Path,), ("membership_id" = Uuid, Path,)),
    responses((status = 200, description = "Membership with its hold counters"), (status = 404, description = "Membership not found", body = crate::errors::JsonApiError))
)]
pub async fn get(
    State(state): State<ServerState>,
    scope: OrgScope,
    Path((_org_id, membership_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Membership>, ApiError> {
    Ok(Json(state.holds.get_membership(scope.org_id, membership_id).await?))
}

#[utoipa::path(
    patch,
    path = "/orgs/{org_id}/memberships/{membership_id}/hold-settings",
    tag = "memberships",
    params(("org_id" = Uuid, Path,), ("membership_id" = Uuid, Path,)),
    request_body = crate::openapi::HoldSettingsDoc,
    responses((status = 200, description = "Updated membership"), (status = 404, description = "Membership not found", body = crate::errors::JsonApiError))
)]
pub async fn update_hold_settings(
    State(state): State<ServerState>,
    scope: OrgScope,
    Path((_org_id, membership_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateHoldSettings>,
) -> Result<Json<Membership>, ApiError> {
    Ok(Json(state.holds.update_hold_settings(scope.org_id, membership_id, body).await?))
}
