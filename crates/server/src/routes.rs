pub mod bulk;
pub mod holds;
pub mod jobs;
pub mod memberships;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::auth;
use crate::openapi::ApiDoc;
use crate::state::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> (StatusCode, String) {
    common::metrics::encode_metrics()
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: public probes plus the org-scoped,
/// token-protected hold API.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api-docs/openapi.json", get(openapi_json));

    let api = Router::new()
        .route("/orgs/:org_id/memberships/:membership_id", get(memberships::get))
        .route(
            "/orgs/:org_id/memberships/:membership_id/hold-settings",
            patch(memberships::update_hold_settings),
        )
        .route(
            "/orgs/:org_id/memberships/:membership_id/holds",
            get(holds::list).post(holds::create),
        )
        .route("/orgs/:org_id/memberships/:membership_id/holds/overlap", get(holds::overlap))
        .route("/orgs/:org_id/holds/sync", post(holds::sync))
        .route("/orgs/:org_id/holds/bulk", post(bulk::create))
        .route("/orgs/:org_id/holds/bulk/group", post(bulk::create_by_group))
        .route("/orgs/:org_id/holds/bulk/end", post(bulk::end))
        .route("/orgs/:org_id/holds/bulk/end/group", post(bulk::end_by_group))
        .route("/orgs/:org_id/holds/:hold_id", get(holds::get).put(holds::modify))
        .route("/orgs/:org_id/holds/:hold_id/cancel", post(holds::cancel))
        .route("/orgs/:org_id/holds/:hold_id/end", post(holds::end))
        .route("/orgs/:org_id/jobs", get(jobs::list))
        .route("/orgs/:org_id/jobs/:job_id", get(jobs::get))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_staff_token));

    public
        .merge(api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
