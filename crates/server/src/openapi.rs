use chrono::NaiveDate;
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::JsonApiError;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct HoldRequestDoc {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub note: Option<String>,
    pub group_name: Option<String>,
    pub notify_email: Option<bool>,
    pub notify_push: Option<bool>,
}

#[derive(ToSchema)]
pub struct ModifyHoldDoc {
    /// Must equal the current start for an Active hold.
    pub start: Option<NaiveDate>,
    pub end: NaiveDate,
    pub note: Option<String>,
    pub notify_email: Option<bool>,
    pub notify_push: Option<bool>,
}

#[derive(ToSchema)]
pub struct CancelHoldDoc { pub note: Option<String> }

#[derive(ToSchema)]
/// The hold is recorded as ended by the token subject.
pub struct EndHoldDoc {
    pub note: Option<String>,
    pub notify_email: Option<bool>,
    pub notify_push: Option<bool>,
}

#[derive(ToSchema)]
pub struct BulkCreateDoc {
    pub membership_ids: Vec<Uuid>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub note: Option<String>,
    pub notify_email: Option<bool>,
    pub notify_push: Option<bool>,
}

#[derive(ToSchema)]
pub struct BulkCreateByGroupDoc {
    pub group_name: String,
    pub plan_name: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub note: Option<String>,
    pub notify_email: Option<bool>,
    pub notify_push: Option<bool>,
}

#[derive(ToSchema)]
pub struct BulkEndDoc {
    pub hold_ids: Vec<Uuid>,
    pub note: Option<String>,
    pub notify_email: Option<bool>,
    pub notify_push: Option<bool>,
}

#[derive(ToSchema)]
pub struct BulkEndByGroupDoc {
    pub group_name: String,
    pub note: Option<String>,
    pub notify_email: Option<bool>,
    pub notify_push: Option<bool>,
}

/// Absent fields keep their current value.
#[derive(ToSchema)]
pub struct HoldSettingsDoc {
    pub is_hold_enabled: Option<bool>,
    pub can_be_modified: Option<bool>,
}

#[derive(ToSchema)]
pub struct AcceptedDoc { pub job_id: String, pub job: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::memberships::get,
        crate::routes::memberships::update_hold_settings,
        crate::routes::holds::list,
        crate::routes::holds::create,
        crate::routes::holds::overlap,
        crate::routes::holds::get,
        crate::routes::holds::modify,
        crate::routes::holds::cancel,
        crate::routes::holds::end,
        crate::routes::holds::sync,
        crate::routes::bulk::create,
        crate::routes::bulk::create_by_group,
        crate::routes::bulk::end,
        crate::routes::bulk::end_by_group,
        crate::routes::jobs::list,
        crate::routes::jobs::get,
    ),
    components(
        schemas(
            HealthResponse,
            HoldRequestDoc,
            ModifyHoldDoc,
            CancelHoldDoc,
            EndHoldDoc,
            BulkCreateDoc,
            BulkCreateByGroupDoc,
            BulkEndDoc,
            BulkEndByGroupDoc,
            HoldSettingsDoc,
            AcceptedDoc,
            JsonApiError,
        )
    ),
    tags(
        (name = "health"),
        (name = "memberships"),
        (name = "holds"),
        (name = "bulk"),
        (name = "jobs")
    )
)]
pub struct ApiDoc;
