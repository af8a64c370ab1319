//! Membership (`org_user_plan`): a member's enrollment in a plan.
//!
//! Hold counters (`hold_count`, `hold_days`) are checked against the
//! configured limits, where a limit of 0 means unlimited.

use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors;
use crate::status::MembershipStatus;
use crate::{org, org_user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "org_user_plan")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub org_id: Uuid,
    pub org_user_id: Uuid,
    pub plan_name: String,
    pub status: MembershipStatus,
    pub start_date_loc: Date,
    pub end_date_loc: Date,
    pub hold_count: i32,
    pub hold_days: i32,
    pub hold_limit_count: i32,
    pub hold_limit_days: i32,
    pub can_be_modified: bool,
    pub is_hold_enabled: bool,
    pub is_deleted: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Org,
    OrgUser,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Org => Entity::belongs_to(org::Entity).from(Column::OrgId).to(org::Column::Id).into(),
            Relation::OrgUser => Entity::belongs_to(org_user::Entity).from(Column::OrgUserId).to(org_user::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Status implied by the membership's own date window.
    pub fn window_status(&self, today: NaiveDate) -> MembershipStatus {
        if self.start_date_loc > today {
            MembershipStatus::Upcoming
        } else if self.end_date_loc < today {
            MembershipStatus::Expired
        } else {
            MembershipStatus::Active
        }
    }

    /// Whether a new hold may be placed at all (status-wise).
    pub fn accepts_holds(&self) -> bool {
        !self.is_deleted && matches!(self.status, MembershipStatus::Active | MembershipStatus::Upcoming)
    }
}

/// Input for creating a membership.
#[derive(Clone, Debug)]
pub struct NewMembership {
    pub org_id: Uuid,
    pub org_user_id: Uuid,
    pub plan_name: String,
    pub start_date_loc: NaiveDate,
    pub end_date_loc: NaiveDate,
    pub hold_limit_count: i32,
    pub hold_limit_days: i32,
}

pub fn validate_window(start: NaiveDate, end: NaiveDate) -> Result<(), errors::ModelError> {
    if end < start {
        return Err(errors::ModelError::Validation("end_date_loc must not precede start_date_loc".into()));
    }
    Ok(())
}

pub fn validate_limits(count: i32, days: i32) -> Result<(), errors::ModelError> {
    if count < 0 || days < 0 {
        return Err(errors::ModelError::Validation("hold limits must be >= 0".into()));
    }
    Ok(())
}

pub async fn create(db: &DatabaseConnection, input: NewMembership) -> Result<Model, errors::ModelError> {
    validate_window(input.start_date_loc, input.end_date_loc)?;
    validate_limits(input.hold_limit_count, input.hold_limit_days)?;
    if input.plan_name.trim().is_empty() { return Err(errors::ModelError::Validation("plan_name required".into())); }
    let now = Utc::now();
    let status = if input.start_date_loc > now.date_naive() {
        MembershipStatus::Upcoming
    } else if input.end_date_loc < now.date_naive() {
        MembershipStatus::Expired
    } else {
        MembershipStatus::Active
    };
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        org_id: Set(input.org_id),
        org_user_id: Set(input.org_user_id),
        plan_name: Set(input.plan_name),
        status: Set(status),
        start_date_loc: Set(input.start_date_loc),
        end_date_loc: Set(input.end_date_loc),
        hold_count: Set(0),
        hold_days: Set(0),
        hold_limit_count: Set(input.hold_limit_count),
        hold_limit_days: Set(input.hold_limit_days),
        can_be_modified: Set(true),
        is_hold_enabled: Set(true),
        is_deleted: Set(false),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
