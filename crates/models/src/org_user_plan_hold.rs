//! Hold (`org_user_plan_hold`): one interval during which a membership is paused.

use sea_orm::entity::prelude::*;
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::status::HoldStatus;
use crate::{org, org_user_plan};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "org_user_plan_hold")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub org_id: Uuid,
    pub org_user_id: Uuid,
    pub org_user_plan_id: Uuid,
    pub start_date: Date,
    pub end_date: Date,
    pub status: HoldStatus,
    pub is_canceled: bool,
    pub group_name: Option<String>,
    pub notify_email: bool,
    pub notify_push: bool,
    pub note: Option<String>,
    pub ended_by: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Org,
    OrgUserPlan,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Org => Entity::belongs_to(org::Entity).from(Column::OrgId).to(org::Column::Id).into(),
            Relation::OrgUserPlan => Entity::belongs_to(org_user_plan::Entity)
                .from(Column::OrgUserPlanId)
                .to(org_user_plan::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Non-canceled and still Upcoming or Active.
    pub fn is_open(&self) -> bool {
        !self.is_canceled && self.status.is_open()
    }

    /// Length in whole days (`end - start`).
    pub fn length_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn hold(start: &str, end: &str, status: HoldStatus) -> Model {
        let now = Utc::now().into();
        Model {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            org_user_id: Uuid::new_v4(),
            org_user_plan_id: Uuid::new_v4(),
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            status,
            is_canceled: false,
            group_name: None,
            notify_email: false,
            notify_push: false,
            note: None,
            ended_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn open_and_length_helpers() {
        let mut h = hold("2024-06-01", "2024-06-10", HoldStatus::Active);
        assert!(h.is_open());
        assert_eq!(h.length_days(), 9);
        h.is_canceled = true;
        assert!(!h.is_open());
        assert!(!hold("2024-06-01", "2024-06-01", HoldStatus::Expired).is_open());
        assert_eq!(hold("2024-06-01", "2024-06-01", HoldStatus::Upcoming).length_days(), 0);
    }
}
