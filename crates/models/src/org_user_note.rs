use sea_orm::entity::prelude::*;
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::org_user;

/// Free-text audit entry attached to a member.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "org_user_note")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub org_id: Uuid,
    pub org_user_id: Uuid,
    pub org_user_plan_id: Option<Uuid>,
    pub hold_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { OrgUser }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::OrgUser => Entity::belongs_to(org_user::Entity).from(Column::OrgUserId).to(org_user::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
