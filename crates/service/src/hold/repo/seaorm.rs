use chrono::NaiveDate;
use common::pagination::Pagination;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::warn;
use uuid::Uuid;

use models::{org, org_user_note, org_user_plan, org_user_plan_hold as hold, HoldStatus};

use crate::hold::domain::{Hold, HoldSelection, HoldWrite, Membership, MembershipSelection};
use crate::hold::errors::HoldError;
use crate::hold::repository::HoldRepository;

pub struct SeaOrmHoldRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmHoldRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    fn open() -> Condition {
        Condition::all()
            .add(hold::Column::IsCanceled.eq(false))
            .add(hold::Column::Status.is_in([HoldStatus::Upcoming, HoldStatus::Active]))
    }

    async fn write_all(txn: &DatabaseTransaction, write: HoldWrite) -> Result<Hold, HoldError> {
        let HoldWrite { hold: h, membership, is_new, audit } = write;
        let note = org_user_note::ActiveModel {
            id: Set(Uuid::new_v4()),
            org_id: Set(h.org_id),
            org_user_id: Set(h.org_user_id),
            org_user_plan_id: Set(Some(h.org_user_plan_id)),
            hold_id: Set(Some(h.id)),
            body: Set(audit),
            created_at: Set(h.updated_at),
        };
        let am = hold::ActiveModel::from(h).reset_all();
        let saved = if is_new { am.insert(txn).await? } else { am.update(txn).await? };
        org_user_plan::ActiveModel::from(membership).reset_all().update(txn).await?;
        note.insert(txn).await?;
        Ok(saved)
    }
}

#[async_trait::async_trait]
impl HoldRepository for SeaOrmHoldRepository {
    async fn find_membership(&self, org_id: Uuid, id: Uuid) -> Result<Option<Membership>, HoldError> {
        let res = org_user_plan::Entity::find_by_id(id)
            .filter(org_user_plan::Column::OrgId.eq(org_id))
            .one(&self.db)
            .await?;
        Ok(res)
    }

    async fn find_hold(&self, org_id: Uuid, id: Uuid) -> Result<Option<Hold>, HoldError> {
        let res = hold::Entity::find_by_id(id)
            .filter(hold::Column::OrgId.eq(org_id))
            .one(&self.db)
            .await?;
        Ok(res)
    }

    async fn open_holds(&self, membership_id: Uuid) -> Result<Vec<Hold>, HoldError> {
        let rows = hold::Entity::find()
            .filter(hold::Column::OrgUserPlanId.eq(membership_id))
            .filter(Self::open())
            .order_by_asc(hold::Column::StartDate)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn overlapping_holds(
        &self,
        membership_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: &[Uuid],
    ) -> Result<Vec<Hold>, HoldError> {
        let shapes = Condition::any()
            // existing contains new
            .add(Condition::all().add(hold::Column::StartDate.lte(start)).add(hold::Column::EndDate.gte(end)))
            // new contains existing
            .add(Condition::all().add(hold::Column::StartDate.gte(start)).add(hold::Column::EndDate.lte(end)))
            // new starts inside existing
            .add(Condition::all().add(hold::Column::StartDate.lte(start)).add(hold::Column::EndDate.gte(start)))
            // new ends inside existing
            .add(Condition::all().add(hold::Column::StartDate.lte(end)).add(hold::Column::EndDate.gte(end)));
        let mut query = hold::Entity::find()
            .filter(hold::Column::OrgUserPlanId.eq(membership_id))
            .filter(Self::open())
            .filter(shapes);
        if !exclude.is_empty() {
            query = query.filter(hold::Column::Id.is_not_in(exclude.iter().copied()));
        }
        let rows = query.order_by_asc(hold::Column::StartDate).all(&self.db).await?;
        Ok(rows)
    }

    async fn list_holds(&self, org_id: Uuid, membership_id: Uuid, page: Pagination) -> Result<Vec<Hold>, HoldError> {
        let (page_idx, per_page) = page.normalize();
        let rows = hold::Entity::find()
            .filter(hold::Column::OrgId.eq(org_id))
            .filter(hold::Column::OrgUserPlanId.eq(membership_id))
            .order_by_desc(hold::Column::StartDate)
            .order_by_asc(hold::Column::Id)
            .paginate(&self.db, per_page)
            .fetch_page(page_idx)
            .await?;
        Ok(rows)
    }

    async fn select_memberships(&self, org_id: Uuid, selection: &MembershipSelection) -> Result<Vec<Membership>, HoldError> {
        let mut query = org_user_plan::Entity::find().filter(org_user_plan::Column::OrgId.eq(org_id));
        match selection {
            MembershipSelection::Ids(ids) => {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                query = query.filter(org_user_plan::Column::Id.is_in(ids.iter().copied()));
            }
            MembershipSelection::Org { plan_name } => {
                query = query.filter(org_user_plan::Column::IsDeleted.eq(false));
                if let Some(plan) = plan_name {
                    query = query.filter(org_user_plan::Column::PlanName.eq(plan.clone()));
                }
            }
        }
        let rows = query
            .order_by_asc(org_user_plan::Column::CreatedAt)
            .order_by_asc(org_user_plan::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn select_holds(&self, org_id: Uuid, selection: &HoldSelection) -> Result<Vec<Hold>, HoldError> {
        let mut query = hold::Entity::find().filter(hold::Column::OrgId.eq(org_id));
        match selection {
            HoldSelection::Ids(ids) => {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                query = query.filter(hold::Column::Id.is_in(ids.iter().copied()));
            }
            HoldSelection::Group(group) => {
                query = query.filter(hold::Column::GroupName.eq(group.clone())).filter(Self::open());
            }
        }
        let rows = query.order_by_asc(hold::Column::StartDate).all(&self.db).await?;
        Ok(rows)
    }

    async fn due_holds(&self, org_id: Uuid, today: NaiveDate) -> Result<Vec<Hold>, HoldError> {
        let due = Condition::any()
            .add(
                Condition::all()
                    .add(hold::Column::Status.eq(HoldStatus::Upcoming))
                    .add(hold::Column::StartDate.lte(today)),
            )
            .add(
                Condition::all()
                    .add(hold::Column::Status.eq(HoldStatus::Active))
                    .add(hold::Column::EndDate.lt(today)),
            );
        let rows = hold::Entity::find()
            .filter(hold::Column::OrgId.eq(org_id))
            .filter(hold::Column::IsCanceled.eq(false))
            .filter(due)
            .order_by_asc(hold::Column::StartDate)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn org_ids(&self) -> Result<Vec<Uuid>, HoldError> {
        let ids = org::Entity::find()
            .select_only()
            .column(org::Column::Id)
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await?;
        Ok(ids)
    }

    async fn save(&self, write: HoldWrite) -> Result<Hold, HoldError> {
        let txn = self.db.begin().await?;
        match Self::write_all(&txn, write).await {
            Ok(saved) => {
                txn.commit().await?;
                Ok(saved)
            }
            Err(e) => {
                if let Err(rb) = txn.rollback().await {
                    warn!(error = %rb, "rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn save_membership(&self, membership: Membership) -> Result<Membership, HoldError> {
        let saved = org_user_plan::ActiveModel::from(membership).reset_all().update(&self.db).await?;
        Ok(saved)
    }
}
