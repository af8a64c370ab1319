//! Create `org_user_plan` table (memberships).
//!
//! Status is stored as a small integer; dates are gym-local calendar dates.
//! Rows are soft-deleted through `is_deleted` only.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrgUserPlan::Table)
                    .if_not_exists()
                    .col(uuid(OrgUserPlan::Id).primary_key())
                    .col(uuid(OrgUserPlan::OrgId))
                    .col(uuid(OrgUserPlan::OrgUserId))
                    .col(string_len(OrgUserPlan::PlanName, 128))
                    .col(small_integer(OrgUserPlan::Status))
                    .col(date(OrgUserPlan::StartDateLoc))
                    .col(date(OrgUserPlan::EndDateLoc))
                    .col(integer(OrgUserPlan::HoldCount).default(0))
                    .col(integer(OrgUserPlan::HoldDays).default(0))
                    .col(integer(OrgUserPlan::HoldLimitCount).default(0))
                    .col(integer(OrgUserPlan::HoldLimitDays).default(0))
                    .col(boolean(OrgUserPlan::CanBeModified).default(true))
                    .col(boolean(OrgUserPlan::IsHoldEnabled).default(true))
                    .col(boolean(OrgUserPlan::IsDeleted).default(false))
                    .col(timestamp_with_time_zone(OrgUserPlan::CreatedAt))
                    .col(timestamp_with_time_zone(OrgUserPlan::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_org_user_plan_org")
                            .from(OrgUserPlan::Table, OrgUserPlan::OrgId)
                            .to(Org::Table, Org::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_org_user_plan_org_user")
                            .from(OrgUserPlan::Table, OrgUserPlan::OrgUserId)
                            .to(OrgUser::Table, OrgUser::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(OrgUserPlan::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum OrgUserPlan {
    Table,
    Id,
    OrgId,
    OrgUserId,
    PlanName,
    Status,
    StartDateLoc,
    EndDateLoc,
    HoldCount,
    HoldDays,
    HoldLimitCount,
    HoldLimitDays,
    CanBeModified,
    IsHoldEnabled,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Org { Table, Id }

#[derive(DeriveIden)]
enum OrgUser { Table, Id }
