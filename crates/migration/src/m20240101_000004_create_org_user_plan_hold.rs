//! Create `org_user_plan_hold` table: one pause interval of one membership.
//!
//! Holds are never physically deleted; `is_canceled` marks logical deletion.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrgUserPlanHold::Table)
                    .if_not_exists()
                    .col(uuid(OrgUserPlanHold::Id).primary_key())
                    .col(uuid(OrgUserPlanHold::OrgId))
                    .col(uuid(OrgUserPlanHold::OrgUserId))
                    .col(uuid(OrgUserPlanHold::OrgUserPlanId))
                    .col(date(OrgUserPlanHold::StartDate))
                    .col(date(OrgUserPlanHold::EndDate))
                    .col(small_integer(OrgUserPlanHold::Status))
                    .col(boolean(OrgUserPlanHold::IsCanceled).default(false))
                    .col(string_len_null(OrgUserPlanHold::GroupName, 128))
                    .col(boolean(OrgUserPlanHold::NotifyEmail).default(false))
                    .col(boolean(OrgUserPlanHold::NotifyPush).default(false))
                    .col(text_null(OrgUserPlanHold::Note))
                    .col(string_len_null(OrgUserPlanHold::EndedBy, 128))
                    .col(timestamp_with_time_zone(OrgUserPlanHold::CreatedAt))
                    .col(timestamp_with_time_zone(OrgUserPlanHold::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_hold_org_user_plan")
                            .from(OrgUserPlanHold::Table, OrgUserPlanHold::OrgUserPlanId)
                            .to(OrgUserPlan::Table, OrgUserPlan::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_hold_org")
                            .from(OrgUserPlanHold::Table, OrgUserPlanHold::OrgId)
                            .to(Org::Table, Org::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(OrgUserPlanHold::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum OrgUserPlanHold {
    Table,
    Id,
    OrgId,
    OrgUserId,
    OrgUserPlanId,
    StartDate,
    EndDate,
    Status,
    IsCanceled,
    GroupName,
    NotifyEmail,
    NotifyPush,
    Note,
    EndedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OrgUserPlan { Table, Id }

#[derive(DeriveIden)]
enum Org { Table, Id }
