//! Create `org_user_note` table: audit trail written alongside hold mutations.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrgUserNote::Table)
                    .if_not_exists()
                    .col(uuid(OrgUserNote::Id).primary_key())
                    .col(uuid(OrgUserNote::OrgId))
                    .col(uuid(OrgUserNote::OrgUserId))
                    .col(uuid_null(OrgUserNote::OrgUserPlanId))
                    .col(uuid_null(OrgUserNote::HoldId))
                    .col(text(OrgUserNote::Body))
                    .col(timestamp_with_time_zone(OrgUserNote::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_note_org_user")
                            .from(OrgUserNote::Table, OrgUserNote::OrgUserId)
                            .to(OrgUser::Table, OrgUser::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(OrgUserNote::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum OrgUserNote { Table, Id, OrgId, OrgUserId, OrgUserPlanId, HoldId, Body, CreatedAt }

#[derive(DeriveIden)]
enum OrgUser { Table, Id }
