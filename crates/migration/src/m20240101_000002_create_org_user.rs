//! Create `org_user` table (members) with FK to `org`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrgUser::Table)
                    .if_not_exists()
                    .col(uuid(OrgUser::Id).primary_key())
                    .col(uuid(OrgUser::OrgId))
                    .col(string_len(OrgUser::Email, 255))
                    .col(string_len(OrgUser::Name, 128))
                    .col(timestamp_with_time_zone(OrgUser::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_org_user_org")
                            .from(OrgUser::Table, OrgUser::OrgId)
                            .to(Org::Table, Org::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(OrgUser::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum OrgUser { Table, Id, OrgId, Email, Name, CreatedAt }

#[derive(DeriveIden)]
enum Org { Table, Id }
