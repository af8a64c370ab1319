//! Create `org` table (tenants / gyms).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Org::Table)
                    .if_not_exists()
                    .col(uuid(Org::Id).primary_key())
                    .col(string_len(Org::Name, 128))
                    .col(timestamp_with_time_zone(Org::CreatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Org::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Org { Table, Id, Name, CreatedAt }
