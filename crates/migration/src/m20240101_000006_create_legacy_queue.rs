//! Create `legacy_queue` table shared with the legacy worker.
//!
//! Column layout follows the legacy consumer's queue table; `job` carries a
//! JSON envelope instead of the consumer's native serialization.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LegacyQueue::Table)
                    .if_not_exists()
                    .col(big_integer(LegacyQueue::Id).primary_key().auto_increment())
                    .col(string_len(LegacyQueue::Channel, 255))
                    .col(text(LegacyQueue::Job))
                    .col(big_integer(LegacyQueue::PushedAt))
                    .col(integer(LegacyQueue::Ttr))
                    .col(integer(LegacyQueue::Delay).default(0))
                    .col(integer(LegacyQueue::Priority).default(1024))
                    .col(big_integer_null(LegacyQueue::ReservedAt))
                    .col(integer_null(LegacyQueue::Attempt))
                    .col(big_integer_null(LegacyQueue::DoneAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(LegacyQueue::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum LegacyQueue { Table, Id, Channel, Job, PushedAt, Ttr, Delay, Priority, ReservedAt, Attempt, DoneAt }
