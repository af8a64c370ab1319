use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Members: index on org_id
        manager
            .create_index(
                Index::create()
                    .name("idx_org_user_org")
                    .table(OrgUser::Table)
                    .col(OrgUser::OrgId)
                    .to_owned(),
            )
            .await?;

        // Memberships: scoped lookups by org and status
        manager
            .create_index(
                Index::create()
                    .name("idx_org_user_plan_org_status")
                    .table(OrgUserPlan::Table)
                    .col(OrgUserPlan::OrgId)
                    .col(OrgUserPlan::Status)
                    .to_owned(),
            )
            .await?;

        // Holds: overlap checks per membership, sweeps by org/status, group scans
        manager
            .create_index(
                Index::create()
                    .name("idx_hold_plan_status")
                    .table(OrgUserPlanHold::Table)
                    .col(OrgUserPlanHold::OrgUserPlanId)
                    .col(OrgUserPlanHold::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_hold_org_status")
                    .table(OrgUserPlanHold::Table)
                    .col(OrgUserPlanHold::OrgId)
                    .col(OrgUserPlanHold::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_hold_org_group")
                    .table(OrgUserPlanHold::Table)
                    .col(OrgUserPlanHold::OrgId)
                    .col(OrgUserPlanHold::GroupName)
                    .to_owned(),
            )
            .await?;

        // Legacy queue: consumer polls by channel
        manager
            .create_index(
                Index::create()
                    .name("idx_legacy_queue_channel")
                    .table(LegacyQueue::Table)
                    .col(LegacyQueue::Channel)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_org_user_org").table(OrgUser::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_org_user_plan_org_status").table(OrgUserPlan::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_hold_plan_status").table(OrgUserPlanHold::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_hold_org_status").table(OrgUserPlanHold::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_hold_org_group").table(OrgUserPlanHold::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_legacy_queue_channel").table(LegacyQueue::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OrgUser { Table, OrgId }

#[derive(DeriveIden)]
enum OrgUserPlan { Table, OrgId, Status }

#[derive(DeriveIden)]
enum OrgUserPlanHold { Table, OrgId, OrgUserPlanId, Status, GroupName }

#[derive(DeriveIden)]
enum LegacyQueue { Table, Channel }
