//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_org;
mod m20240101_000002_create_org_user;
mod m20240101_000003_create_org_user_plan;
mod m20240101_000004_create_org_user_plan_hold;
mod m20240101_000005_create_org_user_note;
mod m20240101_000006_create_legacy_queue;
mod m20240101_000007_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_org::Migration),
            Box::new(m20240101_000002_create_org_user::Migration),
            Box::new(m20240101_000003_create_org_user_plan::Migration),
            Box::new(m20240101_000004_create_org_user_plan_hold::Migration),
            Box::new(m20240101_000005_create_org_user_note::Migration),
            Box::new(m20240101_000006_create_legacy_queue::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000007_add_indexes::Migration),
        ]
    }
}
