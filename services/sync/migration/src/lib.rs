pub use sea_orm_migration::prelude::*;

mod m20260901_000001_create_users;
mod m20260901_000002_create_road_issues;
mod m20260901_000003_create_sync_logs;
mod m20260901_000004_create_sync_meta;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_000001_create_users::Migration),
            Box::new(m20260901_000002_create_road_issues::Migration),
            Box::new(m20260901_000003_create_sync_logs::Migration),
            Box::new(m20260901_000004_create_sync_meta::Migration),
        ]
    }
}
