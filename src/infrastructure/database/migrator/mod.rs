//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_remote_parties;
mod m20250101_000002_create_local_access_infos;
mod m20250101_000003_create_remote_access_infos;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_remote_parties::Migration),
            Box::new(m20250101_000002_create_local_access_infos::Migration),
            Box::new(m20250101_000003_create_remote_access_infos::Migration),
        ]
    }
}
