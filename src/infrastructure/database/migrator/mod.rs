//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users;
mod m20240101_000002_create_districts;
mod m20240101_000003_create_stores;
mod m20240101_000004_create_items;
mod m20240101_000005_create_inventory;
mod m20240101_000006_create_revoked_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users::Migration),
            Box::new(m20240101_000002_create_districts::Migration),
            Box::new(m20240101_000003_create_stores::Migration),
            Box::new(m20240101_000004_create_items::Migration),
            Box::new(m20240101_000005_create_inventory::Migration),
            Box::new(m20240101_000006_create_revoked_tokens::Migration),
        ]
    }
}
