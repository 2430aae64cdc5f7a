pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_identity_tables;
mod m20250601_000002_create_tenancy_tables;

pub use m20250601_000001_create_identity_tables::{Sessions, Users, Verifications};
pub use m20250601_000002_create_tenancy_tables::{Invitations, Memberships, Organizations};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_identity_tables::Migration),
            Box::new(m20250601_000002_create_tenancy_tables::Migration),
        ]
    }
}
