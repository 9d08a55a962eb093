//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_workflow_registries;
mod m20260301_000003_create_oauth_identities;
mod m20260301_000004_create_workflows;
mod m20260301_000005_create_test_suites;
mod m20260301_000006_create_test_instances;
mod m20260301_000007_create_testing_services;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users::Migration),
            Box::new(m20260301_000002_create_workflow_registries::Migration),
            Box::new(m20260301_000003_create_oauth_identities::Migration),
            Box::new(m20260301_000004_create_workflows::Migration),
            Box::new(m20260301_000005_create_test_suites::Migration),
            Box::new(m20260301_000006_create_test_instances::Migration),
            Box::new(m20260301_000007_create_testing_services::Migration),
        ]
    }
}
