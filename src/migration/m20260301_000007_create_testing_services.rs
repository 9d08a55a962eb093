//! Create testing_services table.
//!
//! Keyed by the owning test instance id (one-to-one).

use sea_orm_migration::prelude::*;

use super::m20260301_000006_create_test_instances::TestInstances;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestingServices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TestingServices::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TestingServices::ServiceType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TestingServices::Url).text().not_null())
                    .col(ColumnDef::new(TestingServices::Resource).text())
                    .col(ColumnDef::new(TestingServices::Key).string())
                    .col(ColumnDef::new(TestingServices::Secret).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_testing_services_instance")
                            .from(TestingServices::Table, TestingServices::Id)
                            .to(TestInstances::Table, TestInstances::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestingServices::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TestingServices {
    Table,
    Id,
    ServiceType,
    Url,
    Resource,
    Key,
    Secret,
}
