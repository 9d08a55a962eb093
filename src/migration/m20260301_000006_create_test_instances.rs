//! Create test_instances table.

use sea_orm_migration::prelude::*;

use super::m20260301_000005_create_test_suites::TestSuites;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestInstances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TestInstances::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TestInstances::TestSuiteId).uuid().not_null())
                    .col(ColumnDef::new(TestInstances::Name).string().not_null())
                    .col(
                        ColumnDef::new(TestInstances::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(TestInstances::Parameters).json_binary())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_test_instances_suite")
                            .from(TestInstances::Table, TestInstances::TestSuiteId)
                            .to(TestSuites::Table, TestSuites::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_instances_suite_id")
                    .table(TestInstances::Table)
                    .col(TestInstances::TestSuiteId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestInstances::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum TestInstances {
    Table,
    Id,
    TestSuiteId,
    Name,
    Position,
    Parameters,
}
