//! Create test_suites table.

use sea_orm_migration::prelude::*;

use super::m20260301_000004_create_workflows::Workflows;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestSuites::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TestSuites::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TestSuites::WorkflowId).uuid().not_null())
                    .col(ColumnDef::new(TestSuites::SubmitterId).uuid().not_null())
                    .col(ColumnDef::new(TestSuites::TestDefinition).json_binary())
                    .col(
                        ColumnDef::new(TestSuites::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_test_suites_workflow")
                            .from(TestSuites::Table, TestSuites::WorkflowId)
                            .to(Workflows::Table, Workflows::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_suites_workflow_id")
                    .table(TestSuites::Table)
                    .col(TestSuites::WorkflowId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestSuites::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum TestSuites {
    Table,
    Id,
    WorkflowId,
    SubmitterId,
    TestDefinition,
    CreatedAt,
}
