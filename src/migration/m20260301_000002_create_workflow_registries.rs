//! Create workflow_registries table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WorkflowRegistries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkflowRegistries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WorkflowRegistries::RegistryType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkflowRegistries::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(WorkflowRegistries::Uri)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(WorkflowRegistries::ClientId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkflowRegistries::ClientSecret)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkflowRegistries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WorkflowRegistries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum WorkflowRegistries {
    Table,
    Id,
    RegistryType,
    Name,
    Uri,
    ClientId,
    ClientSecret,
    CreatedAt,
}
