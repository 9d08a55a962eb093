//! Create workflows table.

use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_users::Users;
use super::m20260301_000002_create_workflow_registries::WorkflowRegistries;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Workflows::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Workflows::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Workflows::RegistryId).uuid().not_null())
                    .col(ColumnDef::new(Workflows::SubmitterId).uuid().not_null())
                    .col(ColumnDef::new(Workflows::Uuid).uuid().not_null())
                    .col(ColumnDef::new(Workflows::Version).string().not_null())
                    .col(ColumnDef::new(Workflows::Name).string().not_null())
                    .col(ColumnDef::new(Workflows::RocLink).text().not_null())
                    .col(ColumnDef::new(Workflows::RocMetadata).json_binary())
                    .col(ColumnDef::new(Workflows::ExternalId).string().not_null())
                    .col(
                        ColumnDef::new(Workflows::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workflows_registry")
                            .from(Workflows::Table, Workflows::RegistryId)
                            .to(WorkflowRegistries::Table, WorkflowRegistries::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workflows_submitter")
                            .from(Workflows::Table, Workflows::SubmitterId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_workflows_registry_uuid_version")
                    .table(Workflows::Table)
                    .col(Workflows::RegistryId)
                    .col(Workflows::Uuid)
                    .col(Workflows::Version)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_workflows_registry_external_id_version")
                    .table(Workflows::Table)
                    .col(Workflows::RegistryId)
                    .col(Workflows::ExternalId)
                    .col(Workflows::Version)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Workflows::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum Workflows {
    Table,
    Id,
    RegistryId,
    SubmitterId,
    Uuid,
    Version,
    Name,
    RocLink,
    RocMetadata,
    ExternalId,
    CreatedAt,
}
