//! Create oauth_identities table.
//!
//! At most one identity per (user, registry).

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
                    .table(OauthIdentities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OauthIdentities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OauthIdentities::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(OauthIdentities::RegistryId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OauthIdentities::ProviderUserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OauthIdentities::AccessToken)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OauthIdentities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(OauthIdentities::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_oauth_identities_user")
                            .from(OauthIdentities::Table, OauthIdentities::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_oauth_identities_registry")
                            .from(OauthIdentities::Table, OauthIdentities::RegistryId)
                            .to(WorkflowRegistries::Table, WorkflowRegistries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_oauth_identities_user_registry")
                    .table(OauthIdentities::Table)
                    .col(OauthIdentities::UserId)
                    .col(OauthIdentities::RegistryId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OauthIdentities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OauthIdentities {
    Table,
    Id,
    UserId,
    RegistryId,
    ProviderUserId,
    AccessToken,
    CreatedAt,
    UpdatedAt,
}
