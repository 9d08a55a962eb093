//! Workflow entity for SeaORM.
//!
//! One row per registered workflow version.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workflows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub registry_id: Uuid,
    pub submitter_id: Uuid,
    pub uuid: Uuid,
    pub version: String,
    pub name: String,
    pub roc_link: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub roc_metadata: Option<JsonValue>,
    pub external_id: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workflow_registry::Entity",
        from = "Column::RegistryId",
        to = "super::workflow_registry::Column::Id",
        on_delete = "Restrict"
    )]
    Registry,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SubmitterId",
        to = "super::user::Column::Id",
        on_delete = "Restrict"
    )]
    Submitter,
    #[sea_orm(has_many = "super::test_suite::Entity")]
    TestSuites,
}

impl Related<super::workflow_registry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registry.def()
    }
}

impl Related<super::test_suite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestSuites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
