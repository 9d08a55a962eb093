//! TestSuite entity for SeaORM.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_suites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub submitter_id: Uuid,
    /// Raw test definition document, `None` when the suite was created empty.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub test_definition: Option<JsonValue>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workflow::Entity",
        from = "Column::WorkflowId",
        to = "super::workflow::Column::Id",
        on_delete = "Restrict"
    )]
    Workflow,
    #[sea_orm(has_many = "super::test_instance::Entity")]
    TestInstances,
}

impl Related<super::workflow::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workflow.def()
    }
}

impl Related<super::test_instance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestInstances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
