//! TestInstance entity for SeaORM.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_instances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub test_suite_id: Uuid,
    pub name: String,
    /// Declaration order inside the suite's test definition.
    pub position: i32,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub parameters: Option<JsonValue>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::test_suite::Entity",
        from = "Column::TestSuiteId",
        to = "super::test_suite::Column::Id",
        on_delete = "Restrict"
    )]
    TestSuite,
    #[sea_orm(has_one = "super::testing_service::Entity")]
    TestingService,
}

impl Related<super::test_suite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestSuite.def()
    }
}

impl Related<super::testing_service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestingService.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
