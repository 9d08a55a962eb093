//! TestingService entity: the CI binding of exactly one test instance.
//!
//! The primary key is the owning instance id.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "testing_services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_type: String,
    pub url: String,
    pub resource: Option<String>,
    pub key: Option<String>,
    pub secret: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::test_instance::Entity",
        from = "Column::Id",
        to = "super::test_instance::Column::Id",
        on_delete = "Restrict"
    )]
    TestInstance,
}

impl Related<super::test_instance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestInstance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
