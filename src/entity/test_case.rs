//! TestCase entity for SeaORM.
//!
//! Catalog table owned by the CRUD layer; the execution core only reads it.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_cases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    /// Catalog status: active, draft, deprecated
    pub status: String,
    /// Highest step number ever issued for this case. Removed steps keep
    /// their number reserved.
    pub last_step_number: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::test_case_step::Entity")]
    Steps,
}

impl Related<super::test_case_step::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Steps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
