//! TestStepExecution entity for SeaORM.
//!
//! Lazily materialized per (test_execution, test_case_step) pair. The
//! `step_number` is copied from the step at creation and never renumbered.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_step_executions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub test_execution_id: Uuid,
    pub test_case_step_id: Uuid,
    pub step_number: i32,
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub actual_result: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub executed_by: Option<Uuid>,
    pub executed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::test_execution::Entity",
        from = "Column::TestExecutionId",
        to = "super::test_execution::Column::Id",
        on_delete = "Cascade"
    )]
    TestExecution,
    #[sea_orm(has_many = "super::test_evidence::Entity")]
    Evidence,
}

impl Related<super::test_execution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestExecution.def()
    }
}

impl Related<super::test_evidence::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Evidence.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
