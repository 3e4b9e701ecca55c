//! Evidence entity for SeaORM.
//!
//! Append-only attachments for a step execution. The file itself lives in the
//! evidence store; `file_handle` is the opaque key it returned.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_evidence")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub test_step_execution_id: Uuid,

    // File info
    pub file_name: String,
    pub file_handle: String,
    pub content_type: String,
    pub size_bytes: i64,
    /// Hex SHA-256 of the stored bytes
    pub checksum: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub uploaded_by: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::test_step_execution::Entity",
        from = "Column::TestStepExecutionId",
        to = "super::test_step_execution::Column::Id",
        on_delete = "Cascade"
    )]
    StepExecution,
}

impl Related<super::test_step_execution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StepExecution.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
