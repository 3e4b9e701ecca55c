//! Create test_step_executions table.
//!
//! The unique (test_execution_id, test_case_step_id) index is what keeps lazy
//! materialization free of duplicates under concurrent opens. There is no
//! foreign key to test_case_steps: steps may be edited or removed after the
//! row exists, and `step_number` keeps the original identity.

use sea_orm_migration::prelude::*;

use super::m20260301_000003_create_test_executions::TestExecutions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestStepExecutions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TestStepExecutions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TestStepExecutions::TestExecutionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestStepExecutions::TestCaseStepId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestStepExecutions::StepNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestStepExecutions::Status)
                            .string_len(20)
                            .not_null()
                            .default("not_run"),
                    )
                    .col(ColumnDef::new(TestStepExecutions::ActualResult).text())
                    .col(ColumnDef::new(TestStepExecutions::Notes).text())
                    .col(ColumnDef::new(TestStepExecutions::ExecutedBy).uuid())
                    .col(
                        ColumnDef::new(TestStepExecutions::ExecutedAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(TestStepExecutions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestStepExecutions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                TestStepExecutions::Table,
                                TestStepExecutions::TestExecutionId,
                            )
                            .to(TestExecutions::Table, TestExecutions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_test_step_executions_execution_step")
                    .table(TestStepExecutions::Table)
                    .col(TestStepExecutions::TestExecutionId)
                    .col(TestStepExecutions::TestCaseStepId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestStepExecutions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TestStepExecutions {
    Table,
    Id,
    TestExecutionId,
    TestCaseStepId,
    StepNumber,
    Status,
    ActualResult,
    Notes,
    ExecutedBy,
    ExecutedAt,
    CreatedAt,
    UpdatedAt,
}
