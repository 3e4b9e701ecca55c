//! Create test_executions table.
//!
//! One execution per (test_run_id, test_case_id), enforced by a unique index.

use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_test_cases::TestCases;
use super::m20260301_000002_create_test_runs::TestRuns;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestExecutions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TestExecutions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TestExecutions::TestRunId).uuid().not_null())
                    .col(ColumnDef::new(TestExecutions::TestCaseId).uuid().not_null())
                    .col(
                        ColumnDef::new(TestExecutions::Status)
                            .string_len(20)
                            .not_null()
                            .default("not_run"),
                    )
                    .col(ColumnDef::new(TestExecutions::ActualResult).text())
                    .col(ColumnDef::new(TestExecutions::Notes).text())
                    .col(ColumnDef::new(TestExecutions::ExecutedBy).uuid())
                    .col(ColumnDef::new(TestExecutions::ExecutedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(TestExecutions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestExecutions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestExecutions::Table, TestExecutions::TestRunId)
                            .to(TestRuns::Table, TestRuns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestExecutions::Table, TestExecutions::TestCaseId)
                            .to(TestCases::Table, TestCases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_test_executions_run_case")
                    .table(TestExecutions::Table)
                    .col(TestExecutions::TestRunId)
                    .col(TestExecutions::TestCaseId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestExecutions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TestExecutions {
    Table,
    Id,
    TestRunId,
    TestCaseId,
    Status,
    ActualResult,
    Notes,
    ExecutedBy,
    ExecutedAt,
    CreatedAt,
    UpdatedAt,
}
