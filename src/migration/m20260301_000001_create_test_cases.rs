//! Create test_cases and test_case_steps tables.
//!
//! Catalog tables owned by the CRUD layer. Steps are unique per
//! (test_case_id, step_number); `last_step_number` keeps numbers of removed
//! steps from being issued again.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestCases::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TestCases::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TestCases::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(TestCases::Title).string_len(500).not_null())
                    .col(
                        ColumnDef::new(TestCases::Status)
                            .string_len(20)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(TestCases::LastStepNumber)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TestCases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestCases::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_cases_project_id")
                    .table(TestCases::Table)
                    .col(TestCases::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TestCaseSteps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TestCaseSteps::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TestCaseSteps::TestCaseId).uuid().not_null())
                    .col(
                        ColumnDef::new(TestCaseSteps::StepNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TestCaseSteps::Description).text().not_null())
                    .col(
                        ColumnDef::new(TestCaseSteps::ExpectedResult)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestCaseSteps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestCaseSteps::Table, TestCaseSteps::TestCaseId)
                            .to(TestCases::Table, TestCases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_test_case_steps_case_step_number")
                    .table(TestCaseSteps::Table)
                    .col(TestCaseSteps::TestCaseId)
                    .col(TestCaseSteps::StepNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestCaseSteps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TestCases::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TestCases {
    Table,
    Id,
    ProjectId,
    Title,
    Status,
    LastStepNumber,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum TestCaseSteps {
    Table,
    Id,
    TestCaseId,
    StepNumber,
    Description,
    ExpectedResult,
    CreatedAt,
}
