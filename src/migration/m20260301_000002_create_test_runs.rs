//! Create test_runs table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestRuns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TestRuns::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TestRuns::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(TestRuns::Name).string_len(255).not_null())
                    .col(ColumnDef::new(TestRuns::Description).text())
                    .col(ColumnDef::new(TestRuns::Environment).string_len(255))
                    .col(
                        ColumnDef::new(TestRuns::Status)
                            .string_len(20)
                            .not_null()
                            .default("planned"),
                    )
                    .col(ColumnDef::new(TestRuns::StartDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(TestRuns::EndDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(TestRuns::Notes).text())
                    .col(ColumnDef::new(TestRuns::AiInsights).text())
                    .col(ColumnDef::new(TestRuns::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(TestRuns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestRuns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_runs_project_created")
                    .table(TestRuns::Table)
                    .col(TestRuns::ProjectId)
                    .col(TestRuns::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestRuns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TestRuns {
    Table,
    Id,
    ProjectId,
    Name,
    Description,
    Environment,
    Status,
    StartDate,
    EndDate,
    Notes,
    AiInsights,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
