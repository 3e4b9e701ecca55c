//! Create test_evidence table.

use sea_orm_migration::prelude::*;

use super::m20260301_000004_create_test_step_executions::TestStepExecutions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestEvidence::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TestEvidence::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TestEvidence::TestStepExecutionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TestEvidence::FileName).string_len(255).not_null())
                    .col(
                        ColumnDef::new(TestEvidence::FileHandle)
                            .string_len(1024)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestEvidence::ContentType)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TestEvidence::SizeBytes).big_integer().not_null())
                    .col(ColumnDef::new(TestEvidence::Checksum).string_len(64).not_null())
                    .col(ColumnDef::new(TestEvidence::Description).text())
                    .col(ColumnDef::new(TestEvidence::UploadedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(TestEvidence::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TestEvidence::Table, TestEvidence::TestStepExecutionId)
                            .to(TestStepExecutions::Table, TestStepExecutions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_evidence_step_execution_id")
                    .table(TestEvidence::Table)
                    .col(TestEvidence::TestStepExecutionId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestEvidence::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TestEvidence {
    Table,
    Id,
    TestStepExecutionId,
    FileName,
    FileHandle,
    ContentType,
    SizeBytes,
    Checksum,
    Description,
    UploadedBy,
    CreatedAt,
}
