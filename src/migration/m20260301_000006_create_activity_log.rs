//! Create activity_log table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActivityLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityLog::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivityLog::ActorId).uuid().not_null())
                    .col(ColumnDef::new(ActivityLog::ProjectId).uuid())
                    .col(ColumnDef::new(ActivityLog::EntityType).string_len(50).not_null())
                    .col(ColumnDef::new(ActivityLog::EntityId).uuid().not_null())
                    .col(ColumnDef::new(ActivityLog::Action).string_len(50).not_null())
                    .col(ColumnDef::new(ActivityLog::Description).text().not_null())
                    .col(
                        ColumnDef::new(ActivityLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activity_log_entity")
                    .table(ActivityLog::Table)
                    .col(ActivityLog::EntityType)
                    .col(ActivityLog::EntityId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ActivityLog {
    Table,
    Id,
    ActorId,
    ProjectId,
    EntityType,
    EntityId,
    Action,
    Description,
    CreatedAt,
}
