//! Database queries for evidence records.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::test_evidence::{self as evidence, ActiveModel, Entity as TestEvidence};
use crate::error::{AppError, AppResult};
use crate::models::ActorContext;

use super::ExecutionStore;

/// A file already accepted by the evidence store, ready to be recorded.
#[derive(Debug, Clone)]
pub struct StoredEvidence {
    pub step_execution_id: Uuid,
    pub file_name: String,
    pub file_handle: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub checksum: String,
    pub description: Option<String>,
}

impl<C: ConnectionTrait> ExecutionStore<'_, C> {
    /// Append an evidence record. Existing records are never replaced.
    pub async fn insert_evidence(
        &self,
        stored: StoredEvidence,
        ctx: &ActorContext,
    ) -> AppResult<evidence::Model> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            test_step_execution_id: Set(stored.step_execution_id),
            file_name: Set(stored.file_name),
            file_handle: Set(stored.file_handle),
            content_type: Set(stored.content_type),
            size_bytes: Set(stored.size_bytes),
            checksum: Set(stored.checksum),
            description: Set(stored.description),
            uploaded_by: Set(ctx.actor_id),
            created_at: Set(ctx.at),
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert evidence: {}", e)))
    }

    /// Evidence of one step execution, oldest first.
    pub async fn list_evidence_for_step_execution(
        &self,
        step_execution_id: Uuid,
    ) -> AppResult<Vec<evidence::Model>> {
        self.list_evidence_for_step_executions(&[step_execution_id])
            .await
    }

    /// Evidence of several step executions, oldest first.
    pub async fn list_evidence_for_step_executions(
        &self,
        step_execution_ids: &[Uuid],
    ) -> AppResult<Vec<evidence::Model>> {
        if step_execution_ids.is_empty() {
            return Ok(Vec::new());
        }

        TestEvidence::find()
            .filter(evidence::Column::TestStepExecutionId.is_in(step_execution_ids.to_vec()))
            .order_by_asc(evidence::Column::CreatedAt)
            .order_by_asc(evidence::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list evidence: {}", e)))
    }
}
