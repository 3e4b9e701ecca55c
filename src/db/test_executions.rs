//! Database queries for test executions.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::test_execution::{self as execution, ActiveModel, Entity as TestExecution};
use crate::error::{AppError, AppResult};
use crate::models::{ActorContext, ExecutionStatus, OverallResult};

use super::ExecutionStore;

impl<C: ConnectionTrait> ExecutionStore<'_, C> {
    /// Insert a fresh `not_run` execution for a case within a run.
    pub async fn insert_execution(
        &self,
        id: Uuid,
        run_id: Uuid,
        test_case_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<execution::Model> {
        let model = ActiveModel {
            id: Set(id),
            test_run_id: Set(run_id),
            test_case_id: Set(test_case_id),
            status: Set(ExecutionStatus::NotRun.as_str().to_string()),
            actual_result: Set(None),
            notes: Set(None),
            executed_by: Set(None),
            executed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        model.insert(self.connection()).await.map_err(|e| {
            AppError::Database(format!(
                "Failed to insert execution for test case {}: {}",
                test_case_id, e
            ))
        })
    }

    /// Get an execution by ID.
    pub async fn get_execution(&self, id: Uuid) -> AppResult<Option<execution::Model>> {
        TestExecution::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get execution: {}", e)))
    }

    /// Get an execution by ID, failing with NotFound.
    pub async fn require_execution(&self, id: Uuid) -> AppResult<execution::Model> {
        self.get_execution(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test execution {}", id)))
    }

    /// Get all executions of a run in creation order.
    pub async fn list_executions_for_run(&self, run_id: Uuid) -> AppResult<Vec<execution::Model>> {
        TestExecution::find()
            .filter(execution::Column::TestRunId.eq(run_id))
            .order_by_asc(execution::Column::Id) // UUIDv7 is time-ordered
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list executions for run: {}", e)))
    }

    /// Executions of several runs, for batched rollups.
    pub async fn list_executions_for_runs(
        &self,
        run_ids: &[Uuid],
    ) -> AppResult<Vec<execution::Model>> {
        if run_ids.is_empty() {
            return Ok(Vec::new());
        }

        TestExecution::find()
            .filter(execution::Column::TestRunId.is_in(run_ids.to_vec()))
            .order_by_asc(execution::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list executions: {}", e)))
    }

    /// Overwrite the actor-set result fields of an execution.
    pub async fn update_overall_result(
        &self,
        existing: execution::Model,
        result: &OverallResult,
        ctx: &ActorContext,
    ) -> AppResult<execution::Model> {
        let mut active: ActiveModel = existing.into();
        active.status = Set(result.status.as_str().to_string());
        active.notes = Set(result.notes.clone());
        if let Some(ref actual_result) = result.actual_result {
            active.actual_result = Set(Some(actual_result.clone()));
        }
        active.executed_by = Set(Some(ctx.actor_id));
        active.executed_at = Set(Some(ctx.at));
        active.updated_at = Set(ctx.at);

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update execution: {}", e)))
    }
}
