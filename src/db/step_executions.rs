//! Database queries for step executions.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use tracing::debug;
use uuid::Uuid;

use crate::entity::test_step_execution::{
    self as step_execution, ActiveModel, Entity as TestStepExecution,
};
use crate::error::{AppError, AppResult};
use crate::models::{ActorContext, ExecutionStatus, StepUpdate, TestCaseStep};

use super::ExecutionStore;

impl<C: ConnectionTrait> ExecutionStore<'_, C> {
    /// Find the step execution for a (execution, step) pair.
    pub async fn find_step_execution(
        &self,
        execution_id: Uuid,
        step_id: Uuid,
    ) -> AppResult<Option<step_execution::Model>> {
        TestStepExecution::find()
            .filter(step_execution::Column::TestExecutionId.eq(execution_id))
            .filter(step_execution::Column::TestCaseStepId.eq(step_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find step execution: {}", e)))
    }

    /// Return the step execution for a step, creating a `not_run` row if none
    /// exists yet.
    ///
    /// Two concurrent callers may both miss the lookup; the unique index on
    /// (test_execution_id, test_case_step_id) lets exactly one insert win and
    /// the loser re-reads the winner's row. Must not be called inside a
    /// transaction on PostgreSQL, where the failed insert would abort it.
    pub async fn materialize_step_execution(
        &self,
        execution_id: Uuid,
        step: &TestCaseStep,
        now: DateTime<Utc>,
    ) -> AppResult<step_execution::Model> {
        if let Some(existing) = self.find_step_execution(execution_id, step.id).await? {
            return Ok(existing);
        }

        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            test_execution_id: Set(execution_id),
            test_case_step_id: Set(step.id),
            step_number: Set(step.step_number),
            status: Set(ExecutionStatus::NotRun.as_str().to_string()),
            actual_result: Set(None),
            notes: Set(None),
            executed_by: Set(None),
            executed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match model.insert(self.connection()).await {
            Ok(created) => {
                debug!(
                    execution_id = %execution_id,
                    step_number = step.step_number,
                    "Materialized step execution"
                );
                Ok(created)
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!(
                    execution_id = %execution_id,
                    step_number = step.step_number,
                    "Step execution created concurrently, re-reading"
                );
                self.find_step_execution(execution_id, step.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Database(format!(
                            "Step execution for step {} vanished after unique violation",
                            step.id
                        ))
                    })
            }
            Err(e) => Err(AppError::Database(format!(
                "Failed to insert step execution: {}",
                e
            ))),
        }
    }

    /// Get a step execution by ID.
    pub async fn get_step_execution(&self, id: Uuid) -> AppResult<Option<step_execution::Model>> {
        TestStepExecution::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get step execution: {}", e)))
    }

    /// Get a step execution by ID, failing with NotFound.
    pub async fn require_step_execution(&self, id: Uuid) -> AppResult<step_execution::Model> {
        self.get_step_execution(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test step execution {}", id)))
    }

    /// All step executions of an execution, ordered by step number.
    ///
    /// May include rows for steps since removed from the case.
    pub async fn list_step_executions_for_execution(
        &self,
        execution_id: Uuid,
    ) -> AppResult<Vec<step_execution::Model>> {
        TestStepExecution::find()
            .filter(step_execution::Column::TestExecutionId.eq(execution_id))
            .order_by_asc(step_execution::Column::StepNumber)
            .order_by_asc(step_execution::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list step executions: {}", e)))
    }

    /// Overwrite status, actual result and notes, stamping who and when.
    pub async fn apply_step_update(
        &self,
        existing: step_execution::Model,
        update: &StepUpdate,
        ctx: &ActorContext,
    ) -> AppResult<step_execution::Model> {
        let mut active: ActiveModel = existing.into();
        active.status = Set(update.status.as_str().to_string());
        active.actual_result = Set(update.actual_result.clone());
        active.notes = Set(update.notes.clone());
        active.executed_by = Set(Some(ctx.actor_id));
        active.executed_at = Set(Some(ctx.at));
        active.updated_at = Set(ctx.at);

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update step execution: {}", e)))
    }
}
