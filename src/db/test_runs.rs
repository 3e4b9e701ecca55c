//! Database queries for test runs.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Condition, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::test_evidence::{self as evidence, Entity as TestEvidence};
use crate::entity::test_execution::{self as execution, Entity as TestExecution};
use crate::entity::test_run::{self as run, ActiveModel, Entity as TestRun};
use crate::entity::test_step_execution::{self as step_execution, Entity as TestStepExecution};
use crate::error::{AppError, AppResult};
use crate::models::{ListRunsParams, RunMetadata};

use super::ExecutionStore;

impl<C: ConnectionTrait> ExecutionStore<'_, C> {
    /// Insert a new test run.
    pub async fn insert_run(
        &self,
        id: Uuid,
        project_id: Uuid,
        metadata: &RunMetadata,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<run::Model> {
        let model = ActiveModel {
            id: Set(id),
            project_id: Set(project_id),
            name: Set(metadata.name.clone()),
            description: Set(metadata.description.clone()),
            environment: Set(metadata.environment.clone()),
            status: Set(metadata.status.as_str().to_string()),
            start_date: Set(metadata.start_date),
            end_date: Set(metadata.end_date),
            notes: Set(metadata.notes.clone()),
            ai_insights: Set(None),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert test run: {}", e)))
    }

    /// Get a test run by ID.
    pub async fn get_run(&self, id: Uuid) -> AppResult<Option<run::Model>> {
        TestRun::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get test run: {}", e)))
    }

    /// Get a test run by ID, failing with NotFound.
    pub async fn require_run(&self, id: Uuid) -> AppResult<run::Model> {
        self.get_run(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test run {}", id)))
    }

    /// List runs of a project, newest first.
    pub async fn list_runs(
        &self,
        project_id: Uuid,
        params: &ListRunsParams,
    ) -> AppResult<Vec<run::Model>> {
        let mut select = TestRun::find().filter(run::Column::ProjectId.eq(project_id));

        if let Some(status) = params.status {
            select = select.filter(run::Column::Status.eq(status.as_str()));
        }

        if let Some(search) = params.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            select = select.filter(
                Condition::any()
                    .add(run::Column::Name.contains(search))
                    .add(run::Column::Description.contains(search)),
            );
        }

        select
            .order_by_desc(run::Column::CreatedAt)
            .order_by_desc(run::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list test runs: {}", e)))
    }

    /// Replace the actor-editable fields of a run.
    pub async fn update_run_metadata(
        &self,
        existing: run::Model,
        metadata: &RunMetadata,
        now: DateTime<Utc>,
    ) -> AppResult<run::Model> {
        let mut active: ActiveModel = existing.into();
        active.name = Set(metadata.name.clone());
        active.description = Set(metadata.description.clone());
        active.environment = Set(metadata.environment.clone());
        active.status = Set(metadata.status.as_str().to_string());
        active.start_date = Set(metadata.start_date);
        active.end_date = Set(metadata.end_date);
        active.notes = Set(metadata.notes.clone());
        active.updated_at = Set(now);

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update test run: {}", e)))
    }

    /// Store AI insight text on a run.
    pub async fn set_run_ai_insights(
        &self,
        existing: run::Model,
        insights: String,
        now: DateTime<Utc>,
    ) -> AppResult<run::Model> {
        let mut active: ActiveModel = existing.into();
        active.ai_insights = Set(Some(insights));
        active.updated_at = Set(now);

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to store AI insights: {}", e)))
    }

    /// Delete a run and everything it owns: executions, their step executions
    /// and evidence. Returns the evidence handles that were referenced so the
    /// caller can release the stored files once the deletion is committed.
    ///
    /// Children are removed explicitly rather than relying on foreign key
    /// cascades, which SQLite only honors when enabled per connection.
    pub async fn delete_run_cascade(&self, run_id: Uuid) -> AppResult<Vec<String>> {
        let conn = self.connection();

        let execution_ids: Vec<Uuid> = TestExecution::find()
            .select_only()
            .column(execution::Column::Id)
            .filter(execution::Column::TestRunId.eq(run_id))
            .into_tuple()
            .all(conn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list run executions: {}", e)))?;

        let step_execution_ids: Vec<Uuid> = if execution_ids.is_empty() {
            Vec::new()
        } else {
            TestStepExecution::find()
                .select_only()
                .column(step_execution::Column::Id)
                .filter(step_execution::Column::TestExecutionId.is_in(execution_ids.clone()))
                .into_tuple()
                .all(conn)
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to list step executions: {}", e))
                })?
        };

        let mut handles = Vec::new();
        if !step_execution_ids.is_empty() {
            handles = TestEvidence::find()
                .select_only()
                .column(evidence::Column::FileHandle)
                .filter(evidence::Column::TestStepExecutionId.is_in(step_execution_ids.clone()))
                .into_tuple()
                .all(conn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to list evidence: {}", e)))?;

            TestEvidence::delete_many()
                .filter(evidence::Column::TestStepExecutionId.is_in(step_execution_ids))
                .exec(conn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to delete evidence: {}", e)))?;
        }

        if !execution_ids.is_empty() {
            TestStepExecution::delete_many()
                .filter(step_execution::Column::TestExecutionId.is_in(execution_ids))
                .exec(conn)
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to delete step executions: {}", e))
                })?;
        }

        TestExecution::delete_many()
            .filter(execution::Column::TestRunId.eq(run_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete executions: {}", e)))?;

        let result = TestRun::delete_by_id(run_id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete test run: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Test run {}", run_id)));
        }

        Ok(handles)
    }
}
