//! Database queries for the test case catalog tables.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::test_case::{self as case, Entity as TestCase};
use crate::entity::test_case_step::{self as step, Entity as TestCaseStep};
use crate::error::{AppError, AppResult};
use crate::models::NewTestCaseStep;

use super::ExecutionStore;

/// Catalog status of a case that may be selected for a run.
pub const ACTIVE_CASE_STATUS: &str = "active";

/// Catalog status of a retired case.
pub const INACTIVE_CASE_STATUS: &str = "inactive";

impl<C: ConnectionTrait> ExecutionStore<'_, C> {
    /// Insert a test case row.
    pub async fn insert_test_case(
        &self,
        project_id: Uuid,
        title: &str,
        status: &str,
        last_step_number: i32,
        now: DateTime<Utc>,
    ) -> AppResult<case::Model> {
        let model = case::ActiveModel {
            id: Set(Uuid::now_v7()),
            project_id: Set(project_id),
            title: Set(title.to_string()),
            status: Set(status.to_string()),
            last_step_number: Set(last_step_number),
            created_at: Set(now),
            updated_at: Set(now),
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert test case: {}", e)))
    }

    /// Insert a step at the given position.
    pub async fn insert_test_case_step(
        &self,
        test_case_id: Uuid,
        step_number: i32,
        definition: &NewTestCaseStep,
        now: DateTime<Utc>,
    ) -> AppResult<step::Model> {
        let model = step::ActiveModel {
            id: Set(Uuid::now_v7()),
            test_case_id: Set(test_case_id),
            step_number: Set(step_number),
            description: Set(definition.description.clone()),
            expected_result: Set(definition.expected_result.clone()),
            created_at: Set(now),
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert test case step: {}", e)))
    }

    /// Change the catalog status of a case.
    pub async fn set_test_case_status(
        &self,
        existing: case::Model,
        status: &str,
        now: DateTime<Utc>,
    ) -> AppResult<case::Model> {
        let mut active: case::ActiveModel = existing.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(now);

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update test case: {}", e)))
    }

    /// Remove a step from a case.
    pub async fn delete_test_case_step(&self, step_id: Uuid) -> AppResult<()> {
        let result = TestCaseStep::delete_by_id(step_id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete test case step: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Test case step {}", step_id)));
        }
        Ok(())
    }

    /// Get a test case by ID.
    pub async fn get_test_case(&self, id: Uuid) -> AppResult<Option<case::Model>> {
        TestCase::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get test case: {}", e)))
    }

    /// Current steps of a case ordered by step number.
    pub async fn list_steps_for_case(&self, test_case_id: Uuid) -> AppResult<Vec<step::Model>> {
        TestCaseStep::find()
            .filter(step::Column::TestCaseId.eq(test_case_id))
            .order_by_asc(step::Column::StepNumber)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list test case steps: {}", e)))
    }

    /// Record the highest step number issued for a case.
    pub async fn set_last_step_number(
        &self,
        existing: case::Model,
        last_step_number: i32,
        now: DateTime<Utc>,
    ) -> AppResult<case::Model> {
        let mut active: case::ActiveModel = existing.into();
        active.last_step_number = Set(last_step_number);
        active.updated_at = Set(now);

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update test case: {}", e)))
    }

    /// Subset of `ids` that are active cases of the project.
    pub async fn visible_case_ids(
        &self,
        project_id: Uuid,
        ids: &[Uuid],
    ) -> AppResult<HashSet<Uuid>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let found: Vec<Uuid> = TestCase::find()
            .select_only()
            .column(case::Column::Id)
            .filter(case::Column::ProjectId.eq(project_id))
            .filter(case::Column::Status.eq(ACTIVE_CASE_STATUS))
            .filter(case::Column::Id.is_in(ids.to_vec()))
            .into_tuple()
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to check test cases: {}", e)))?;

        Ok(found.into_iter().collect())
    }
}
