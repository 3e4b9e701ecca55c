//! Test case catalog: the step lists executions are built from.
//!
//! Cases and steps belong to the CRUD layer. The execution core only reads
//! them through [`TestCaseCatalog`]; the helpers on [`DbCatalog`] are what the
//! CRUD layer uses to maintain them.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::db::test_cases::{ACTIVE_CASE_STATUS, INACTIVE_CASE_STATUS};
use crate::db::{self, DbPool, ExecutionStore};
use crate::entity::test_case;
use crate::error::{AppError, AppResult};
use crate::models::{NewTestCaseStep, TestCaseStep};

/// Read access to test cases.
#[async_trait]
pub trait TestCaseCatalog: Send + Sync {
    /// Current steps of a case ordered by step number.
    async fn get_steps(&self, test_case_id: Uuid) -> AppResult<Vec<TestCaseStep>>;

    /// Which of `ids` may be selected for a run in the project.
    async fn visible_case_ids(&self, project_id: Uuid, ids: &[Uuid])
    -> AppResult<HashSet<Uuid>>;
}

/// Catalog backed by the `test_cases` and `test_case_steps` tables.
#[derive(Clone)]
pub struct DbCatalog {
    pool: DbPool,
}

impl DbCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create an active case with its steps numbered from 1.
    pub async fn create_test_case(
        &self,
        project_id: Uuid,
        title: &str,
        steps: &[NewTestCaseStep],
        now: DateTime<Utc>,
    ) -> AppResult<test_case::Model> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Test case title is required".to_string()));
        }

        let txn = self.pool.begin().await?;
        let store = ExecutionStore::new(&txn);

        let case = store
            .insert_test_case(
                project_id,
                title,
                ACTIVE_CASE_STATUS,
                steps.len() as i32,
                now,
            )
            .await?;
        for (index, step) in steps.iter().enumerate() {
            store
                .insert_test_case_step(case.id, index as i32 + 1, step, now)
                .await?;
        }

        db::commit(txn).await?;

        info!(test_case_id = %case.id, steps = steps.len(), "Created test case");
        Ok(case)
    }

    /// Append a step numbered past every step the case has ever had.
    pub async fn add_step(
        &self,
        test_case_id: Uuid,
        step: &NewTestCaseStep,
        now: DateTime<Utc>,
    ) -> AppResult<TestCaseStep> {
        let txn = self.pool.begin().await?;
        let result = async {
            let store = ExecutionStore::new(&txn);
            let case = store
                .get_test_case(test_case_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Test case {}", test_case_id)))?;

            let next = case.last_step_number + 1;
            let created = store
                .insert_test_case_step(test_case_id, next, step, now)
                .await?;
            store.set_last_step_number(case, next, now).await?;
            Ok::<_, AppError>(created)
        }
        .await;

        match result {
            Ok(created) => {
                db::commit(txn).await?;
                Ok(created.into())
            }
            Err(e) => {
                db::rollback(txn).await;
                Err(e)
            }
        }
    }

    /// Remove a step. Step executions already recorded for it are kept.
    pub async fn remove_step(&self, step_id: Uuid) -> AppResult<()> {
        self.pool.store().delete_test_case_step(step_id).await
    }

    /// Retire a case so it can no longer be selected for new runs.
    pub async fn deactivate_test_case(
        &self,
        test_case_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<test_case::Model> {
        let store = self.pool.store();
        let case = store
            .get_test_case(test_case_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test case {}", test_case_id)))?;
        store
            .set_test_case_status(case, INACTIVE_CASE_STATUS, now)
            .await
    }
}

#[async_trait]
impl TestCaseCatalog for DbCatalog {
    async fn get_steps(&self, test_case_id: Uuid) -> AppResult<Vec<TestCaseStep>> {
        let steps = self.pool.store().list_steps_for_case(test_case_id).await?;
        Ok(steps.into_iter().map(TestCaseStep::from).collect())
    }

    async fn visible_case_ids(
        &self,
        project_id: Uuid,
        ids: &[Uuid],
    ) -> AppResult<HashSet<Uuid>> {
        self.pool.store().visible_case_ids(project_id, ids).await
    }
}
