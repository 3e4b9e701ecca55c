//! Run lifecycle: creating runs with their executions, editing run metadata,
//! recording overall results and deleting runs.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sea_orm::DatabaseTransaction;
use tracing::{info, warn};
use uuid::Uuid;

use super::activity::{ActivityLog, emit};
use super::aggregator::{completion_percentage, summarize_run};
use super::catalog::TestCaseCatalog;
use super::evidence_store::EvidenceStore;
use crate::db::{self, DbPool, ExecutionStore};
use crate::entity::test_run;
use crate::error::{AppError, AppResult};
use crate::models::{
    ActivityAction, ActivityEntity, ActivityEvent, ActorContext, CreateRunRequest,
    ExecutionSummary, ListRunsParams, OverallResult, RunMetadata, RunWithSummary, TestExecution,
    TestRun,
};

/// Owns test runs and the executions created with them.
#[derive(Clone)]
pub struct RunLifecycleManager {
    pool: DbPool,
    catalog: Arc<dyn TestCaseCatalog>,
    evidence: Arc<dyn EvidenceStore>,
    activity: Arc<dyn ActivityLog>,
}

impl RunLifecycleManager {
    pub fn new(
        pool: DbPool,
        catalog: Arc<dyn TestCaseCatalog>,
        evidence: Arc<dyn EvidenceStore>,
        activity: Arc<dyn ActivityLog>,
    ) -> Self {
        Self {
            pool,
            catalog,
            evidence,
            activity,
        }
    }

    /// Create a run with one `not_run` execution per selected test case.
    ///
    /// The run and its executions are written in one transaction. Duplicate
    /// case ids collapse to a single execution.
    pub async fn create_run(
        &self,
        project_id: Uuid,
        request: CreateRunRequest,
        ctx: &ActorContext,
    ) -> AppResult<TestRun> {
        let metadata = request.metadata.normalized()?;

        if request.test_case_ids.is_empty() {
            return Err(AppError::Validation(
                "At least one test case must be selected".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let case_ids: Vec<Uuid> = request
            .test_case_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();

        let visible = self.catalog.visible_case_ids(project_id, &case_ids).await?;
        let missing: Vec<String> = case_ids
            .iter()
            .filter(|id| !visible.contains(id))
            .map(Uuid::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Test cases not available in project {}: {}",
                project_id,
                missing.join(", ")
            )));
        }

        let txn = self.pool.begin().await?;
        let run = match insert_run_with_executions(&txn, project_id, &metadata, &case_ids, ctx)
            .await
        {
            Ok(run) => run,
            Err(e) => {
                db::rollback(txn).await;
                return Err(e);
            }
        };
        db::commit(txn).await?;

        info!(
            run_id = %run.id,
            project_id = %project_id,
            actor_id = %ctx.actor_id,
            executions = case_ids.len(),
            "Created test run"
        );

        let run = TestRun::try_from(run)?;
        emit(
            self.activity.as_ref(),
            ActivityEvent {
                actor_id: ctx.actor_id,
                project_id: Some(project_id),
                entity: ActivityEntity::TestRun,
                entity_id: run.id,
                action: ActivityAction::Create,
                description: format!(
                    "Created test run '{}' with {} test cases",
                    run.name,
                    case_ids.len()
                ),
                at: ctx.at,
            },
        )
        .await;

        Ok(run)
    }

    /// Replace the editable fields of a run. Executions are untouched.
    pub async fn update_run_metadata(
        &self,
        run_id: Uuid,
        metadata: RunMetadata,
        ctx: &ActorContext,
    ) -> AppResult<TestRun> {
        let metadata = metadata.normalized()?;
        let store = self.pool.store();

        let existing = store.require_run(run_id).await?;
        let updated = TestRun::try_from(
            store
                .update_run_metadata(existing, &metadata, ctx.at)
                .await?,
        )?;

        info!(run_id = %run_id, actor_id = %ctx.actor_id, status = %updated.status, "Updated test run");

        emit(
            self.activity.as_ref(),
            ActivityEvent {
                actor_id: ctx.actor_id,
                project_id: Some(updated.project_id),
                entity: ActivityEntity::TestRun,
                entity_id: run_id,
                action: ActivityAction::Update,
                description: format!("Updated test run '{}'", updated.name),
                at: ctx.at,
            },
        )
        .await;

        Ok(updated)
    }

    /// Store the AI-generated analysis text of a run.
    pub async fn record_ai_insights(
        &self,
        run_id: Uuid,
        insights: String,
        ctx: &ActorContext,
    ) -> AppResult<TestRun> {
        if insights.trim().is_empty() {
            return Err(AppError::Validation("Insights text is required".to_string()));
        }

        let store = self.pool.store();
        let existing = store.require_run(run_id).await?;
        let updated = TestRun::try_from(
            store
                .set_run_ai_insights(existing, insights, ctx.at)
                .await?,
        )?;

        emit(
            self.activity.as_ref(),
            ActivityEvent {
                actor_id: ctx.actor_id,
                project_id: Some(updated.project_id),
                entity: ActivityEntity::TestRun,
                entity_id: run_id,
                action: ActivityAction::Update,
                description: format!("Stored AI insights for test run '{}'", updated.name),
                at: ctx.at,
            },
        )
        .await;

        Ok(updated)
    }

    /// Overwrite the overall result of an execution. Step executions are not
    /// touched.
    pub async fn set_overall_result(
        &self,
        execution_id: Uuid,
        result: OverallResult,
        ctx: &ActorContext,
    ) -> AppResult<TestExecution> {
        let store = self.pool.store();

        let existing = store.require_execution(execution_id).await?;
        let run_id = existing.test_run_id;
        let updated =
            TestExecution::try_from(store.update_overall_result(existing, &result, ctx).await?)?;

        info!(
            execution_id = %execution_id,
            actor_id = %ctx.actor_id,
            status = %updated.status,
            "Recorded overall result"
        );

        let project_id = store.get_run(run_id).await?.map(|run| run.project_id);
        emit(
            self.activity.as_ref(),
            ActivityEvent {
                actor_id: ctx.actor_id,
                project_id,
                entity: ActivityEntity::TestExecution,
                entity_id: execution_id,
                action: ActivityAction::Update,
                description: format!("Set execution result to {}", updated.status),
                at: ctx.at,
            },
        )
        .await;

        Ok(updated)
    }

    /// Delete a run together with its executions, step executions and
    /// evidence. Stored evidence files are released after the commit.
    pub async fn delete_run(&self, run_id: Uuid, ctx: &ActorContext) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        let (run, handles) = match delete_run_rows(&txn, run_id).await {
            Ok(deleted) => deleted,
            Err(e) => {
                db::rollback(txn).await;
                return Err(e);
            }
        };
        db::commit(txn).await?;

        info!(
            run_id = %run_id,
            actor_id = %ctx.actor_id,
            evidence_files = handles.len(),
            "Deleted test run"
        );

        for handle in &handles {
            if let Err(e) = self.evidence.remove(handle).await {
                warn!(run_id = %run_id, handle = %handle, "Failed to remove evidence file: {}", e);
            }
        }

        emit(
            self.activity.as_ref(),
            ActivityEvent {
                actor_id: ctx.actor_id,
                project_id: Some(run.project_id),
                entity: ActivityEntity::TestRun,
                entity_id: run_id,
                action: ActivityAction::Delete,
                description: format!("Deleted test run '{}'", run.name),
                at: ctx.at,
            },
        )
        .await;

        Ok(())
    }

    pub async fn get_run(&self, run_id: Uuid) -> AppResult<TestRun> {
        TestRun::try_from(self.pool.store().require_run(run_id).await?)
    }

    /// Runs of a project with their rollups, newest first.
    pub async fn list_runs(
        &self,
        project_id: Uuid,
        params: &ListRunsParams,
    ) -> AppResult<Vec<RunWithSummary>> {
        let store = self.pool.store();

        let runs = store.list_runs(project_id, params).await?;
        let run_ids: Vec<Uuid> = runs.iter().map(|run| run.id).collect();

        let mut summaries: HashMap<Uuid, ExecutionSummary> = HashMap::new();
        for execution in store.list_executions_for_runs(&run_ids).await? {
            let execution = TestExecution::try_from(execution)?;
            summaries
                .entry(execution.test_run_id)
                .or_default()
                .record(execution.status);
        }

        runs.into_iter()
            .map(|run| {
                let summary = summaries.remove(&run.id).unwrap_or_default();
                Ok(RunWithSummary {
                    run: TestRun::try_from(run)?,
                    completion_percentage: completion_percentage(&summary),
                    summary,
                })
            })
            .collect()
    }

    /// Executions of a run in creation order.
    pub async fn list_executions(&self, run_id: Uuid) -> AppResult<Vec<TestExecution>> {
        let store = self.pool.store();
        store.require_run(run_id).await?;

        store
            .list_executions_for_run(run_id)
            .await?
            .into_iter()
            .map(TestExecution::try_from)
            .collect()
    }

    pub async fn get_execution(&self, execution_id: Uuid) -> AppResult<TestExecution> {
        TestExecution::try_from(self.pool.store().require_execution(execution_id).await?)
    }

    /// A run with the rollup of its executions' actor-set statuses.
    pub async fn run_summary(&self, run_id: Uuid) -> AppResult<RunWithSummary> {
        let run = self.get_run(run_id).await?;
        let executions = self.list_executions(run_id).await?;
        let summary = summarize_run(&executions);

        Ok(RunWithSummary {
            run,
            completion_percentage: completion_percentage(&summary),
            summary,
        })
    }
}

/// Insert the run row and one `not_run` execution per case.
async fn insert_run_with_executions(
    txn: &DatabaseTransaction,
    project_id: Uuid,
    metadata: &RunMetadata,
    case_ids: &[Uuid],
    ctx: &ActorContext,
) -> AppResult<test_run::Model> {
    let store = ExecutionStore::new(txn);

    let run = store
        .insert_run(Uuid::now_v7(), project_id, metadata, ctx.actor_id, ctx.at)
        .await?;
    for case_id in case_ids {
        store
            .insert_execution(Uuid::now_v7(), run.id, *case_id, ctx.at)
            .await?;
    }
    Ok(run)
}

/// Delete the run and its children, returning the run row and the evidence
/// handles it referenced.
async fn delete_run_rows(
    txn: &DatabaseTransaction,
    run_id: Uuid,
) -> AppResult<(test_run::Model, Vec<String>)> {
    let store = ExecutionStore::new(txn);

    let run = store.require_run(run_id).await?;
    let handles = store.delete_run_cascade(run_id).await?;
    Ok((run, handles))
}
