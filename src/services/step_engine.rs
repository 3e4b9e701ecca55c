//! Step execution engine.
//!
//! Keeps one step execution per current catalog step of an execution,
//! creating missing ones on first access, and applies single and bulk step
//! updates together with their evidence.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseTransaction;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::activity::{ActivityLog, emit};
use super::aggregator::summarize_execution;
use super::catalog::TestCaseCatalog;
use super::evidence_store::{EvidenceStore, checksum, content_type_for_file_name};
use crate::db::evidence::StoredEvidence;
use crate::db::{self, DbPool, ExecutionStore};
use crate::entity::test_step_execution;
use crate::error::{AppError, AppResult};
use crate::models::{
    ActivityAction, ActivityEntity, ActivityEvent, ActorContext, BulkStepUpdate, Evidence,
    EvidenceMetadata, EvidenceUpload, ExecutionSummary, StepExecution, StepUpdate,
    StepWithExecution, TestCaseStep,
};

#[derive(Clone)]
pub struct StepExecutionEngine {
    pool: DbPool,
    catalog: Arc<dyn TestCaseCatalog>,
    evidence: Arc<dyn EvidenceStore>,
    activity: Arc<dyn ActivityLog>,
    max_evidence_size: usize,
}

impl StepExecutionEngine {
    pub fn new(
        pool: DbPool,
        catalog: Arc<dyn TestCaseCatalog>,
        evidence: Arc<dyn EvidenceStore>,
        activity: Arc<dyn ActivityLog>,
        max_evidence_size: usize,
    ) -> Self {
        Self {
            pool,
            catalog,
            evidence,
            activity,
            max_evidence_size,
        }
    }

    /// Pair every current step of the execution's test case with its step
    /// execution, creating `not_run` records for steps seen for the first
    /// time. Ordered by current step number.
    ///
    /// Safe to call concurrently for the same execution.
    pub async fn load_step_executions(
        &self,
        execution_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<StepWithExecution>> {
        let pairs = self.materialize(execution_id, now).await?;

        let ids: Vec<Uuid> = pairs.iter().map(|(_, se)| se.id).collect();
        let mut evidence_by_step: HashMap<Uuid, Vec<Evidence>> = HashMap::new();
        for record in self
            .pool
            .store()
            .list_evidence_for_step_executions(&ids)
            .await?
        {
            evidence_by_step
                .entry(record.test_step_execution_id)
                .or_default()
                .push(record.into());
        }

        pairs
            .into_iter()
            .map(|(step, model)| {
                let evidence = evidence_by_step.remove(&model.id).unwrap_or_default();
                Ok(StepWithExecution {
                    step,
                    execution: StepExecution::try_from(model)?,
                    evidence,
                })
            })
            .collect()
    }

    /// Record the result of one step, attaching evidence if supplied.
    pub async fn update_step(
        &self,
        step_execution_id: Uuid,
        update: StepUpdate,
        ctx: &ActorContext,
    ) -> AppResult<StepExecution> {
        if let Some(ref evidence) = update.evidence {
            evidence.validate(self.max_evidence_size)?;
        }

        let txn = self.pool.begin().await?;
        let mut stored = Vec::new();

        let outcome = self
            .apply_by_id(&txn, step_execution_id, &update, ctx, &mut stored)
            .await;
        let updated = self.finish(txn, outcome, &stored).await?;

        info!(
            step_execution_id = %step_execution_id,
            actor_id = %ctx.actor_id,
            status = %updated.status,
            evidence = stored.len(),
            "Updated step execution"
        );

        emit(
            self.activity.as_ref(),
            ActivityEvent {
                actor_id: ctx.actor_id,
                project_id: self.project_of_execution(updated.test_execution_id).await,
                entity: ActivityEntity::TestStepExecution,
                entity_id: step_execution_id,
                action: ActivityAction::Update,
                description: format!(
                    "Set step {} result to {}",
                    updated.step_number, updated.status
                ),
                at: ctx.at,
            },
        )
        .await;

        Ok(updated)
    }

    /// Apply results for several steps of one execution in one transaction.
    ///
    /// Entries are keyed by the current step number of the case. Numbers
    /// without a current step are skipped. Returns the updated step
    /// executions in ascending step number order.
    pub async fn bulk_update_steps(
        &self,
        execution_id: Uuid,
        bulk: BulkStepUpdate,
        ctx: &ActorContext,
    ) -> AppResult<Vec<StepExecution>> {
        let entries = bulk.into_ordered()?;
        let submitted = entries.len();

        let by_number: HashMap<i32, Uuid> = self
            .materialize(execution_id, ctx.at)
            .await?
            .into_iter()
            .map(|(step, model)| (step.step_number, model.id))
            .collect();

        let mut known = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(&step_execution_id) = by_number.get(&entry.step_number) else {
                debug!(
                    execution_id = %execution_id,
                    step_number = entry.step_number,
                    "Ignoring update for unknown step"
                );
                continue;
            };
            if let Some(ref evidence) = entry.update.evidence {
                evidence.validate(self.max_evidence_size)?;
            }
            known.push((step_execution_id, entry.update));
        }

        let txn = self.pool.begin().await?;
        let mut stored = Vec::new();

        let outcome = async {
            let mut updated = Vec::with_capacity(known.len());
            for (step_execution_id, update) in &known {
                updated.push(
                    self.apply_by_id(&txn, *step_execution_id, update, ctx, &mut stored)
                        .await?,
                );
            }
            Ok::<_, AppError>(updated)
        }
        .await;
        let updated = self.finish(txn, outcome, &stored).await?;

        info!(
            execution_id = %execution_id,
            actor_id = %ctx.actor_id,
            submitted,
            applied = updated.len(),
            evidence = stored.len(),
            "Bulk updated step executions"
        );

        emit(
            self.activity.as_ref(),
            ActivityEvent {
                actor_id: ctx.actor_id,
                project_id: self.project_of_execution(execution_id).await,
                entity: ActivityEntity::TestExecution,
                entity_id: execution_id,
                action: ActivityAction::Update,
                description: format!("Updated {} step results", updated.len()),
                at: ctx.at,
            },
        )
        .await;

        Ok(updated)
    }

    /// Rollup of the step statuses of an execution.
    pub async fn execution_summary(
        &self,
        execution_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<ExecutionSummary> {
        let steps: Vec<StepExecution> = self
            .load_step_executions(execution_id, now)
            .await?
            .into_iter()
            .map(|pair| pair.execution)
            .collect();
        Ok(summarize_execution(&steps))
    }

    /// Evidence attached to a step execution, oldest first.
    pub async fn list_evidence(&self, step_execution_id: Uuid) -> AppResult<Vec<Evidence>> {
        let store = self.pool.store();
        store.require_step_execution(step_execution_id).await?;

        Ok(store
            .list_evidence_for_step_execution(step_execution_id)
            .await?
            .into_iter()
            .map(Evidence::from)
            .collect())
    }

    /// Find or create the step execution of every current step.
    async fn materialize(
        &self,
        execution_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<(TestCaseStep, test_step_execution::Model)>> {
        let store = self.pool.store();
        let execution = store.require_execution(execution_id).await?;
        let steps = self.catalog.get_steps(execution.test_case_id).await?;

        let mut pairs = Vec::with_capacity(steps.len());
        for step in steps {
            let model = store
                .materialize_step_execution(execution_id, &step, now)
                .await?;
            pairs.push((step, model));
        }
        pairs.sort_by_key(|(step, _)| step.step_number);
        Ok(pairs)
    }

    /// Update one step execution inside the transaction. Handles of evidence
    /// files stored on the way are pushed to `stored`.
    async fn apply_by_id(
        &self,
        txn: &DatabaseTransaction,
        step_execution_id: Uuid,
        update: &StepUpdate,
        ctx: &ActorContext,
        stored: &mut Vec<String>,
    ) -> AppResult<StepExecution> {
        let store = ExecutionStore::new(txn);
        let existing = store.require_step_execution(step_execution_id).await?;
        let updated = store.apply_step_update(existing, update, ctx).await?;

        if let Some(ref upload) = update.evidence {
            let handle = self.store_evidence(step_execution_id, upload).await?;
            stored.push(handle.clone());
            store
                .insert_evidence(
                    StoredEvidence {
                        step_execution_id,
                        file_name: upload.file_name.trim().to_string(),
                        file_handle: handle,
                        content_type: content_type_of(upload),
                        size_bytes: upload.data.len() as i64,
                        checksum: checksum(&upload.data),
                        description: upload.description.clone(),
                    },
                    ctx,
                )
                .await?;
        }

        StepExecution::try_from(updated)
    }

    async fn store_evidence(
        &self,
        step_execution_id: Uuid,
        upload: &EvidenceUpload,
    ) -> AppResult<String> {
        let metadata = EvidenceMetadata {
            step_execution_id,
            file_name: upload.file_name.trim().to_string(),
            content_type: content_type_of(upload),
            size_bytes: upload.data.len() as i64,
        };
        self.evidence.store(upload.data.clone(), &metadata).await
    }

    /// Commit on success. On failure the transaction is rolled back and any
    /// evidence files stored for it are released.
    async fn finish<T>(
        &self,
        txn: DatabaseTransaction,
        outcome: AppResult<T>,
        stored: &[String],
    ) -> AppResult<T> {
        let result = match outcome {
            Ok(value) => db::commit(txn).await.map(|()| value),
            Err(e) => {
                db::rollback(txn).await;
                Err(e)
            }
        };

        if result.is_err() {
            self.release(stored).await;
        }
        result
    }

    async fn release(&self, handles: &[String]) {
        for handle in handles {
            if let Err(e) = self.evidence.remove(handle).await {
                warn!(handle = %handle, "Failed to release evidence file after rollback: {}", e);
            }
        }
    }

    async fn project_of_execution(&self, execution_id: Uuid) -> Option<Uuid> {
        let store = self.pool.store();
        let execution = store.get_execution(execution_id).await.ok().flatten()?;
        let run = store.get_run(execution.test_run_id).await.ok().flatten()?;
        Some(run.project_id)
    }
}

fn content_type_of(upload: &EvidenceUpload) -> String {
    upload
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| content_type_for_file_name(&upload.file_name).to_string())
}
