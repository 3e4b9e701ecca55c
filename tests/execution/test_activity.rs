//! Activity log side channel.

use std::sync::Arc;

use test_execution_lib::models::{
    ActivityAction, ActivityEntity, BulkStepUpdate, ExecutionStatus, OverallResult, StepUpdate,
};
use test_execution_lib::services::{DbActivityLog, LocalEvidenceStore};

use super::test_helpers::*;

#[tokio::test]
async fn test_each_mutation_emits_one_event() {
    let (env, activity) = TestEnv::new().await;
    let case = env.case("Audited", 2).await;
    let run_id = env.run("Events", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;

    let steps = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();
    env.core
        .steps
        .update_step(
            steps[0].execution.id,
            StepUpdate::new(ExecutionStatus::Passed),
            &env.ctx(),
        )
        .await
        .unwrap();
    env.core
        .steps
        .bulk_update_steps(
            execution_id,
            BulkStepUpdate::new().step(2, StepUpdate::new(ExecutionStatus::Failed)),
            &env.ctx(),
        )
        .await
        .unwrap();
    env.core
        .runs
        .set_overall_result(execution_id, OverallResult::new(ExecutionStatus::Failed), &env.ctx())
        .await
        .unwrap();
    env.core.runs.delete_run(run_id, &env.ctx()).await.unwrap();

    let events = activity.events();
    let kinds: Vec<(ActivityEntity, ActivityAction)> =
        events.iter().map(|e| (e.entity, e.action)).collect();
    assert_eq!(
        kinds,
        vec![
            (ActivityEntity::TestRun, ActivityAction::Create),
            (ActivityEntity::TestStepExecution, ActivityAction::Update),
            (ActivityEntity::TestExecution, ActivityAction::Update),
            (ActivityEntity::TestExecution, ActivityAction::Update),
            (ActivityEntity::TestRun, ActivityAction::Delete),
        ]
    );
    assert!(events.iter().all(|e| e.actor_id == env.actor_id));
    assert!(events.iter().all(|e| e.project_id == Some(env.project_id)));
    assert!(events.iter().all(|e| e.at == fixed_time()));
}

#[tokio::test]
async fn test_logging_failure_does_not_fail_operations() {
    let dir = tempfile::tempdir().unwrap();
    let evidence = Arc::new(LocalEvidenceStore::new(dir.path()).await.unwrap());
    let env = TestEnv::with(evidence, Arc::new(FailingActivityLog)).await;
    let case = env.case("Unlogged", 1).await;

    let run_id = env.run("Still works", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;

    let updated = env
        .core
        .runs
        .set_overall_result(execution_id, OverallResult::new(ExecutionStatus::Skipped), &env.ctx())
        .await
        .unwrap();
    assert_eq!(updated.status, ExecutionStatus::Skipped);

    env.core.runs.delete_run(run_id, &env.ctx()).await.unwrap();
}

#[tokio::test]
async fn test_db_activity_log_writes_rows() {
    let (seed, _) = TestEnv::new().await;
    let evidence = Arc::new(LocalEvidenceStore::new(seed.dir.path().join("ev")).await.unwrap());
    let core = test_execution_lib::services::CoreServices::new(
        seed.pool.clone(),
        seed.catalog.clone(),
        evidence,
        Arc::new(DbActivityLog::new(seed.pool.clone())),
        MAX_EVIDENCE_SIZE,
    );
    let case = seed.case("Logged", 1).await;
    let run = core
        .runs
        .create_run(seed.project_id, run_request("Audited", &[case]), &seed.ctx())
        .await
        .unwrap();

    let rows = seed
        .pool
        .store()
        .list_activity_for_entity(ActivityEntity::TestRun, run.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].action, "create");
    assert_eq!(rows[0].entity_type, "test_run");
    assert_eq!(rows[0].actor_id, seed.actor_id);
    assert_eq!(rows[0].project_id, Some(seed.project_id));
    assert_eq!(rows[0].created_at, fixed_time());
}
