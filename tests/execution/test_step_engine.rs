//! Lazy step materialization, single and bulk step updates, evidence.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use test_execution_lib::error::AppError;
use test_execution_lib::models::{
    BulkStepUpdate, EvidenceUpload, ExecutionStatus, ExecutionSummary, NewTestCaseStep,
    StepUpdate,
};
use test_execution_lib::services::evidence_store::checksum;

use super::test_helpers::*;

#[tokio::test]
async fn test_load_materializes_one_not_run_record_per_step() {
    let (env, _) = TestEnv::new().await;
    let case = env.case("Three steps", 3).await;
    let run_id = env.run("Load", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;

    let steps = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();

    assert_eq!(steps.len(), 3);
    let numbers: Vec<i32> = steps.iter().map(|s| s.step.step_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    for pair in &steps {
        assert_eq!(pair.execution.status, ExecutionStatus::NotRun);
        assert_eq!(pair.execution.test_execution_id, execution_id);
        assert_eq!(pair.execution.test_case_step_id, pair.step.id);
        assert_eq!(pair.execution.step_number, pair.step.step_number);
        assert!(pair.evidence.is_empty());
    }
}

#[tokio::test]
async fn test_load_is_idempotent() {
    let (env, _) = TestEnv::new().await;
    let case = env.case("Twice", 2).await;
    let run_id = env.run("Idempotent", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;

    let first: Vec<Uuid> = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap()
        .iter()
        .map(|s| s.execution.id)
        .collect();
    let second: Vec<Uuid> = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap()
        .iter()
        .map(|s| s.execution.id)
        .collect();

    assert_eq!(first, second);
    let stored = env
        .pool
        .store()
        .list_step_executions_for_execution(execution_id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn test_concurrent_loads_create_no_duplicates() {
    let (env, _) = TestEnv::new().await;
    let case = env.case("Raced", 4).await;
    let run_id = env.run("Concurrent", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;

    let mut handles = Vec::new();
    for _ in 0..6 {
        let steps = env.core.steps.clone();
        handles.push(tokio::spawn(async move {
            steps
                .load_step_executions(execution_id, fixed_time())
                .await
                .map(|pairs| pairs.into_iter().map(|p| p.execution.id).collect::<Vec<_>>())
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }
    for ids in &results {
        assert_eq!(ids, &results[0]);
    }

    let stored = env
        .pool
        .store()
        .list_step_executions_for_execution(execution_id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 4);
}

#[tokio::test]
async fn test_steps_added_later_are_materialized_and_old_records_kept() {
    let (env, _) = TestEnv::new().await;
    let case = env.case("Evolving", 2).await;
    let run_id = env.run("Edits", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;

    let before = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();
    env.core
        .steps
        .update_step(
            before[0].execution.id,
            StepUpdate::new(ExecutionStatus::Passed),
            &env.ctx(),
        )
        .await
        .unwrap();

    // Step 2 is removed, a third step appended
    env.catalog.remove_step(before[1].step.id).await.unwrap();
    let added = env
        .catalog
        .add_step(case, &NewTestCaseStep::new("Step 3", "Result 3"), fixed_time())
        .await
        .unwrap();
    assert_eq!(added.step_number, 3);

    let after = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();
    let numbers: Vec<i32> = after.iter().map(|s| s.step.step_number).collect();
    assert_eq!(numbers, vec![1, 3]);
    assert_eq!(after[0].execution.id, before[0].execution.id);
    assert_eq!(after[0].execution.status, ExecutionStatus::Passed);
    assert_eq!(after[1].execution.status, ExecutionStatus::NotRun);

    // The record of the removed step is kept, not renumbered
    let stored = env
        .pool
        .store()
        .list_step_executions_for_execution(execution_id)
        .await
        .unwrap();
    let stored_numbers: Vec<i32> = stored.iter().map(|s| s.step_number).collect();
    assert_eq!(stored_numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_removed_step_numbers_are_never_reissued() {
    let (env, _) = TestEnv::new().await;
    let case = env.case("Renumbered", 2).await;
    let run_id = env.run("Renumbered run", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;

    let steps = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();

    // The last step goes away and two new ones follow it
    env.catalog.remove_step(steps[1].step.id).await.unwrap();
    let third = env
        .catalog
        .add_step(case, &NewTestCaseStep::new("Step 3", "Result 3"), fixed_time())
        .await
        .unwrap();
    env.catalog.remove_step(third.id).await.unwrap();
    let fourth = env
        .catalog
        .add_step(case, &NewTestCaseStep::new("Step 4", "Result 4"), fixed_time())
        .await
        .unwrap();
    assert_eq!(third.step_number, 3);
    assert_eq!(fourth.step_number, 4);

    let after = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();
    let numbers: Vec<i32> = after.iter().map(|s| s.step.step_number).collect();
    assert_eq!(numbers, vec![1, 4]);

    let stored = env
        .pool
        .store()
        .list_step_executions_for_execution(execution_id)
        .await
        .unwrap();
    let pairs: HashSet<(i32, Uuid)> = stored
        .iter()
        .map(|s| (s.step_number, s.test_case_step_id))
        .collect();
    assert_eq!(pairs.len(), stored.len());
    let stored_numbers: HashSet<i32> = stored.iter().map(|s| s.step_number).collect();
    assert_eq!(stored_numbers.len(), stored.len());

    let missing = env
        .catalog
        .add_step(Uuid::now_v7(), &NewTestCaseStep::new("x", "y"), fixed_time())
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_update_step_with_evidence_round_trips() {
    let (env, _) = TestEnv::new().await;
    let case = env.case("Evidence", 2).await;
    let run_id = env.run("Evidence run", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;
    let steps = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();
    let target = steps[1].execution.id;

    let png = b"\x89PNG fake image".to_vec();
    let updated = env
        .core
        .steps
        .update_step(
            target,
            StepUpdate::new(ExecutionStatus::Failed)
                .with_actual_result("button missing")
                .with_notes("seen on Firefox")
                .with_evidence(
                    EvidenceUpload::new("checkout.png", png.clone())
                        .with_description("Checkout page without button"),
                ),
            &env.ctx(),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, ExecutionStatus::Failed);
    assert_eq!(updated.executed_by, Some(env.actor_id));
    assert_eq!(updated.executed_at, Some(fixed_time()));

    let reloaded = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();
    let step = &reloaded[1];
    assert_eq!(step.execution.id, target);
    assert_eq!(step.execution.status, ExecutionStatus::Failed);
    assert_eq!(step.execution.actual_result.as_deref(), Some("button missing"));
    assert_eq!(step.execution.notes.as_deref(), Some("seen on Firefox"));
    assert_eq!(step.evidence.len(), 1);

    let evidence = &step.evidence[0];
    assert_eq!(
        evidence.description.as_deref(),
        Some("Checkout page without button")
    );
    assert_eq!(evidence.file_name, "checkout.png");
    assert_eq!(evidence.content_type, "image/png");
    assert_eq!(evidence.size_bytes, png.len() as i64);
    assert_eq!(evidence.checksum, checksum(&png));
    assert_eq!(evidence.uploaded_by, env.actor_id);
    let on_disk = tokio::fs::read(env.dir.path().join("evidence").join(&evidence.file_handle))
        .await
        .unwrap();
    assert_eq!(on_disk, png);

    // Other steps are untouched
    assert_eq!(reloaded[0].execution.status, ExecutionStatus::NotRun);
    assert!(reloaded[0].evidence.is_empty());
}

#[tokio::test]
async fn test_evidence_is_append_only() {
    let (env, _) = TestEnv::new().await;
    let case = env.case("Append", 1).await;
    let run_id = env.run("Append run", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;
    let steps = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();
    let target = steps[0].execution.id;

    for (name, status) in [
        ("first.log", ExecutionStatus::Failed),
        ("second.log", ExecutionStatus::Passed),
    ] {
        env.core
            .steps
            .update_step(
                target,
                StepUpdate::new(status).with_evidence(EvidenceUpload::new(name, b"log".to_vec())),
                &env.ctx(),
            )
            .await
            .unwrap();
    }
    // An update without evidence keeps the existing records
    env.core
        .steps
        .update_step(target, StepUpdate::new(ExecutionStatus::Passed), &env.ctx())
        .await
        .unwrap();

    let evidence = env.core.steps.list_evidence(target).await.unwrap();
    let names: Vec<&str> = evidence.iter().map(|e| e.file_name.as_str()).collect();
    assert_eq!(names, vec!["first.log", "second.log"]);
    assert!(evidence.iter().all(|e| e.content_type == "text/plain"));
}

#[tokio::test]
async fn test_update_step_errors() {
    let (env, _) = TestEnv::new().await;
    let case = env.case("Errors", 1).await;
    let run_id = env.run("Errors run", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;
    let steps = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();

    let unknown = env
        .core
        .steps
        .update_step(Uuid::now_v7(), StepUpdate::new(ExecutionStatus::Passed), &env.ctx())
        .await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    let oversized = env
        .core
        .steps
        .update_step(
            steps[0].execution.id,
            StepUpdate::new(ExecutionStatus::Passed)
                .with_evidence(EvidenceUpload::new("huge.bin", vec![0u8; MAX_EVIDENCE_SIZE + 1])),
            &env.ctx(),
        )
        .await;
    assert!(matches!(oversized, Err(AppError::Validation(_))));

    let still = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();
    assert_eq!(still[0].execution.status, ExecutionStatus::NotRun);

    let missing_execution = env
        .core
        .steps
        .load_step_executions(Uuid::now_v7(), fixed_time())
        .await;
    assert!(matches!(missing_execution, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_bulk_update_applies_known_steps_and_ignores_unknown() {
    let (env, _) = TestEnv::new().await;
    let case = env.case("Bulk", 3).await;
    let run_id = env.run("Bulk run", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;

    let updated = env
        .core
        .steps
        .bulk_update_steps(
            execution_id,
            BulkStepUpdate::new()
                .step(3, StepUpdate::new(ExecutionStatus::Blocked).with_notes("no data"))
                .step(42, StepUpdate::new(ExecutionStatus::Failed))
                .step(1, StepUpdate::new(ExecutionStatus::Passed))
                .step(
                    2,
                    StepUpdate::new(ExecutionStatus::Failed).with_evidence(EvidenceUpload::new(
                        "trace.har",
                        b"{}".to_vec(),
                    )),
                ),
            &env.ctx(),
        )
        .await
        .unwrap();

    let numbers: Vec<i32> = updated.iter().map(|s| s.step_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    let steps = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();
    let statuses: Vec<ExecutionStatus> = steps.iter().map(|s| s.execution.status).collect();
    assert_eq!(
        statuses,
        vec![
            ExecutionStatus::Passed,
            ExecutionStatus::Failed,
            ExecutionStatus::Blocked
        ]
    );
    assert_eq!(steps[1].evidence.len(), 1);
    assert_eq!(steps[1].evidence[0].content_type, "application/json");
    assert_eq!(steps[2].execution.notes.as_deref(), Some("no data"));

    let summary = env
        .core
        .steps
        .execution_summary(execution_id, fixed_time())
        .await
        .unwrap();
    assert_eq!(
        summary,
        ExecutionSummary {
            total: 3,
            passed: 1,
            failed: 1,
            blocked: 1,
            ..Default::default()
        }
    );

    // Step rollups never change the execution's own status
    let execution = env.core.runs.get_execution(execution_id).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::NotRun);
}

#[tokio::test]
async fn test_bulk_update_skips_invalid_evidence_on_unknown_steps() {
    let (env, _) = TestEnv::new().await;
    let case = env.case("Stale form", 2).await;
    let run_id = env.run("Stale run", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;

    let updated = env
        .core
        .steps
        .bulk_update_steps(
            execution_id,
            BulkStepUpdate::new()
                .step(1, StepUpdate::new(ExecutionStatus::Passed))
                .step(
                    42,
                    StepUpdate::new(ExecutionStatus::Failed)
                        .with_evidence(EvidenceUpload::new("empty.png", Vec::new())),
                )
                .step(
                    43,
                    StepUpdate::new(ExecutionStatus::Failed).with_evidence(EvidenceUpload::new(
                        "huge.log",
                        vec![0u8; MAX_EVIDENCE_SIZE + 1],
                    )),
                ),
            &env.ctx(),
        )
        .await
        .unwrap();

    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].step_number, 1);
    assert_eq!(updated[0].status, ExecutionStatus::Passed);

    // Invalid evidence on a known step still rejects the batch
    let err = env
        .core
        .steps
        .bulk_update_steps(
            execution_id,
            BulkStepUpdate::new()
                .step(1, StepUpdate::new(ExecutionStatus::Failed))
                .step(
                    2,
                    StepUpdate::new(ExecutionStatus::Failed)
                        .with_evidence(EvidenceUpload::new("empty.png", Vec::new())),
                ),
            &env.ctx(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let steps = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();
    assert_eq!(steps[0].execution.status, ExecutionStatus::Passed);
    assert_eq!(steps[1].execution.status, ExecutionStatus::NotRun);
}

#[tokio::test]
async fn test_bulk_update_rejects_duplicate_step_numbers() {
    let (env, _) = TestEnv::new().await;
    let case = env.case("Dupes", 2).await;
    let run_id = env.run("Dupes run", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;

    let result = env
        .core
        .steps
        .bulk_update_steps(
            execution_id,
            BulkStepUpdate::new()
                .step(1, StepUpdate::new(ExecutionStatus::Passed))
                .step(1, StepUpdate::new(ExecutionStatus::Failed)),
            &env.ctx(),
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_bulk_update_is_all_or_nothing_when_evidence_fails() {
    let dir = tempfile::tempdir().unwrap();
    let evidence = Arc::new(FlakyEvidenceStore::new(dir.path(), "broken.png").await);
    let env = TestEnv::with(
        evidence.clone(),
        Arc::new(RecordingActivityLog::default()),
    )
    .await;
    let case = env.case("Atomic", 3).await;
    let run_id = env.run("Atomic run", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;

    let result = env
        .core
        .steps
        .bulk_update_steps(
            execution_id,
            BulkStepUpdate::new()
                .step(
                    1,
                    StepUpdate::new(ExecutionStatus::Passed)
                        .with_evidence(EvidenceUpload::new("ok.png", b"fine".to_vec())),
                )
                .step(2, StepUpdate::new(ExecutionStatus::Failed))
                .step(
                    3,
                    StepUpdate::new(ExecutionStatus::Failed)
                        .with_evidence(EvidenceUpload::new("broken.png", b"nope".to_vec())),
                ),
            &env.ctx(),
        )
        .await;
    assert!(matches!(result, Err(AppError::Storage(_))));

    let steps = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();
    assert!(
        steps
            .iter()
            .all(|s| s.execution.status == ExecutionStatus::NotRun && s.evidence.is_empty()),
        "no status change or evidence may persist"
    );

    // The blob stored for step 1 before the failure is released
    let stored = evidence.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(evidence.removed(), stored);
    assert!(!dir.path().join(&stored[0]).exists());
}

#[tokio::test]
async fn test_single_update_rolls_back_when_evidence_fails() {
    let dir = tempfile::tempdir().unwrap();
    let evidence = Arc::new(FlakyEvidenceStore::new(dir.path(), "broken.png").await);
    let env = TestEnv::with(evidence, Arc::new(RecordingActivityLog::default())).await;
    let case = env.case("Single", 1).await;
    let run_id = env.run("Single run", &[case]).await;
    let execution_id = env.execution_for(run_id, case).await;
    let steps = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap();

    let result = env
        .core
        .steps
        .update_step(
            steps[0].execution.id,
            StepUpdate::new(ExecutionStatus::Failed)
                .with_evidence(EvidenceUpload::new("broken.png", b"nope".to_vec())),
            &env.ctx(),
        )
        .await;
    assert!(matches!(result, Err(AppError::Storage(_))));

    let ids: HashSet<Uuid> = env
        .core
        .steps
        .load_step_executions(execution_id, fixed_time())
        .await
        .unwrap()
        .into_iter()
        .filter(|s| s.execution.status != ExecutionStatus::NotRun)
        .map(|s| s.execution.id)
        .collect();
    assert!(ids.is_empty());
}
