//! Shared helpers for the execution tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use test_execution_lib::config::DatabaseSettings;
use test_execution_lib::db::DbPool;
use test_execution_lib::error::{AppError, AppResult};
use test_execution_lib::models::{
    ActivityEvent, ActorContext, CreateRunRequest, EvidenceMetadata, NewTestCaseStep, RunMetadata,
};
use test_execution_lib::services::{
    ActivityLog, CoreServices, DbCatalog, EvidenceStore, LocalEvidenceStore,
};

/// Evidence size limit used by the tests.
pub const MAX_EVIDENCE_SIZE: usize = 64 * 1024;

/// Activity log that keeps events in memory.
#[derive(Default)]
pub struct RecordingActivityLog {
    events: Mutex<Vec<ActivityEvent>>,
}

impl RecordingActivityLog {
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivityLog for RecordingActivityLog {
    async fn record(&self, event: ActivityEvent) -> AppResult<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Activity log that always fails.
pub struct FailingActivityLog;

#[async_trait]
impl ActivityLog for FailingActivityLog {
    async fn record(&self, _event: ActivityEvent) -> AppResult<()> {
        Err(AppError::Database("activity table is gone".to_string()))
    }
}

/// Local evidence store that refuses files with a given name and remembers
/// which handles were stored and released.
pub struct FlakyEvidenceStore {
    inner: LocalEvidenceStore,
    reject_file_name: String,
    stored: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
}

impl FlakyEvidenceStore {
    pub async fn new(dir: &std::path::Path, reject_file_name: &str) -> Self {
        Self {
            inner: LocalEvidenceStore::new(dir).await.unwrap(),
            reject_file_name: reject_file_name.to_string(),
            stored: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
        }
    }

    pub fn stored(&self) -> Vec<String> {
        self.stored.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvidenceStore for FlakyEvidenceStore {
    async fn store(&self, data: Vec<u8>, metadata: &EvidenceMetadata) -> AppResult<String> {
        if metadata.file_name == self.reject_file_name {
            return Err(AppError::Storage("bucket unavailable".to_string()));
        }
        let handle = self.inner.store(data, metadata).await?;
        self.stored.lock().unwrap().push(handle.clone());
        Ok(handle)
    }

    async fn remove(&self, handle: &str) -> AppResult<()> {
        self.removed.lock().unwrap().push(handle.to_string());
        self.inner.remove(handle).await
    }
}

/// A fresh SQLite database, evidence directory and wired services.
pub struct TestEnv {
    pub dir: TempDir,
    pub pool: DbPool,
    pub catalog: Arc<DbCatalog>,
    pub core: CoreServices,
    pub project_id: Uuid,
    pub actor_id: Uuid,
}

impl TestEnv {
    /// Local evidence store and an in-memory activity log.
    pub async fn new() -> (Self, Arc<RecordingActivityLog>) {
        let activity = Arc::new(RecordingActivityLog::default());
        let env = Self::build(|dir| async move {
            let store: Arc<dyn EvidenceStore> =
                Arc::new(LocalEvidenceStore::new(dir).await.unwrap());
            store
        }, activity.clone())
        .await;
        (env, activity)
    }

    /// Custom collaborators.
    pub async fn with(
        evidence: Arc<dyn EvidenceStore>,
        activity: Arc<dyn ActivityLog>,
    ) -> Self {
        Self::build(move |_| async move { evidence }, activity).await
    }

    async fn build<F, Fut>(make_evidence: F, activity: Arc<dyn ActivityLog>) -> Self
    where
        F: FnOnce(std::path::PathBuf) -> Fut,
        Fut: std::future::Future<Output = Arc<dyn EvidenceStore>>,
    {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("tex.db");
        let pool = DbPool::connect(&DatabaseSettings {
            url: format!("sqlite://{}?mode=rwc", db_path.display()),
            max_connections: 5,
            min_connections: 1,
        })
        .await
        .expect("Failed to open test database");
        pool.run_migrations().await.expect("Failed to run migrations");

        let evidence = make_evidence(dir.path().join("evidence")).await;
        let catalog = Arc::new(DbCatalog::new(pool.clone()));
        let core = CoreServices::new(
            pool.clone(),
            catalog.clone(),
            evidence,
            activity,
            MAX_EVIDENCE_SIZE,
        );

        Self {
            dir,
            pool,
            catalog,
            core,
            project_id: Uuid::now_v7(),
            actor_id: Uuid::now_v7(),
        }
    }

    /// Acting user at a fixed point in time.
    pub fn ctx(&self) -> ActorContext {
        ActorContext::new(self.actor_id, fixed_time())
    }

    /// Create an active case with `steps` numbered steps in this project.
    pub async fn case(&self, title: &str, steps: usize) -> Uuid {
        self.case_in(self.project_id, title, steps).await
    }

    pub async fn case_in(&self, project_id: Uuid, title: &str, steps: usize) -> Uuid {
        let definitions: Vec<NewTestCaseStep> = (1..=steps)
            .map(|n| NewTestCaseStep::new(format!("Step {}", n), format!("Result {}", n)))
            .collect();
        self.catalog
            .create_test_case(project_id, title, &definitions, fixed_time())
            .await
            .unwrap()
            .id
    }

    /// Create a run over the given cases and return the run id.
    pub async fn run(&self, name: &str, cases: &[Uuid]) -> Uuid {
        self.core
            .runs
            .create_run(self.project_id, run_request(name, cases), &self.ctx())
            .await
            .unwrap()
            .id
    }

    /// The execution created for `case_id` in `run_id`.
    pub async fn execution_for(&self, run_id: Uuid, case_id: Uuid) -> Uuid {
        self.core
            .runs
            .list_executions(run_id)
            .await
            .unwrap()
            .into_iter()
            .find(|e| e.test_case_id == case_id)
            .expect("execution for case")
            .id
    }
}

pub fn run_request(name: &str, cases: &[Uuid]) -> CreateRunRequest {
    CreateRunRequest {
        metadata: RunMetadata::named(name),
        test_case_ids: cases.to_vec(),
    }
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap()
}
