//! Business logic services.

pub mod activity;
pub mod aggregator;
pub mod catalog;
pub mod evidence_store;
pub mod run_lifecycle;
pub mod step_engine;
pub mod storage;

use std::sync::Arc;

use tracing::info;

pub use activity::{ActivityLog, DbActivityLog};
pub use catalog::{DbCatalog, TestCaseCatalog};
pub use evidence_store::{EvidenceStore, LocalEvidenceStore};
pub use run_lifecycle::RunLifecycleManager;
pub use step_engine::StepExecutionEngine;
pub use storage::Storage;

use crate::config::{Config, EvidenceBackend};
use crate::db::DbPool;
use crate::error::AppResult;

/// The execution core wired to its collaborators.
#[derive(Clone)]
pub struct CoreServices {
    pub runs: RunLifecycleManager,
    pub steps: StepExecutionEngine,
}

impl CoreServices {
    pub fn new(
        pool: DbPool,
        catalog: Arc<dyn TestCaseCatalog>,
        evidence: Arc<dyn EvidenceStore>,
        activity: Arc<dyn ActivityLog>,
        max_evidence_size: usize,
    ) -> Self {
        Self {
            runs: RunLifecycleManager::new(
                pool.clone(),
                catalog.clone(),
                evidence.clone(),
                activity.clone(),
            ),
            steps: StepExecutionEngine::new(pool, catalog, evidence, activity, max_evidence_size),
        }
    }

    /// Wire the database-backed catalog and activity log with the configured
    /// evidence backend.
    pub async fn from_config(pool: DbPool, config: &Config) -> AppResult<Self> {
        let evidence: Arc<dyn EvidenceStore> = match &config.evidence {
            EvidenceBackend::Local { dir } => Arc::new(LocalEvidenceStore::new(dir).await?),
            EvidenceBackend::S3(settings) => Arc::new(Storage::new(settings).await?),
        };
        info!("Evidence backend: {}", config.evidence.name());

        Ok(Self::new(
            pool.clone(),
            Arc::new(DbCatalog::new(pool.clone())),
            evidence,
            Arc::new(DbActivityLog::new(pool)),
            config.max_evidence_size,
        ))
    }
}
