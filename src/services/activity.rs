//! Activity log side channel.

use async_trait::async_trait;
use tracing::warn;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::ActivityEvent;

/// Receives one event per mutating operation.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(&self, event: ActivityEvent) -> AppResult<()>;
}

/// Activity log written to the `activity_log` table.
#[derive(Clone)]
pub struct DbActivityLog {
    pool: DbPool,
}

impl DbActivityLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLog for DbActivityLog {
    async fn record(&self, event: ActivityEvent) -> AppResult<()> {
        self.pool.store().insert_activity(&event).await?;
        Ok(())
    }
}

/// Record an event, logging and discarding any failure.
pub async fn emit(log: &dyn ActivityLog, event: ActivityEvent) {
    let entity = event.entity.as_str();
    let entity_id = event.entity_id;
    if let Err(e) = log.record(event).await {
        warn!(
            entity_type = entity,
            entity_id = %entity_id,
            "Failed to record activity: {}",
            e
        );
    }
}
