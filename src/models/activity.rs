//! Activity log events emitted by mutating operations.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Kind of entity an activity refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityEntity {
    TestRun,
    TestExecution,
    TestStepExecution,
}

impl ActivityEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TestRun => "test_run",
            Self::TestExecution => "test_execution",
            Self::TestStepExecution => "test_step_execution",
        }
    }
}

/// What happened to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAction {
    Create,
    Update,
    Delete,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// One entry for the activity log side channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEvent {
    pub actor_id: Uuid,
    pub project_id: Option<Uuid>,
    pub entity: ActivityEntity,
    pub entity_id: Uuid,
    pub action: ActivityAction,
    pub description: String,
    pub at: DateTime<Utc>,
}
