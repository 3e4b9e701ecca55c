//! Status enums for runs and executions.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Test run status. Set by an actor, never derived from execution rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
    Aborted,
}

impl RunStatus {
    pub const ALL: [RunStatus; 4] = [
        Self::Planned,
        Self::InProgress,
        Self::Completed,
        Self::Aborted,
    ];

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Parse a value read back from the database.
    pub(crate) fn from_db(s: &str) -> AppResult<Self> {
        Self::parse(s).ok_or_else(|| AppError::Database(format!("Unknown run status '{}'", s)))
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Execution status shared by test executions and step executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    NotRun,
    Passed,
    Failed,
    Blocked,
    Skipped,
}

impl ExecutionStatus {
    pub const ALL: [ExecutionStatus; 5] = [
        Self::NotRun,
        Self::Passed,
        Self::Failed,
        Self::Blocked,
        Self::Skipped,
    ];

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotRun => "not_run",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Blocked => "blocked",
            Self::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Parse a value read back from the database.
    pub(crate) fn from_db(s: &str) -> AppResult<Self> {
        Self::parse(s)
            .ok_or_else(|| AppError::Database(format!("Unknown execution status '{}'", s)))
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
