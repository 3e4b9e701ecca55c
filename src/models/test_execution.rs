//! Test execution domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ExecutionStatus, ExecutionSummary};
use crate::entity::test_execution;
use crate::error::{AppError, AppResult};

/// The record of one test case being run within one test run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TestExecution {
    pub id: Uuid,
    pub test_run_id: Uuid,
    pub test_case_id: Uuid,
    /// Actor-set overall result. Not recomputed from step statuses.
    pub status: ExecutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<DateTime<Utc>>,
}

impl TryFrom<test_execution::Model> for TestExecution {
    type Error = AppError;

    fn try_from(model: test_execution::Model) -> AppResult<Self> {
        Ok(TestExecution {
            status: ExecutionStatus::from_db(&model.status)?,
            id: model.id,
            test_run_id: model.test_run_id,
            test_case_id: model.test_case_id,
            actual_result: model.actual_result,
            notes: model.notes,
            executed_by: model.executed_by,
            executed_at: model.executed_at,
        })
    }
}

/// Overall result recorded directly on an execution.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OverallResult {
    pub status: ExecutionStatus,
    #[serde(default)]
    pub notes: Option<String>,
    /// When absent the stored actual result is kept.
    #[serde(default)]
    pub actual_result: Option<String>,
}

impl OverallResult {
    pub fn new(status: ExecutionStatus) -> Self {
        Self {
            status,
            notes: None,
            actual_result: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Response for execution listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExecutionListResponse {
    pub executions: Vec<TestExecution>,
}

/// Step rollup of one execution.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExecutionSummaryResponse {
    pub execution_id: Uuid,
    pub summary: ExecutionSummary,
    pub completion_percentage: u8,
}
