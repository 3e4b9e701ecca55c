//! Step execution domain models and update requests.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Evidence, EvidenceUpload, ExecutionStatus, TestCaseStep};
use crate::entity::test_step_execution;
use crate::error::{AppError, AppResult};

/// The record of one step being performed within one test execution.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StepExecution {
    pub id: Uuid,
    pub test_execution_id: Uuid,
    pub test_case_step_id: Uuid,
    /// Copied from the step when this record was created.
    pub step_number: i32,
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

impl TryFrom<test_step_execution::Model> for StepExecution {
    type Error = AppError;

    fn try_from(model: test_step_execution::Model) -> AppResult<Self> {
        Ok(StepExecution {
            status: ExecutionStatus::from_db(&model.status)?,
            id: model.id,
            test_execution_id: model.test_execution_id,
            test_case_step_id: model.test_case_step_id,
            step_number: model.step_number,
            actual_result: model.actual_result,
            notes: model.notes,
            executed_by: model.executed_by,
            executed_at: model.executed_at,
        })
    }
}

/// A current catalog step paired with its execution record and evidence.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StepWithExecution {
    pub step: TestCaseStep,
    pub execution: StepExecution,
    pub evidence: Vec<Evidence>,
}

/// Response for the step execution view of one test execution.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StepExecutionListResponse {
    pub steps: Vec<StepWithExecution>,
}

/// Result recorded for a single step.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StepUpdate {
    pub status: ExecutionStatus,
    #[serde(default)]
    pub actual_result: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub evidence: Option<EvidenceUpload>,
}

impl StepUpdate {
    pub fn new(status: ExecutionStatus) -> Self {
        Self {
            status,
            actual_result: None,
            notes: None,
            evidence: None,
        }
    }

    pub fn with_actual_result(mut self, actual_result: impl Into<String>) -> Self {
        self.actual_result = Some(actual_result.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_evidence(mut self, evidence: EvidenceUpload) -> Self {
        self.evidence = Some(evidence);
        self
    }
}

/// One entry of a bulk submission, keyed by step number.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StepUpdateEntry {
    pub step_number: i32,
    #[serde(flatten)]
    pub update: StepUpdate,
}

/// All step results for one execution, submitted together.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BulkStepUpdate {
    pub steps: Vec<StepUpdateEntry>,
}

impl BulkStepUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step_number: i32, update: StepUpdate) -> Self {
        self.steps.push(StepUpdateEntry {
            step_number,
            update,
        });
        self
    }

    /// Reject repeated step numbers and return the entries ordered by
    /// ascending step number. Evidence is checked once entries are matched
    /// to steps.
    pub fn into_ordered(self) -> AppResult<Vec<StepUpdateEntry>> {
        let mut seen = HashSet::new();
        for entry in &self.steps {
            if !seen.insert(entry.step_number) {
                return Err(AppError::Validation(format!(
                    "Step {} appears more than once",
                    entry.step_number
                )));
            }
        }

        let mut entries = self.steps;
        entries.sort_by_key(|entry| entry.step_number);
        Ok(entries)
    }
}
