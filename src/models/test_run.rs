//! Test run domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ExecutionSummary, RunStatus};
use crate::entity::test_run;
use crate::error::{AppError, AppResult};

/// A named bundle of test cases scheduled for execution together.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TestRun {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Opaque AI-generated analysis text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_insights: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<test_run::Model> for TestRun {
    type Error = AppError;

    fn try_from(model: test_run::Model) -> AppResult<Self> {
        Ok(TestRun {
            status: RunStatus::from_db(&model.status)?,
            id: model.id,
            project_id: model.project_id,
            name: model.name,
            description: model.description,
            environment: model.environment,
            start_date: model.start_date,
            end_date: model.end_date,
            notes: model.notes,
            ai_insights: model.ai_insights,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Actor-editable run fields. Shared by creation and metadata updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RunMetadata {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RunMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Trim text fields, turning blank optional values into `None`.
    pub fn normalized(mut self) -> AppResult<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(AppError::Validation("Test run name is required".to_string()));
        }
        self.description = non_blank(self.description);
        self.environment = non_blank(self.environment);
        self.notes = non_blank(self.notes);
        Ok(self)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Request to create a run over a selection of test cases.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateRunRequest {
    #[serde(flatten)]
    pub metadata: RunMetadata,
    /// Test cases to execute; must be non-empty and visible in the project.
    pub test_case_ids: Vec<Uuid>,
}

/// Request to store AI insight text on a run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AiInsightsRequest {
    pub insights: String,
}

/// Query parameters for listing runs of a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ListRunsParams {
    #[serde(default)]
    pub status: Option<RunStatus>,
    /// Case-sensitive substring match on name or description.
    #[serde(default)]
    pub search: Option<String>,
}

/// Run together with its execution rollup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RunWithSummary {
    #[serde(flatten)]
    pub run: TestRun,
    pub summary: ExecutionSummary,
    pub completion_percentage: u8,
}

/// Response for run listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RunListResponse {
    pub runs: Vec<RunWithSummary>,
}
