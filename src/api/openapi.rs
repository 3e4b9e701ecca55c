//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Test Execution Server",
        version = "0.1.0",
        description = "Manual test run execution tracking: runs, per-case executions, step results, evidence and status rollups"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Test run endpoints
        api::test_runs::create_run,
        api::test_runs::list_runs,
        api::test_runs::get_run,
        api::test_runs::update_run,
        api::test_runs::delete_run,
        api::test_runs::get_run_summary,
        api::test_runs::list_run_executions,
        api::test_runs::set_ai_insights,
        // Execution endpoints
        api::test_executions::get_execution,
        api::test_executions::list_steps,
        api::test_executions::set_result,
        api::test_executions::bulk_update_steps,
        api::test_executions::get_execution_summary,
        // Step execution endpoints
        api::test_executions::update_step,
        api::test_executions::list_evidence,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            models::RunStatus,
            models::ExecutionStatus,
            models::ExecutionSummary,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Runs
            models::TestRun,
            models::RunMetadata,
            models::CreateRunRequest,
            models::AiInsightsRequest,
            models::RunWithSummary,
            models::RunListResponse,
            // Executions
            models::TestExecution,
            models::OverallResult,
            models::ExecutionListResponse,
            models::ExecutionSummaryResponse,
            // Steps
            models::TestCaseStep,
            models::StepExecution,
            models::StepWithExecution,
            models::StepExecutionListResponse,
            models::StepUpdate,
            models::StepUpdateEntry,
            models::BulkStepUpdate,
            // Evidence
            models::Evidence,
            models::EvidenceUpload,
            models::EvidenceListResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Test Runs", description = "Run creation, metadata, rollups and deletion"),
        (name = "Test Executions", description = "Per-case executions and bulk step results"),
        (name = "Step Executions", description = "Single step results and evidence")
    )
)]
pub struct ApiDoc;
