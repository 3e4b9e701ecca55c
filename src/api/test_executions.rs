//! Test execution and step execution API handlers.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use super::actor::Actor;
use crate::error::{AppResult, ErrorResponse};
use crate::models::{
    BulkStepUpdate, EvidenceListResponse, ExecutionSummaryResponse, OverallResult, StepExecution,
    StepExecutionListResponse, StepUpdate, TestExecution,
};
use crate::services::CoreServices;
use crate::services::aggregator::completion_percentage;

/// Get a test execution.
#[utoipa::path(
    get,
    path = "/api/v1/executions/{execution_id}",
    tag = "Test Executions",
    params(("execution_id" = Uuid, Path, description = "Test execution UUID")),
    responses(
        (status = 200, description = "Test execution", body = TestExecution),
        (status = 404, description = "Test execution not found", body = ErrorResponse),
    )
)]
pub async fn get_execution(
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let execution = core.runs.get_execution(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(execution))
}

/// Steps of an execution with their step executions and evidence.
///
/// Step executions missing for current steps are created as `not_run`.
#[utoipa::path(
    get,
    path = "/api/v1/executions/{execution_id}/steps",
    tag = "Test Executions",
    params(("execution_id" = Uuid, Path, description = "Test execution UUID")),
    responses(
        (status = 200, description = "Step executions in step order", body = StepExecutionListResponse),
        (status = 404, description = "Test execution not found", body = ErrorResponse),
    )
)]
pub async fn list_steps(
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let steps = core
        .steps
        .load_step_executions(path.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(StepExecutionListResponse { steps }))
}

/// Record the overall result of an execution.
#[utoipa::path(
    put,
    path = "/api/v1/executions/{execution_id}/result",
    tag = "Test Executions",
    params(
        ("execution_id" = Uuid, Path, description = "Test execution UUID"),
        ("X-Actor-Id" = Uuid, Header, description = "Acting user")
    ),
    request_body = OverallResult,
    responses(
        (status = 200, description = "Result recorded", body = TestExecution),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Test execution not found", body = ErrorResponse),
    )
)]
pub async fn set_result(
    actor: Actor,
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
    body: web::Json<OverallResult>,
) -> AppResult<HttpResponse> {
    let execution = core
        .runs
        .set_overall_result(path.into_inner(), body.into_inner(), actor.context())
        .await?;
    Ok(HttpResponse::Ok().json(execution))
}

/// Submit results for several steps at once.
///
/// All updates commit together or not at all. Unknown step numbers are ignored.
#[utoipa::path(
    post,
    path = "/api/v1/executions/{execution_id}/steps/bulk",
    tag = "Test Executions",
    params(
        ("execution_id" = Uuid, Path, description = "Test execution UUID"),
        ("X-Actor-Id" = Uuid, Header, description = "Acting user")
    ),
    request_body = BulkStepUpdate,
    responses(
        (status = 200, description = "Updated step executions", body = Vec<StepExecution>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Test execution not found", body = ErrorResponse),
    )
)]
pub async fn bulk_update_steps(
    actor: Actor,
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
    body: web::Json<BulkStepUpdate>,
) -> AppResult<HttpResponse> {
    let updated = core
        .steps
        .bulk_update_steps(path.into_inner(), body.into_inner(), actor.context())
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Rollup of an execution's step statuses.
#[utoipa::path(
    get,
    path = "/api/v1/executions/{execution_id}/summary",
    tag = "Test Executions",
    params(("execution_id" = Uuid, Path, description = "Test execution UUID")),
    responses(
        (status = 200, description = "Step rollup", body = ExecutionSummaryResponse),
        (status = 404, description = "Test execution not found", body = ErrorResponse),
    )
)]
pub async fn get_execution_summary(
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let execution_id = path.into_inner();
    let summary = core
        .steps
        .execution_summary(execution_id, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(ExecutionSummaryResponse {
        execution_id,
        completion_percentage: completion_percentage(&summary),
        summary,
    }))
}

/// Record the result of a single step, optionally attaching evidence.
#[utoipa::path(
    put,
    path = "/api/v1/step-executions/{step_execution_id}",
    tag = "Step Executions",
    params(
        ("step_execution_id" = Uuid, Path, description = "Step execution UUID"),
        ("X-Actor-Id" = Uuid, Header, description = "Acting user")
    ),
    request_body = StepUpdate,
    responses(
        (status = 200, description = "Step execution updated", body = StepExecution),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Step execution not found", body = ErrorResponse),
    )
)]
pub async fn update_step(
    actor: Actor,
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
    body: web::Json<StepUpdate>,
) -> AppResult<HttpResponse> {
    let updated = core
        .steps
        .update_step(path.into_inner(), body.into_inner(), actor.context())
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Evidence attached to a step execution.
#[utoipa::path(
    get,
    path = "/api/v1/step-executions/{step_execution_id}/evidence",
    tag = "Step Executions",
    params(("step_execution_id" = Uuid, Path, description = "Step execution UUID")),
    responses(
        (status = 200, description = "Evidence records", body = EvidenceListResponse),
        (status = 404, description = "Step execution not found", body = ErrorResponse),
    )
)]
pub async fn list_evidence(
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let evidence = core.steps.list_evidence(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(EvidenceListResponse { evidence }))
}

/// Configure execution and step execution routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/executions/{execution_id}").route(web::get().to(get_execution)))
        .service(
            web::resource("/executions/{execution_id}/steps").route(web::get().to(list_steps)),
        )
        .service(
            web::resource("/executions/{execution_id}/steps/bulk")
                .route(web::post().to(bulk_update_steps)),
        )
        .service(
            web::resource("/executions/{execution_id}/result").route(web::put().to(set_result)),
        )
        .service(
            web::resource("/executions/{execution_id}/summary")
                .route(web::get().to(get_execution_summary)),
        )
        .service(
            web::resource("/step-executions/{step_execution_id}")
                .route(web::put().to(update_step)),
        )
        .service(
            web::resource("/step-executions/{step_execution_id}/evidence")
                .route(web::get().to(list_evidence)),
        );
}
