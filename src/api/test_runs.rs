//! Test run API handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use super::actor::Actor;
use crate::error::{AppResult, ErrorResponse};
use crate::models::{
    AiInsightsRequest, CreateRunRequest, ExecutionListResponse, ListRunsParams, RunListResponse,
    RunMetadata, RunWithSummary, TestRun,
};
use crate::services::CoreServices;

/// Create a test run over a selection of test cases.
///
/// One `not_run` execution is created per selected case, atomically with the run.
#[utoipa::path(
    post,
    path = "/api/v1/projects/{project_id}/runs",
    tag = "Test Runs",
    params(
        ("project_id" = Uuid, Path, description = "Project UUID"),
        ("X-Actor-Id" = Uuid, Header, description = "Acting user")
    ),
    request_body = CreateRunRequest,
    responses(
        (status = 201, description = "Test run created", body = TestRun),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
pub async fn create_run(
    actor: Actor,
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
    body: web::Json<CreateRunRequest>,
) -> AppResult<HttpResponse> {
    let run = core
        .runs
        .create_run(path.into_inner(), body.into_inner(), actor.context())
        .await?;
    Ok(HttpResponse::Created().json(run))
}

/// List runs of a project, newest first, with their rollups.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/runs",
    tag = "Test Runs",
    params(
        ("project_id" = Uuid, Path, description = "Project UUID"),
        ("status" = Option<String>, Query, description = "Filter by run status"),
        ("search" = Option<String>, Query, description = "Substring of name or description")
    ),
    responses(
        (status = 200, description = "List of runs", body = RunListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
    )
)]
pub async fn list_runs(
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
    query: web::Query<ListRunsParams>,
) -> AppResult<HttpResponse> {
    let runs = core.runs.list_runs(path.into_inner(), &query).await?;
    Ok(HttpResponse::Ok().json(RunListResponse { runs }))
}

/// Get a test run.
#[utoipa::path(
    get,
    path = "/api/v1/runs/{run_id}",
    tag = "Test Runs",
    params(("run_id" = Uuid, Path, description = "Test run UUID")),
    responses(
        (status = 200, description = "Test run", body = TestRun),
        (status = 404, description = "Test run not found", body = ErrorResponse),
    )
)]
pub async fn get_run(
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let run = core.runs.get_run(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(run))
}

/// Replace the editable fields of a run. Executions are not touched.
#[utoipa::path(
    put,
    path = "/api/v1/runs/{run_id}",
    tag = "Test Runs",
    params(
        ("run_id" = Uuid, Path, description = "Test run UUID"),
        ("X-Actor-Id" = Uuid, Header, description = "Acting user")
    ),
    request_body = RunMetadata,
    responses(
        (status = 200, description = "Test run updated", body = TestRun),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Test run not found", body = ErrorResponse),
    )
)]
pub async fn update_run(
    actor: Actor,
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
    body: web::Json<RunMetadata>,
) -> AppResult<HttpResponse> {
    let run = core
        .runs
        .update_run_metadata(path.into_inner(), body.into_inner(), actor.context())
        .await?;
    Ok(HttpResponse::Ok().json(run))
}

/// Delete a run with its executions, step executions and evidence.
#[utoipa::path(
    delete,
    path = "/api/v1/runs/{run_id}",
    tag = "Test Runs",
    params(
        ("run_id" = Uuid, Path, description = "Test run UUID"),
        ("X-Actor-Id" = Uuid, Header, description = "Acting user")
    ),
    responses(
        (status = 204, description = "Test run deleted"),
        (status = 404, description = "Test run not found", body = ErrorResponse),
    )
)]
pub async fn delete_run(
    actor: Actor,
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    core.runs
        .delete_run(path.into_inner(), actor.context())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Rollup of a run's execution statuses.
#[utoipa::path(
    get,
    path = "/api/v1/runs/{run_id}/summary",
    tag = "Test Runs",
    params(("run_id" = Uuid, Path, description = "Test run UUID")),
    responses(
        (status = 200, description = "Run with rollup", body = RunWithSummary),
        (status = 404, description = "Test run not found", body = ErrorResponse),
    )
)]
pub async fn get_run_summary(
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let summary = core.runs.run_summary(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Executions of a run.
#[utoipa::path(
    get,
    path = "/api/v1/runs/{run_id}/executions",
    tag = "Test Runs",
    params(("run_id" = Uuid, Path, description = "Test run UUID")),
    responses(
        (status = 200, description = "Executions of the run", body = ExecutionListResponse),
        (status = 404, description = "Test run not found", body = ErrorResponse),
    )
)]
pub async fn list_run_executions(
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let executions = core.runs.list_executions(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ExecutionListResponse { executions }))
}

/// Store AI-generated analysis text on a run.
#[utoipa::path(
    put,
    path = "/api/v1/runs/{run_id}/ai-insights",
    tag = "Test Runs",
    params(
        ("run_id" = Uuid, Path, description = "Test run UUID"),
        ("X-Actor-Id" = Uuid, Header, description = "Acting user")
    ),
    request_body = AiInsightsRequest,
    responses(
        (status = 200, description = "Insights stored", body = TestRun),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Test run not found", body = ErrorResponse),
    )
)]
pub async fn set_ai_insights(
    actor: Actor,
    core: web::Data<CoreServices>,
    path: web::Path<Uuid>,
    body: web::Json<AiInsightsRequest>,
) -> AppResult<HttpResponse> {
    let run = core
        .runs
        .record_ai_insights(path.into_inner(), body.into_inner().insights, actor.context())
        .await?;
    Ok(HttpResponse::Ok().json(run))
}

/// Configure test run routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/projects/{project_id}/runs")
            .route(web::post().to(create_run))
            .route(web::get().to(list_runs)),
    )
    .service(
        web::resource("/runs/{run_id}")
            .route(web::get().to(get_run))
            .route(web::put().to(update_run))
            .route(web::delete().to(delete_run)),
    )
    .service(web::resource("/runs/{run_id}/summary").route(web::get().to(get_run_summary)))
    .service(
        web::resource("/runs/{run_id}/executions").route(web::get().to(list_run_executions)),
    )
    .service(web::resource("/runs/{run_id}/ai-insights").route(web::put().to(set_ai_insights)));
}
