//! HTTP handlers end to end.

use actix_web::dev::ServiceResponse;
use actix_web::{App, test, web};
use serde_json::{Value, json};
use uuid::Uuid;

use test_execution_lib::api;
use test_execution_lib::config::ACTOR_ID_HEADER;

use super::test_helpers::*;

async fn create_test_app(
    env: &TestEnv,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(env.pool.clone()))
            .app_data(web::Data::new(env.core.clone()))
            .service(web::scope("/api/v1").configure(api::configure_api)),
    )
    .await
}

async fn send<S>(app: &S, req: test::TestRequest) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status().as_u16();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

#[actix_rt::test]
async fn test_health_and_ready() {
    let (env, _) = TestEnv::new().await;
    let app = create_test_app(&env).await;

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/v1/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/v1/ready")).await;
    assert_eq!(status, 200, "{:?}", body);
    assert_eq!(body["database"], "connected");
}

#[actix_rt::test]
async fn test_execution_flow_over_http() {
    let (env, _) = TestEnv::new().await;
    let case_a = env.case("Login", 2).await;
    let case_b = env.case("Logout", 1).await;
    let app = create_test_app(&env).await;
    let actor = env.actor_id.to_string();

    // Create run
    let (status, run) = send(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/projects/{}/runs", env.project_id))
            .insert_header((ACTOR_ID_HEADER, actor.as_str()))
            .set_json(json!({
                "name": "HTTP run",
                "environment": "staging",
                "test_case_ids": [case_a, case_b]
            })),
    )
    .await;
    assert_eq!(status, 201, "{:?}", run);
    assert_eq!(run["status"], "planned");
    let run_id = run["id"].as_str().unwrap().to_string();

    // Executions
    let (status, body) = send(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/runs/{}/executions", run_id)),
    )
    .await;
    assert_eq!(status, 200);
    let executions = body["executions"].as_array().unwrap();
    assert_eq!(executions.len(), 2);
    let exec_a = executions
        .iter()
        .find(|e| e["test_case_id"] == case_a.to_string())
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Steps are materialized on first view
    let (status, body) = send(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/executions/{}/steps", exec_a)),
    )
    .await;
    assert_eq!(status, 200);
    let steps = body["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["execution"]["status"], "not_run");
    let first_step = steps[0]["execution"]["id"].as_str().unwrap().to_string();

    // Single step with base64 evidence ("hello")
    let (status, body) = send(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/step-executions/{}", first_step))
            .insert_header((ACTOR_ID_HEADER, actor.as_str()))
            .set_json(json!({
                "status": "failed",
                "actual_result": "button missing",
                "evidence": {
                    "file_name": "console.log",
                    "data": "aGVsbG8=",
                    "description": "browser console"
                }
            })),
    )
    .await;
    assert_eq!(status, 200, "{:?}", body);
    assert_eq!(body["status"], "failed");

    let (status, body) = send(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/step-executions/{}/evidence", first_step)),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["evidence"].as_array().unwrap().len(), 1);
    assert_eq!(body["evidence"][0]["description"], "browser console");
    assert_eq!(body["evidence"][0]["size_bytes"], 5);

    // Bulk update, unknown step 9 ignored
    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/executions/{}/steps/bulk", exec_a))
            .insert_header((ACTOR_ID_HEADER, actor.as_str()))
            .set_json(json!({
                "steps": [
                    { "step_number": 2, "status": "passed" },
                    { "step_number": 9, "status": "failed" }
                ]
            })),
    )
    .await;
    assert_eq!(status, 200, "{:?}", body);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/executions/{}/summary", exec_a)),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["summary"]["total"], 2);
    assert_eq!(body["summary"]["failed"], 1);
    assert_eq!(body["summary"]["passed"], 1);
    assert_eq!(body["completion_percentage"], 50);

    // Overall result
    let (status, body) = send(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/executions/{}/result", exec_a))
            .insert_header((ACTOR_ID_HEADER, actor.as_str()))
            .set_json(json!({ "status": "failed", "notes": "login broken" })),
    )
    .await;
    assert_eq!(status, 200, "{:?}", body);
    assert_eq!(body["executed_by"], actor);

    let (status, body) = send(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/runs/{}/summary", run_id)),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["summary"]["total"], 2);
    assert_eq!(body["summary"]["failed"], 1);
    assert_eq!(body["summary"]["not_run"], 1);
    assert_eq!(body["name"], "HTTP run");

    // Listing with filter
    let (status, body) = send(
        &app,
        test::TestRequest::get().uri(&format!(
            "/api/v1/projects/{}/runs?status=planned&search=HTTP",
            env.project_id
        )),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["runs"].as_array().unwrap().len(), 1);

    // Metadata and insights
    let (status, body) = send(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/runs/{}", run_id))
            .insert_header((ACTOR_ID_HEADER, actor.as_str()))
            .set_json(json!({ "name": "HTTP run", "status": "completed" })),
    )
    .await;
    assert_eq!(status, 200, "{:?}", body);
    assert_eq!(body["status"], "completed");

    let (status, body) = send(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/runs/{}/ai-insights", run_id))
            .insert_header((ACTOR_ID_HEADER, actor.as_str()))
            .set_json(json!({ "insights": "Login is flaky." })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["ai_insights"], "Login is flaky.");

    // Delete
    let (status, _) = send(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/runs/{}", run_id))
            .insert_header((ACTOR_ID_HEADER, actor.as_str())),
    )
    .await;
    assert_eq!(status, 204);

    let (status, body) = send(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/runs/{}", run_id)),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[actix_rt::test]
async fn test_error_responses() {
    let (env, _) = TestEnv::new().await;
    let case = env.case("Errors", 1).await;
    let app = create_test_app(&env).await;

    // Missing actor header
    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/projects/{}/runs", env.project_id))
            .set_json(json!({ "name": "No actor", "test_case_ids": [case] })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");

    // Malformed actor header
    let (status, _) = send(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/projects/{}/runs", env.project_id))
            .insert_header((ACTOR_ID_HEADER, "someone"))
            .set_json(json!({ "name": "Bad actor", "test_case_ids": [case] })),
    )
    .await;
    assert_eq!(status, 400);

    // Empty selection
    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/projects/{}/runs", env.project_id))
            .insert_header((ACTOR_ID_HEADER, env.actor_id.to_string()))
            .set_json(json!({ "name": "Empty", "test_case_ids": [] })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");

    // Unknown execution
    let (status, body) = send(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/executions/{}/result", Uuid::now_v7()))
            .insert_header((ACTOR_ID_HEADER, env.actor_id.to_string()))
            .set_json(json!({ "status": "passed" })),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
}
