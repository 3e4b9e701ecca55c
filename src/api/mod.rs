//! API endpoint modules.

pub mod actor;
pub mod health;
pub mod openapi;
pub mod test_executions;
pub mod test_runs;

use actix_web::web;

pub use actor::Actor;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use test_executions::configure_routes as configure_execution_routes;
pub use test_runs::configure_routes as configure_run_routes;

/// Mount every API route under the current scope.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(configure_run_routes)
        .configure(configure_execution_routes);
}
