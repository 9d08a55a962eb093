//! HTTP endpoints, mounted under `/api/v1`.

pub mod health;
pub mod registries;
pub mod suites;
pub mod workflows;

use actix_web::web;

pub use health::configure_health_routes;
pub use registries::configure_routes as configure_registry_routes;
pub use suites::configure_routes as configure_suite_routes;
pub use workflows::configure_routes as configure_workflow_routes;

/// Every `/api/v1` route.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(configure_registry_routes)
        .configure(configure_workflow_routes)
        .configure(configure_suite_routes);
}
