//! Workflow version and test suite registration endpoints.

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::AppResult;
use crate::models::{DetailOptions, WorkflowSubmission};
use crate::services::LifeMonitor;

#[derive(Debug, Deserialize)]
pub struct WorkflowPath {
    pub uuid: Uuid,
    pub version: String,
}

/// `?registry=` selects the registry when a workflow version is registered in several.
#[derive(Debug, Default, Deserialize)]
pub struct RegistryFilter {
    pub registry: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RegisterWorkflowResponse {
    pub uuid: Uuid,
    pub version: String,
    pub name: String,
    pub roc_link: String,
    pub external_id: String,
    pub test_suites: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RegisterSuiteResponse {
    pub uuid: Uuid,
    pub workflow_uuid: Uuid,
    pub version: String,
    pub tests: Vec<String>,
    pub test_instances: usize,
}

/// Register a workflow version from one of the known registries.
pub async fn register_workflow(
    auth: AuthenticatedUser,
    monitor: web::Data<LifeMonitor>,
    body: web::Json<WorkflowSubmission>,
) -> AppResult<HttpResponse> {
    let workflow = monitor
        .register_workflow(&auth.user, body.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(RegisterWorkflowResponse {
        test_suites: workflow.test_suites.iter().map(|s| s.id).collect(),
        uuid: workflow.uuid,
        version: workflow.version,
        name: workflow.name,
        roc_link: workflow.roc_link,
        external_id: workflow.external_id,
    }))
}

/// Workflow envelope with health; `?test_suite&test_build&test_output` add detail.
pub async fn get_workflow(
    monitor: web::Data<LifeMonitor>,
    path: web::Path<WorkflowPath>,
    filter: web::Query<RegistryFilter>,
    query: web::Query<DetailOptions>,
) -> AppResult<HttpResponse> {
    let WorkflowPath { uuid, version } = path.into_inner();
    let response = monitor
        .workflow_response(filter.registry, uuid, &version, query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn deregister_workflow(
    auth: AuthenticatedUser,
    monitor: web::Data<LifeMonitor>,
    path: web::Path<WorkflowPath>,
    filter: web::Query<RegistryFilter>,
) -> AppResult<HttpResponse> {
    let WorkflowPath { uuid, version } = path.into_inner();
    monitor
        .deregister_workflow(&auth.user, filter.registry, uuid, &version)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Attach a test suite built from the posted test definition.
pub async fn register_test_suite(
    auth: AuthenticatedUser,
    monitor: web::Data<LifeMonitor>,
    path: web::Path<WorkflowPath>,
    filter: web::Query<RegistryFilter>,
    body: web::Json<JsonValue>,
) -> AppResult<HttpResponse> {
    let WorkflowPath { uuid, version } = path.into_inner();
    let suite = monitor
        .register_test_suite(&auth.user, filter.registry, uuid, &version, body.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(RegisterSuiteResponse {
        uuid: suite.id,
        workflow_uuid: uuid,
        version,
        tests: suite.tests()?.iter().map(|t| t.name.clone()).collect(),
        test_instances: suite.instances.len(),
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/workflows").route(web::post().to(register_workflow)))
        .service(
            web::resource("/workflows/{uuid}/{version}")
                .route(web::get().to(get_workflow))
                .route(web::delete().to(deregister_workflow)),
        )
        .service(
            web::resource("/workflows/{uuid}/{version}/suites")
                .route(web::post().to(register_test_suite)),
        );
}
