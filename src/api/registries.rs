//! Workflow registry endpoints.

use actix_web::{HttpResponse, web};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::AppResult;
use crate::models::{RegistryResponse, WorkflowSummary};
use crate::services::LifeMonitor;

#[derive(Debug, Serialize)]
pub struct RegistryListResponse {
    pub items: Vec<RegistryResponse>,
}

/// A registered workflow version the user can see on its registry.
#[derive(Debug, Serialize)]
pub struct UserWorkflowResponse {
    #[serde(flatten)]
    pub workflow: WorkflowSummary,
    pub external_id: String,
}

#[derive(Debug, Serialize)]
pub struct UserWorkflowListResponse {
    pub items: Vec<UserWorkflowResponse>,
}

#[derive(Debug, Serialize)]
pub struct VersionListResponse {
    pub items: Vec<WorkflowSummary>,
}

pub async fn list_registries(monitor: web::Data<LifeMonitor>) -> AppResult<HttpResponse> {
    let items = monitor
        .list_registries()
        .await?
        .iter()
        .map(|r| r.to_response())
        .collect();
    Ok(HttpResponse::Ok().json(RegistryListResponse { items }))
}

pub async fn get_registry(
    monitor: web::Data<LifeMonitor>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let registry = monitor.get_registry(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(registry.to_response()))
}

/// Registered workflows the caller is authorized to see on the registry.
pub async fn get_user_workflows(
    auth: AuthenticatedUser,
    monitor: web::Data<LifeMonitor>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let items = monitor
        .get_user_workflows(&auth.user, path.into_inner())
        .await?
        .into_iter()
        .map(|w| UserWorkflowResponse {
            workflow: w.summary(),
            external_id: w.external_id,
        })
        .collect();
    Ok(HttpResponse::Ok().json(UserWorkflowListResponse { items }))
}

pub async fn get_workflow_versions(
    monitor: web::Data<LifeMonitor>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (registry_id, workflow_uuid) = path.into_inner();
    let items = monitor
        .get_workflow_versions(registry_id, workflow_uuid)
        .await?;
    Ok(HttpResponse::Ok().json(VersionListResponse { items }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/registries").route(web::get().to(list_registries)))
        .service(web::resource("/registries/{registry_id}").route(web::get().to(get_registry)))
        .service(
            web::resource("/registries/{registry_id}/workflows")
                .route(web::get().to(get_user_workflows)),
        )
        .service(
            web::resource("/registries/{registry_id}/workflows/{workflow_uuid}/versions")
                .route(web::get().to(get_workflow_versions)),
        );
}
