//! Test suite and test instance endpoints.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::AppResult;
use crate::models::DetailOptions;
use crate::services::LifeMonitor;

pub async fn get_suite(
    monitor: web::Data<LifeMonitor>,
    path: web::Path<Uuid>,
    query: web::Query<DetailOptions>,
) -> AppResult<HttpResponse> {
    let response = monitor
        .suite_response(path.into_inner(), query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn deregister_suite(
    auth: AuthenticatedUser,
    monitor: web::Data<LifeMonitor>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    monitor
        .deregister_test_suite(&auth.user, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn get_instance(
    monitor: web::Data<LifeMonitor>,
    path: web::Path<Uuid>,
    query: web::Query<DetailOptions>,
) -> AppResult<HttpResponse> {
    let response = monitor
        .instance_response(path.into_inner(), query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/suites/{suite_id}")
            .route(web::get().to(get_suite))
            .route(web::delete().to(deregister_suite)),
    )
    .service(web::resource("/instances/{instance_id}").route(web::get().to(get_instance)));
}
