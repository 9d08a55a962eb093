//! Request logging middleware.
//!
//! Logs one line when a request arrives and one when it completes, under the
//! `api` target. API keys are reduced to a short prefix.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::StatusCode;
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::time::Instant;
use tracing::{info, warn};

use crate::config::API_KEY_HEADER;
use crate::services::api_key::KEY_LOG_PREFIX_LENGTH;

/// Loggable form of an `X-API-Key` header value.
fn api_key_prefix(key: Option<&str>) -> String {
    match key {
        None => "none".to_string(),
        Some(k) => match k.get(..KEY_LOG_PREFIX_LENGTH) {
            Some(prefix) if k.len() > KEY_LOG_PREFIX_LENGTH => format!("{}...", prefix),
            _ => "invalid".to_string(),
        },
    }
}

fn outcome(status: StatusCode) -> &'static str {
    if status.is_success() || status.is_redirection() {
        "completed"
    } else if status.is_client_error() {
        "client error"
    } else {
        "server error"
    }
}

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        let api_key = api_key_prefix(
            req.headers()
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok()),
        );

        info!(
            target: "api",
            method = %method,
            path = %path,
            query = %req.query_string(),
            remote_addr = %remote_addr,
            api_key = %api_key,
            "Request started"
        );

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let status = res.status();
            let duration_ms = start.elapsed().as_millis();

            if status.is_success() {
                info!(
                    target: "api",
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    duration_ms = %duration_ms,
                    "Request {}",
                    outcome(status)
                );
            } else {
                warn!(
                    target: "api",
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    duration_ms = %duration_ms,
                    "Request {}",
                    outcome(status)
                );
            }

            Ok(res)
        })
    }
}
