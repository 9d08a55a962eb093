//! Actix-web extractor for API key authentication.
//!
//! # Security
//! - The header value is wrapped in `SecretString` as soon as it is read
//! - Only the stored SHA-256 hash is ever compared
//! - The key never appears in logs or error messages

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use futures_util::future::LocalBoxFuture;
use secrecy::{ExposeSecret, SecretString};

use crate::config::API_KEY_HEADER;
use crate::db::DbPool;
use crate::error::{AppError, ErrorResponse};
use crate::models::User;
use crate::services::api_key;

/// Extract a secret header value, wrapping it in SecretString.
/// Returns None if the header is missing or invalid UTF-8.
fn extract_secret_header(req: &HttpRequest, header_name: &str) -> Option<SecretString> {
    req.headers()
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(|s| SecretString::from(s.to_string()))
}

/// Authentication error for extractors.
#[derive(Debug)]
pub struct AuthError {
    status: StatusCode,
    message: String,
}

impl AuthError {
    fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        let error = if self.status == StatusCode::UNAUTHORIZED {
            "UNAUTHORIZED"
        } else {
            "INTERNAL_ERROR"
        };
        HttpResponse::build(self.status).json(ErrorResponse {
            error: error.to_string(),
            message: self.message.clone(),
        })
    }
}

/// Extractor that requires a valid API key and yields its owner.
///
/// ```ignore
/// async fn protected_handler(auth: AuthenticatedUser) -> impl Responder {
///     // auth.user is the acting user
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
}

impl FromRequest for AuthenticatedUser {
    type Error = AuthError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let pool = req.app_data::<web::Data<DbPool>>().cloned();
        let provided = extract_secret_header(req, API_KEY_HEADER);

        Box::pin(async move {
            let Some(pool) = pool else {
                return Err(AuthError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Internal configuration error".to_string(),
                });
            };
            let Some(key) = provided else {
                return Err(AuthError::unauthorized(format!(
                    "Missing API key. Provide {} header.",
                    API_KEY_HEADER
                )));
            };

            match api_key::verify_key(pool.get_ref(), key.expose_secret()).await {
                Ok(user) => Ok(AuthenticatedUser { user }),
                Err(AppError::Unauthorized(message)) => Err(AuthError::unauthorized(message)),
                Err(e) => {
                    tracing::error!("API key lookup failed: {}", e);
                    Err(AuthError {
                        status: StatusCode::INTERNAL_SERVER_ERROR,
                        message: "Authentication backend unavailable".to_string(),
                    })
                }
            }
        })
    }
}
