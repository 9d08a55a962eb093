//! Domain error types for LifeMonitor.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Test suite has no test definition attached
    #[error("Specification not defined: {0}")]
    SpecificationNotDefined(String),

    /// Test definition is malformed or misses a required property
    #[error("Specification not valid: {0}")]
    SpecificationNotValid(String),

    /// Test definition references an unknown testing service type
    #[error("Testing service not supported: {0}")]
    TestingServiceNotSupported(String),

    /// Testing service backend failed or could not be queried
    #[error("Testing service error: {0}")]
    TestingService(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Resource already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or rejected credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to act on the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Registry type or other static configuration is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Workflow registry call failed
    #[error("Registry error: {0}")]
    Registry(String),

    /// RO-Crate could not be downloaded or read
    #[error("RO-Crate error: {0}")]
    RoCrate(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;

        let (status, error_code, response_message) = match self {
            AppError::SpecificationNotDefined(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "SPECIFICATION_NOT_DEFINED",
                self.to_string(),
            ),
            AppError::SpecificationNotValid(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "SPECIFICATION_NOT_VALID",
                self.to_string(),
            ),
            AppError::TestingServiceNotSupported(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "TESTING_SERVICE_NOT_SUPPORTED",
                self.to_string(),
            ),
            AppError::TestingService(_) => (
                StatusCode::BAD_GATEWAY,
                "TESTING_SERVICE_ERROR",
                self.to_string(),
            ),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT", self.to_string()),
            AppError::Unauthorized(_) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string())
            }
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),
            AppError::Configuration(err_str) => {
                tracing::error!("Configuration error: {}", err_str);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    self.to_string(),
                )
            }
            AppError::Registry(_) => (StatusCode::BAD_GATEWAY, "REGISTRY_ERROR", self.to_string()),
            AppError::RoCrate(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "ROCRATE_ERROR",
                self.to_string(),
            ),
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::InvalidInput(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", self.to_string())
            }
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

/// Failure raised by a testing service adapter.
///
/// Kept apart from [`AppError`] so the health aggregator can tell
/// "backend unreachable" from every other failure at the type level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TestingServiceError(pub String);

impl TestingServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<TestingServiceError> for AppError {
    fn from(err: TestingServiceError) -> Self {
        AppError::TestingService(err.0)
    }
}

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("Invalid UUID: {}", err))
    }
}
