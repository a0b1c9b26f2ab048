//! Error handling - maps failures onto the `{status, message}` envelope.

use std::sync::OnceLock;

use actix_web::{HttpRequest, HttpResponse, ResponseError, error, http::StatusCode};
use gofera_core::error::{DomainError, RepoError};
use gofera_core::ports::AuthError;
use gofera_shared::ErrorResponse;

const GENERIC_MESSAGE: &str = "Something went wrong!";

static DEV_MODE: OnceLock<bool> = OnceLock::new();

/// Expose internal error detail in responses. Only the first call counts.
pub fn set_dev_mode(enabled: bool) {
    let _ = DEV_MODE.set(enabled);
}

fn dev_mode() -> bool {
    DEV_MODE.get().copied().unwrap_or(false)
}

/// Application-level error type rendered as an error envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    TooManyRequests(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = self.status_code();
        let body = match self {
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                let body = ErrorResponse::for_status(code.as_u16(), GENERIC_MESSAGE);
                if dev_mode() {
                    body.with_error(detail.clone())
                } else {
                    body
                }
            }
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::TooManyRequests(msg) => ErrorResponse::for_status(code.as_u16(), msg),
        };

        HttpResponse::build(code).json(body)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, .. } => {
                AppError::NotFound(format!("No {entity_type} found with that ID"))
            }
            DomainError::Validation(msg) | DomainError::BusinessRule(msg) => {
                AppError::BadRequest(msg)
            }
            DomainError::Duplicate(msg) => AppError::Conflict(msg),
            DomainError::Unauthorized(msg) => AppError::Unauthorized(msg),
            DomainError::Forbidden(msg) => AppError::Forbidden(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        DomainError::from(err).into()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        DomainError::from(err).into()
    }
}

/// Malformed JSON bodies, including ones over the size limit.
pub fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        error::JsonPayloadError::OverflowKnownLength { .. } | error::JsonPayloadError::Overflow { .. } => {
            "Request body is too large".to_string()
        }
        error::JsonPayloadError::ContentType => "Content type must be application/json".to_string(),
        other => format!("Invalid input data. {other}"),
    };
    AppError::BadRequest(message).into()
}

/// Path segments that fail to parse; in practice, malformed ids.
pub fn path_error_handler(_err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest("Invalid ID format.".to_string()).into()
}

pub fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid query string. {err}")).into()
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
