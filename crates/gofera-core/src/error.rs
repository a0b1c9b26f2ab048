//! Domain-level error types.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::RuleViolation;

/// Domain errors - business logic failures.
///
/// Every variant except `Internal` carries a message that is safe to return
/// to clients.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No {entity_type} found with id {id}")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BusinessRule(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn ride_not_found(id: Uuid) -> Self {
        DomainError::NotFound {
            entity_type: "ride",
            id,
        }
    }

    pub fn user_not_found(id: Uuid) -> Self {
        DomainError::NotFound {
            entity_type: "user",
            id,
        }
    }
}

impl From<RuleViolation> for DomainError {
    fn from(violation: RuleViolation) -> Self {
        DomainError::BusinessRule(violation.to_string())
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// The atomic re-check inside a mutating ride operation failed.
    #[error("{0}")]
    Rejected(RuleViolation),
}

impl From<RuleViolation> for RepoError {
    fn from(violation: RuleViolation) -> Self {
        RepoError::Rejected(violation)
    }
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Rejected(violation) => violation.into(),
            RepoError::Constraint(msg) => DomainError::Duplicate(msg),
            RepoError::NotFound => DomainError::Internal("entity vanished during update".into()),
            RepoError::Connection(msg) | RepoError::Query(msg) => DomainError::Internal(msg),
        }
    }
}

impl From<crate::ports::AuthError> for DomainError {
    fn from(err: crate::ports::AuthError) -> Self {
        use crate::ports::AuthError;
        match err {
            AuthError::InsufficientPermissions | AuthError::DriverRequired => {
                DomainError::Forbidden(err.to_string())
            }
            AuthError::HashingError(msg) | AuthError::Storage(msg) => DomainError::Internal(msg),
            other => DomainError::Unauthorized(other.to_string()),
        }
    }
}
