//! Authentication and authorization ports.

use uuid::Uuid;

use crate::domain::UserRole;

/// Claims stored in session tokens.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub role: UserRole,
    pub issued_at: i64,
    /// Issue time in unix milliseconds, compared against password changes.
    pub issued_at_ms: i64,
    pub exp: i64,
}

/// Token service trait for session JWT operations.
pub trait TokenService: Send + Sync {
    /// Generate a session token for a user.
    fn generate_token(&self, user_id: Uuid, role: UserRole) -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Token lifetime in seconds.
    fn expiration_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// A freshly minted password reset token. Only `digest` is ever stored.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub plain: String,
    pub digest: String,
}

/// One-way reset token generation.
pub trait ResetTokenService: Send + Sync {
    fn generate(&self) -> ResetToken;

    /// Digest a client-submitted token for lookup.
    fn digest(&self, plain: &str) -> String;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Your account has been deactivated")]
    AccountDeactivated,

    #[error("Token expired. Please log in again.")]
    TokenExpired,

    #[error("Invalid token. Please log in again.")]
    InvalidToken(String),

    #[error("You are not logged in! Please log in to get access.")]
    MissingAuth,

    #[error("The user belonging to this token no longer exists.")]
    UserGone,

    #[error("User recently changed password! Please log in again.")]
    PasswordChanged,

    #[error("Your current password is incorrect.")]
    WrongCurrentPassword,

    #[error("You do not have permission to perform this action")]
    InsufficientPermissions,

    #[error("Only drivers can perform this action")]
    DriverRequired,

    #[error("Hashing error: {0}")]
    HashingError(String),

    #[error("User lookup failed: {0}")]
    Storage(String),
}
