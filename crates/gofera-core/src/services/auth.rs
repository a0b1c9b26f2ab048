//! Sign-up, login, session verification and password flows.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::{NewUser, User, UserRole, mask_email, normalize_email, validate_password};
use crate::error::DomainError;
use crate::ports::{
    AuthError, PasswordResetNotifier, PasswordService, ResetTokenService, TokenService,
    UserRepository,
};

/// An authenticated user together with a freshly issued session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub is_driver: bool,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordService>,
    reset_tokens: Arc<dyn ResetTokenService>,
    notifier: Arc<dyn PasswordResetNotifier>,
    reset_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
        reset_tokens: Arc<dyn ResetTokenService>,
        notifier: Arc<dyn PasswordResetNotifier>,
        reset_ttl: Duration,
    ) -> Self {
        Self {
            users,
            tokens,
            passwords,
            reset_tokens,
            notifier,
            reset_ttl,
        }
    }

    pub async fn signup(&self, input: SignupInput) -> Result<Session, DomainError> {
        validate_password(&input.password)?;

        // Validate the profile before paying for a hash.
        let mut user = User::new(
            NewUser {
                name: input.name,
                email: input.email,
                phone: input.phone,
                is_driver: input.is_driver,
            },
            String::new(),
        )?;

        if self.users.email_taken(&user.email).await? {
            return Err(DomainError::Duplicate("Email already registered".into()));
        }

        user.password_hash = self.passwords.hash(&input.password)?;
        let user = self.users.create(user).await.map_err(|e| match e {
            crate::error::RepoError::Constraint(_) => {
                DomainError::Duplicate("Email already registered".into())
            }
            other => other.into(),
        })?;

        tracing::info!(user_id = %user.id, is_driver = user.is_driver, "User signed up");
        self.issue(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, DomainError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(DomainError::Validation(
                "Please provide email and password".into(),
            ));
        }

        let email = normalize_email(email);
        let user = self
            .users
            .find_by_email_including_inactive(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.passwords.verify(password, &user.password_hash)? {
            tracing::debug!(user_email = %mask_email(&email), "Login rejected: bad password");
            return Err(AuthError::InvalidCredentials.into());
        }

        if !user.active {
            return Err(AuthError::AccountDeactivated.into());
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.issue(user)
    }

    /// Resolve a session token to a live user. Deactivated or deleted users
    /// and tokens predating a password change are rejected on every call.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.validate_token(token)?;

        let user = self
            .users
            .find_by_id(claims.user_id)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .ok_or(AuthError::UserGone)?;

        if user.changed_password_after(claims.issued_at_ms) {
            return Err(AuthError::PasswordChanged);
        }

        Ok(user)
    }

    pub async fn change_password(
        &self,
        user: &User,
        current: &str,
        new_password: &str,
    ) -> Result<Session, DomainError> {
        if !self.passwords.verify(current, &user.password_hash)? {
            return Err(AuthError::WrongCurrentPassword.into());
        }
        validate_password(new_password)?;

        let mut user = user.clone();
        user.set_password_hash(self.passwords.hash(new_password)?);
        let user = self.users.update(user).await?;

        tracing::info!(user_id = %user.id, "Password changed");
        self.issue(user)
    }

    /// Start a reset. The outcome is deliberately invisible to the caller.
    pub async fn forgot_password(&self, email: &str) -> Result<(), DomainError> {
        let email = normalize_email(email);
        let Some(mut user) = self.users.find_by_email(&email).await? else {
            tracing::debug!(user_email = %mask_email(&email), "Reset requested for unknown email");
            return Ok(());
        };

        let token = self.reset_tokens.generate();
        user.password_reset_token = Some(token.digest);
        user.password_reset_expires = Some(Utc::now() + self.reset_ttl);
        let mut user = self.users.update(user).await?;

        if let Err(e) = self.notifier.send_reset_token(&user, &token.plain).await {
            tracing::warn!(user_id = %user.id, error = %e, "Reset token delivery failed");
            user.password_reset_token = None;
            user.password_reset_expires = None;
            self.users.update(user).await?;
        }

        Ok(())
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<Session, DomainError> {
        let digest = self.reset_tokens.digest(token);
        let mut user = self
            .users
            .find_by_reset_token(&digest, Utc::now())
            .await?
            .ok_or_else(|| DomainError::Validation("Token is invalid or has expired".into()))?;

        validate_password(new_password)?;
        user.set_password_hash(self.passwords.hash(new_password)?);
        let user = self.users.update(user).await?;

        tracing::info!(user_id = %user.id, "Password reset completed");
        self.issue(user)
    }

    fn issue(&self, user: User) -> Result<Session, DomainError> {
        let token = self.tokens.generate_token(user.id, user.role)?;
        Ok(Session {
            user,
            token,
            expires_in: self.tokens.expiration_seconds(),
        })
    }
}

/// Fail unless the user's role is one of `allowed`.
pub fn restrict_to(user: &User, allowed: &[UserRole]) -> Result<(), AuthError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermissions)
    }
}

/// Fail unless the user has the driver flag.
pub fn require_driver(user: &User) -> Result<(), AuthError> {
    if user.is_driver {
        Ok(())
    } else {
        Err(AuthError::DriverRequired)
    }
}
