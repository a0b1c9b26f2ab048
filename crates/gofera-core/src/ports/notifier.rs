//! Outbound notification port.

use async_trait::async_trait;

use crate::domain::User;

/// Delivers password reset tokens out of band (email, SMS, log).
#[async_trait]
pub trait PasswordResetNotifier: Send + Sync {
    async fn send_reset_token(&self, user: &User, token: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to deliver notification: {0}")]
    Delivery(String),
}
