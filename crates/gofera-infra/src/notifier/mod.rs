//! Password reset delivery adapters.

use async_trait::async_trait;

use gofera_core::domain::{User, mask_email};
use gofera_core::ports::{NotifyError, PasswordResetNotifier};

/// Writes reset tokens to the log instead of sending mail. Meant for
/// development and for deployments that tail logs into a mail relay.
#[derive(Debug, Default, Clone)]
pub struct LoggingResetNotifier {
    /// Public URL prefix the token is appended to, e.g.
    /// `https://gofera.app/reset-password/`.
    pub reset_url_base: Option<String>,
}

impl LoggingResetNotifier {
    pub fn new(reset_url_base: Option<String>) -> Self {
        Self { reset_url_base }
    }
}

#[async_trait]
impl PasswordResetNotifier for LoggingResetNotifier {
    async fn send_reset_token(&self, user: &User, token: &str) -> Result<(), NotifyError> {
        let link = match &self.reset_url_base {
            Some(base) => format!("{base}{token}"),
            None => token.to_string(),
        };
        tracing::info!(
            target: "gofera::reset",
            user_id = %user.id,
            user_email = %mask_email(&user.email),
            reset = %link,
            "Password reset requested"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gofera_core::domain::NewUser;

    #[tokio::test]
    async fn test_logging_notifier_never_fails() {
        let user = User::new(
            NewUser {
                name: "Hana".into(),
                email: "hana@example.com".into(),
                phone: "+251900000001".into(),
                is_driver: false,
            },
            "hash".into(),
        )
        .unwrap();

        let notifier = LoggingResetNotifier::new(Some("http://localhost:3000/reset/".into()));
        assert!(notifier.send_reset_token(&user, "abc123").await.is_ok());
    }
}
