/// Outbound mail
///
/// Delivery is behind the [`Mailer`] trait so the HTTP layer can hold any
/// implementation. [`LogMailer`] writes the message to the log instead of
/// sending it, which is what development and tests use.
///
/// # Example
///
/// ```
/// use phaseplan_shared::mailer::{reset_link, LogMailer, Mailer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let link = reset_link("http://localhost:3000", "abc123");
/// assert_eq!(link, "http://localhost:3000/reset-password?token=abc123");
///
/// LogMailer.send_password_reset("ann@example.com", &link).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use tracing::info;

/// Mail delivery errors
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("Failed to deliver mail: {0}")]
    Delivery(String),
}

/// Sends account emails
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends a password reset link to `email`
    async fn send_password_reset(&self, email: &str, reset_link: &str) -> Result<(), MailerError>;
}

/// Mailer that logs messages instead of sending them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, email: &str, reset_link: &str) -> Result<(), MailerError> {
        info!(
            to = %email,
            reset_link = %reset_link,
            "Password reset email (not sent, logging only)"
        );
        Ok(())
    }
}

/// Builds the reset page URL for a raw token
pub fn reset_link(base_url: &str, token: &str) -> String {
    format!(
        "{}/reset-password?token={}",
        base_url.trim_end_matches('/'),
        token
    )
}
