use async_trait::async_trait;
use tracing::info;

use crate::NotificationError;

/// Trait for SMS service implementations.
///
/// Returns the provider's message identifier on success.
#[async_trait]
pub trait SmsService: Send + Sync {
    /// Sends one text message to one recipient.
    async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotificationError>;
}

/// Trait for email service implementations.
///
/// Returns the provider's message identifier on success.
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Sends one HTML email to one recipient.
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<String, NotificationError>;
}

/// Log-only SMS service for development and testing.
pub struct MockSmsService;

#[async_trait]
impl SmsService for MockSmsService {
    async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotificationError> {
        info!("📱 [MOCK SMS] To: {to}");
        info!("📱 [MOCK SMS] Message: {message}");
        Ok("mock-sms".to_string())
    }
}

/// Log-only email service for development and testing.
pub struct MockEmailService;

#[async_trait]
impl EmailService for MockEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<String, NotificationError> {
        info!("📧 [MOCK EMAIL] To: {to}");
        info!("📧 [MOCK EMAIL] Subject: {subject}");
        info!("📧 [MOCK EMAIL] Body:\n{html_body}");
        Ok("mock-email".to_string())
    }
}
