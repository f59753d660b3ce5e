/// Errors raised by the outbound notification providers.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Email provider error.
    #[error("email error: {0}")]
    Email(String),

    /// SMS provider error.
    #[error("SMS error: {0}")]
    Sms(String),
}
