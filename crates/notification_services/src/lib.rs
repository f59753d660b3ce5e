//! # Notification Services
//!
//! Outbound notification providers for the slot watcher: an SMS capability
//! backed by Twilio and an email capability backed by SendGrid, behind small
//! traits so callers can be exercised with mocks.

/// Error types shared by all providers.
mod types;
pub use types::NotificationError;

/// Capability traits and log-only mock implementations.
mod service;
pub use service::{EmailService, MockEmailService, MockSmsService, SmsService};

/// Twilio Programmable Messaging SMS backend.
mod twilio;
pub use twilio::TwilioSmsService;

/// SendGrid v3 email backend.
mod sendgrid;
pub use sendgrid::SendGridEmailService;
