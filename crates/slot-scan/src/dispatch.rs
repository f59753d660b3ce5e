use std::sync::Arc;

use notification_services::{EmailService, SmsService};
use tracing::{error, info, warn};

use crate::scan_types::SlotFound;

/// Recipients of availability alerts.
#[derive(Debug, Clone, Default)]
pub struct Recipients {
    /// Phone numbers receiving SMS alerts.
    pub phone_numbers: Vec<String>,
    /// Email addresses receiving email alerts.
    pub emails: Vec<String>,
}

/// Formats availability alerts and fans them out to every recipient.
///
/// A pure side-effect capability: delivery failures are logged per
/// recipient and never abort the remaining sends; the dispatcher has no
/// control over process lifecycle.
pub struct NotificationDispatcher {
    sms: Option<Arc<dyn SmsService>>,
    email: Option<Arc<dyn EmailService>>,
    recipients: Recipients,
}

impl NotificationDispatcher {
    /// Creates a dispatcher over the configured channels and recipients.
    pub fn new(
        sms: Option<Arc<dyn SmsService>>,
        email: Option<Arc<dyn EmailService>>,
        recipients: Recipients,
    ) -> Self {
        Self {
            sms,
            email,
            recipients,
        }
    }

    /// Sends the availability alert over every configured channel.
    pub async fn notify(&self, event: &SlotFound) {
        if let Some(sms) = &self.sms {
            let body = Self::sms_body(event);
            for number in &self.recipients.phone_numbers {
                match sms.send_sms(number, &body).await {
                    Ok(id) => info!("sent alert SMS to {number} ({id})"),
                    Err(err) => error!("failed to send alert SMS to {number}: {err}"),
                }
            }
        }

        if let Some(email) = &self.email {
            let (subject, html_body) = Self::email_content(event);
            for address in &self.recipients.emails {
                if let Err(err) = email.send_email(address, &subject, &html_body).await {
                    error!("failed to send alert email to {address}: {err}");
                }
            }
        }
    }

    /// Sends a start-of-run probe email to every email recipient, surfacing
    /// a broken provider before the first scan. Failures are logged only.
    pub async fn notify_startup(&self) {
        let Some(email) = &self.email else {
            return;
        };

        for address in &self.recipients.emails {
            if let Err(err) = email
                .send_email(
                    address,
                    "Slot watcher online",
                    "<strong>The slot watcher has started and is scanning for slots.</strong>",
                )
                .await
            {
                warn!("startup probe email to {address} failed: {err}");
            }
        }
    }

    fn sms_body(event: &SlotFound) -> String {
        format!(
            "Tesco {} slot available at {} on {}: {}",
            event.channel_label(),
            event.place(),
            event.date,
            event.description
        )
    }

    fn email_content(event: &SlotFound) -> (String, String) {
        let subject = format!("Tesco slot available: {} on {}", event.place(), event.date);
        let html_body = format!(
            "<strong>{} slot open at {} on {}: {}</strong>",
            event.channel_label(),
            event.place(),
            event.date,
            event.description
        );
        (subject, html_body)
    }
}
