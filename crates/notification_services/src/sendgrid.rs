use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::info;

use crate::{EmailService, NotificationError};

/// SendGrid v3 email service.
pub struct SendGridEmailService {
    http: Client,
    api_base: String,
    api_key: String,
    from_email: String,
}

impl SendGridEmailService {
    /// Creates a SendGrid email service sending from the given address.
    pub fn new(api_key: String, from_email: String) -> Result<Self, NotificationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NotificationError::Email(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: "https://api.sendgrid.com".to_string(),
            api_key,
            from_email,
        })
    }
}

#[async_trait]
impl EmailService for SendGridEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<String, NotificationError> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from_email },
            "subject": subject,
            "content": [{ "type": "text/html", "value": html_body }],
        });

        let response = self
            .http
            .post(format!("{}/v3/mail/send", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::Email(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(NotificationError::Email(format!(
                "SendGrid returned {status}: {body}"
            )));
        }

        let message_id = response
            .headers()
            .get("X-Message-Id")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        info!("sent email to {to} (id {message_id})");
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_service(server: &MockServer) -> SendGridEmailService {
        SendGridEmailService {
            http: Client::new(),
            api_base: server.uri(),
            api_key: "SG.key".to_string(),
            from_email: "tesco-notifier@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn posts_v3_mail_send_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .and(header("Authorization", "Bearer SG.key"))
            .and(body_string_contains("tesco-notifier@example.com"))
            .and(body_string_contains("Slot available"))
            .respond_with(
                ResponseTemplate::new(202).insert_header("X-Message-Id", "msg-42"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let service = test_service(&server);
        let id = service
            .send_email("dest@example.com", "Slot available", "<strong>now</strong>")
            .await
            .unwrap();
        assert_eq!(id, "msg-42");
    }

    #[tokio::test]
    async fn non_success_status_becomes_email_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let service = test_service(&server);
        let err = service
            .send_email("dest@example.com", "s", "b")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
