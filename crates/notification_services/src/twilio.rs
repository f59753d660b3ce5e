use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::{NotificationError, SmsService};

/// Twilio Programmable Messaging SMS service.
pub struct TwilioSmsService {
    http: Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

#[derive(Debug, Deserialize)]
struct MessageReply {
    sid: String,
}

impl TwilioSmsService {
    /// Creates a Twilio SMS service for the given account and sender number.
    pub fn new(
        account_sid: String,
        auth_token: String,
        from_number: String,
    ) -> Result<Self, NotificationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NotificationError::Sms(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: "https://api.twilio.com".to_string(),
            account_sid,
            auth_token,
            from_number,
        })
    }
}

#[async_trait]
impl SmsService for TwilioSmsService {
    async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotificationError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        );
        let params = [
            ("To", to),
            ("From", self.from_number.as_str()),
            ("Body", message),
        ];

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| NotificationError::Sms(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(NotificationError::Sms(format!(
                "Twilio returned {status}: {body}"
            )));
        }

        let reply: MessageReply = response
            .json()
            .await
            .map_err(|e| NotificationError::Sms(format!("invalid Twilio response: {e}")))?;

        info!("sent SMS to {to} (sid {})", reply.sid);
        Ok(reply.sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_service(server: &MockServer) -> TwilioSmsService {
        TwilioSmsService {
            http: Client::new(),
            api_base: server.uri(),
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from_number: "+13103214290".to_string(),
        }
    }

    #[tokio::test]
    async fn posts_form_encoded_message_and_returns_sid() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
            .and(body_string_contains("To=%2B447700900123"))
            .and(body_string_contains("From=%2B13103214290"))
            .and(body_string_contains("Body=slot+available"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SM1" })))
            .expect(1)
            .mount(&server)
            .await;

        let service = test_service(&server);
        let sid = service
            .send_sms("+447700900123", "slot available")
            .await
            .unwrap();
        assert_eq!(sid, "SM1");
    }

    #[tokio::test]
    async fn non_success_status_becomes_sms_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "bad credentials" })),
            )
            .mount(&server)
            .await;

        let service = test_service(&server);
        let err = service.send_sms("+447700900123", "hi").await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("401"), "unexpected error: {text}");
    }
}
