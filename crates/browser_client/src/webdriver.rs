use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::{Browser, BrowserError, BrowserFactory, Element};

/// W3C WebDriver key under which element references are returned.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Settings for the WebDriver-backed browser.
#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    /// Base URL of the WebDriver server (chromedriver).
    pub server_url: String,

    /// Path to the Chrome binary, when not discoverable by the driver.
    pub binary_path: Option<String>,

    /// User agent presented by the browser.
    pub user_agent: String,

    /// Whether to run the browser headless.
    pub headless: bool,

    /// Interval between element-lookup attempts inside a bounded wait.
    pub poll_interval: Duration,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:9515".to_string(),
            binary_path: None,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_3) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/81.0.4044.92 Safari/537.36"
                .to_string(),
            headless: true,
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// [`Browser`] implementation speaking the W3C WebDriver wire protocol.
pub struct WebDriverClient {
    http: Client,
    server_url: String,
    session_id: String,
    poll_interval: Duration,
}

impl WebDriverClient {
    /// Opens a new driver session against the configured server.
    pub async fn connect(config: &WebDriverConfig) -> Result<Self, BrowserError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| BrowserError::Transport(format!("failed to create HTTP client: {e}")))?;

        let mut args = vec![
            "--disable-gpu".to_string(),
            format!("--user-agent={}", config.user_agent),
        ];
        if config.headless {
            args.push("--headless=new".to_string());
        }

        let mut chrome_options = json!({ "args": args });
        if let Some(binary) = &config.binary_path {
            chrome_options["binary"] = json!(binary);
        }

        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": chrome_options,
                }
            }
        });

        let server_url = config.server_url.trim_end_matches('/').to_string();
        let response = http
            .post(format!("{server_url}/session"))
            .json(&body)
            .send()
            .await
            .map_err(|e| BrowserError::Transport(format!("session create failed: {e}")))?;

        let payload = read_payload(response).await?;
        let session_id = payload["sessionId"]
            .as_str()
            .ok_or_else(|| BrowserError::Protocol("new session reply missing sessionId".into()))?
            .to_string();

        info!("opened webdriver session {session_id}");

        Ok(Self {
            http,
            server_url,
            session_id,
            poll_interval: config.poll_interval,
        })
    }

    /// Issues one command against the current session and returns the
    /// `value` field of the reply.
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        let url = format!("{}/session/{}/{path}", self.server_url, self.session_id);
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BrowserError::Transport(e.to_string()))?;

        read_payload(response).await
    }

    fn element_path(element: &Element, command: &str) -> String {
        format!("element/{}/{command}", element.id)
    }
}

/// Checks the driver reply status and unwraps its `value` field, mapping
/// driver error codes onto the typed taxonomy.
async fn read_payload(response: reqwest::Response) -> Result<Value, BrowserError> {
    let status = response.status();
    let mut payload: Value = response
        .json()
        .await
        .map_err(|e| BrowserError::Protocol(format!("non-JSON driver response: {e}")))?;

    if status.is_success() {
        return Ok(payload["value"].take());
    }

    let code = payload["value"]["error"].as_str().unwrap_or("unknown error");
    let message = payload["value"]["message"].as_str().unwrap_or("");
    Err(map_wire_error(status, code, message))
}

fn map_wire_error(status: StatusCode, code: &str, message: &str) -> BrowserError {
    match code {
        "invalid session id" => BrowserError::SessionDead,
        "no such element" | "stale element reference" => {
            BrowserError::NoSuchElement(message.to_string())
        }
        _ => BrowserError::Protocol(format!("{status}: {code}: {message}")),
    }
}

fn parse_element(entry: &Value) -> Result<Element, BrowserError> {
    entry[ELEMENT_KEY]
        .as_str()
        .map(|id| Element { id: id.to_string() })
        .ok_or_else(|| BrowserError::Protocol(format!("malformed element reference: {entry}")))
}

#[async_trait]
impl Browser for WebDriverClient {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        debug!("navigating to {url}");
        self.command(Method::POST, "url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn find_element(&self, selector: &str) -> Result<Element, BrowserError> {
        let value = self
            .command(
                Method::POST,
                "element",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await
            .map_err(|err| match err {
                BrowserError::NoSuchElement(_) => BrowserError::NoSuchElement(selector.to_string()),
                other => other,
            })?;

        parse_element(&value)
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<Element>, BrowserError> {
        let value = self
            .command(
                Method::POST,
                "elements",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await?;

        let entries = value
            .as_array()
            .ok_or_else(|| BrowserError::Protocol("elements reply is not an array".into()))?;

        entries.iter().map(parse_element).collect()
    }

    async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Element, BrowserError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(BrowserError::NoSuchElement(_)) => {}
                Err(err) => return Err(err),
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::WaitTimeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn wait_for_elements(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Element>, BrowserError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let found = self.find_elements(selector).await?;
            if !found.is_empty() {
                return Ok(found);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::WaitTimeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn click(&self, element: &Element) -> Result<(), BrowserError> {
        self.command(
            Method::POST,
            &Self::element_path(element, "click"),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    async fn clear(&self, element: &Element) -> Result<(), BrowserError> {
        self.command(
            Method::POST,
            &Self::element_path(element, "clear"),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &Element, text: &str) -> Result<(), BrowserError> {
        self.command(
            Method::POST,
            &Self::element_path(element, "value"),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn text(&self, element: &Element) -> Result<String, BrowserError> {
        let value = self
            .command(Method::GET, &Self::element_path(element, "text"), None)
            .await?;

        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BrowserError::Protocol("element text reply is not a string".into()))
    }

    async fn quit(&self) -> Result<(), BrowserError> {
        let url = format!("{}/session/{}", self.server_url, self.session_id);
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| BrowserError::Transport(e.to_string()))?;

        read_payload(response).await?;
        info!("closed webdriver session {}", self.session_id);
        Ok(())
    }
}

/// [`BrowserFactory`] producing [`WebDriverClient`] sessions.
pub struct WebDriverFactory {
    config: WebDriverConfig,
}

impl WebDriverFactory {
    /// Creates a factory that opens sessions with the given settings.
    pub fn new(config: WebDriverConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserFactory for WebDriverFactory {
    async fn create(&self) -> Result<Box<dyn Browser>, BrowserError> {
        Ok(Box::new(WebDriverClient::connect(&self.config).await?))
    }
}
