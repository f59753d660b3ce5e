use std::time::Duration;

use browser_client::{Browser, BrowserError, BrowserFactory, Element};
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::scan_types::ScanError;
use crate::site::{self, SlotSite};

/// Wait bounds for the login flow.
#[derive(Debug, Clone)]
pub struct SessionTiming {
    /// How long to wait for the login form before concluding the session is
    /// already authenticated.
    pub login_form_wait: Duration,

    /// Pause between interstitial prompt clicks.
    pub prompt_click_pause: Duration,

    /// Settle time after submitting credentials.
    pub post_login_settle: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            login_form_wait: Duration::from_secs(10),
            prompt_click_pause: Duration::from_secs(1),
            post_login_settle: Duration::from_secs(5),
        }
    }
}

/// Owns the authenticated session lifecycle against the retail site.
///
/// Holds the process's single browser client exclusively, plus the factory
/// used to rebuild it when the underlying session dies.
pub struct SessionManager {
    browser: Box<dyn Browser>,
    factory: Box<dyn BrowserFactory>,
    credentials: Credentials,
    site: SlotSite,
    timing: SessionTiming,
}

impl SessionManager {
    /// Creates a manager with a freshly built browser client.
    pub async fn new(
        factory: Box<dyn BrowserFactory>,
        credentials: Credentials,
        site: SlotSite,
        timing: Option<SessionTiming>,
    ) -> Result<Self, ScanError> {
        let browser = factory.create().await?;
        Ok(Self {
            browser,
            factory,
            credentials,
            site,
            timing: timing.unwrap_or_default(),
        })
    }

    /// The exclusively-owned browser client.
    pub fn browser(&self) -> &dyn Browser {
        self.browser.as_ref()
    }

    /// Probes the login page for the current session state.
    ///
    /// The login form appearing within the bounded wait means the session is
    /// logged out; the wait timing out means the page redirected away and
    /// the session is authenticated. The polarity is a proxy signal for
    /// authentication, held as a tested property rather than trusted state,
    /// and is re-checked every cycle.
    pub async fn is_logged_in(&self) -> Result<bool, ScanError> {
        self.browser.navigate(&self.site.login_url()).await?;
        match self
            .browser
            .wait_for_element(site::LOGIN_USERNAME, self.timing.login_form_wait)
            .await
        {
            Ok(_) => Ok(false),
            Err(BrowserError::WaitTimeout { .. }) => Ok(true),
            Err(err) => Err(err.into()),
        }
    }

    /// Performs the login flow with the configured credentials.
    ///
    /// Fails with [`ScanError::Auth`] when required form controls are
    /// absent, or when the login form survives the submit (credentials
    /// rejected).
    pub async fn login(&self) -> Result<(), ScanError> {
        info!("logging in to {}", self.site.login_url());
        self.browser.navigate(&self.site.login_url()).await?;

        let username = self.required_control(site::LOGIN_USERNAME).await?;
        self.browser.clear(&username).await?;
        self.browser
            .send_keys(&username, &self.credentials.email)
            .await?;

        let password = self.required_control(site::LOGIN_PASSWORD).await?;
        self.browser.clear(&password).await?;
        self.browser
            .send_keys(&password, &self.credentials.password)
            .await?;

        let submit = self.required_control(site::LOGIN_SUBMIT).await?;
        self.browser.click(&submit).await?;

        self.dismiss_prompts().await?;
        tokio::time::sleep(self.timing.post_login_settle).await;

        // The form surviving the submit means the site did not accept it.
        match self.browser.find_element(site::LOGIN_USERNAME).await {
            Ok(_) => Err(ScanError::Auth(
                "login form still present after submit".to_string(),
            )),
            Err(BrowserError::NoSuchElement(_)) => {
                info!("login complete");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Guarantees an authenticated session before a scan pass.
    ///
    /// A dead session from either the probe or the login is recovered by
    /// rebuilding the client from scratch and retrying the login once.
    pub async fn ensure_logged_in(&mut self) -> Result<(), ScanError> {
        let probe = self.is_logged_in().await;
        let logged_in = match probe {
            Ok(logged_in) => logged_in,
            Err(ScanError::SessionDead) => return self.recover().await,
            Err(err) => return Err(err),
        };

        if logged_in {
            debug!("session already authenticated");
            return Ok(());
        }

        let login = self.login().await;
        match login {
            Err(ScanError::SessionDead) => self.recover().await,
            other => other,
        }
    }

    /// Discards the dead client, builds a fresh one, and logs in again.
    pub async fn recover(&mut self) -> Result<(), ScanError> {
        warn!("browser session is dead, rebuilding the client");

        if let Err(err) = self.browser.quit().await {
            debug!("quit of dead session failed: {err}");
        }

        self.browser = self.factory.create().await?;
        self.login().await
    }

    async fn required_control(&self, selector: &str) -> Result<Element, ScanError> {
        match self.browser.find_element(selector).await {
            Ok(element) => Ok(element),
            Err(BrowserError::NoSuchElement(_)) => Err(ScanError::Auth(format!(
                "login control `{selector}` not found"
            ))),
            Err(err) => Err(err.into()),
        }
    }

    /// Clicks through cookie banners and similar interstitial prompts,
    /// pausing briefly between clicks.
    async fn dismiss_prompts(&self) -> Result<(), ScanError> {
        for prompt in self.browser.find_elements(site::CONSENT_PROMPTS).await? {
            match self.browser.click(&prompt).await {
                Ok(()) => {}
                // prompt already dismissed
                Err(BrowserError::NoSuchElement(_)) => continue,
                Err(err) => return Err(err.into()),
            }
            tokio::time::sleep(self.timing.prompt_click_pause).await;
        }
        Ok(())
    }
}
