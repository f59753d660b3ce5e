use std::env;
use std::fmt;
use std::time::Duration;

use browser_client::WebDriverConfig;

use crate::scan_types::{Location, ScanError, SearchWindow};
use crate::site::SlotSite;

/// Account credentials for the retail site.
#[derive(Clone)]
pub struct Credentials {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Message-provider settings and recipient lists.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Twilio account SID.
    pub twilio_account_sid: String,
    /// Twilio auth token.
    pub twilio_auth_token: String,
    /// Sender phone number for outbound SMS.
    pub twilio_from_number: String,
    /// Phone numbers to alert. Never empty.
    pub phone_numbers: Vec<String>,
    /// SendGrid API key; absent disables the email channel.
    pub sendgrid_api_key: Option<String>,
    /// Sender address for outbound email.
    pub from_email: String,
    /// Email addresses to alert; may be empty.
    pub email_recipients: Vec<String>,
}

/// Immutable process configuration, read once at startup and passed into
/// the component constructors.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Retail-site account credentials.
    pub credentials: Credentials,
    /// Stores scanned for collection slots, in scan order.
    pub locations: Vec<Location>,
    /// Day offsets each scan pass covers.
    pub window: SearchWindow,
    /// Delivery slot groups queried per date, in scan order.
    pub delivery_slot_groups: Vec<u32>,
    /// Postcode passed on collection queries; may be empty.
    pub postcode: String,
    /// Wall-clock interval between scheduler ticks.
    pub poll_interval: Duration,
    /// Browser automation settings.
    pub webdriver: WebDriverConfig,
    /// Notification settings.
    pub notify: NotifyConfig,
}

impl AppConfig {
    /// Reads configuration from process environment variables.
    ///
    /// Missing required keys are a fatal startup error.
    pub fn from_env() -> Result<Self, ScanError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ScanError> {
        let require = |key: &str| {
            get(key).ok_or_else(|| ScanError::Config(format!("{key} environment variable not set")))
        };

        let credentials = Credentials {
            email: require("TESCO_EMAIL")?,
            password: require("TESCO_PASSWORD")?,
        };

        let phone_numbers = split_list(&require("PHONE_NUMBERS")?);
        if phone_numbers.is_empty() {
            return Err(ScanError::Config(
                "PHONE_NUMBERS must list at least one recipient".to_string(),
            ));
        }

        let notify = NotifyConfig {
            twilio_account_sid: require("TWILIO_ACCOUNT_SID")?,
            twilio_auth_token: require("TWILIO_AUTH_TOKEN")?,
            twilio_from_number: require("TWILIO_FROM_NUMBER")?,
            phone_numbers,
            sendgrid_api_key: get("SENDGRID_API_KEY"),
            from_email: get("FROM_EMAIL")
                .unwrap_or_else(|| "tesco-notifier@example.com".to_string()),
            email_recipients: get("EMAIL_RECIPIENTS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
        };

        let locations = match get("LOCATIONS") {
            Some(raw) => parse_locations(&raw)?,
            None => default_locations(),
        };

        let window = match get("SCAN_WINDOW_DAYS") {
            Some(raw) => SearchWindow::new(parse_numbers("SCAN_WINDOW_DAYS", &raw)?),
            None => SearchWindow::default(),
        };

        let delivery_slot_groups = match get("DELIVERY_SLOT_GROUPS") {
            Some(raw) => parse_numbers("DELIVERY_SLOT_GROUPS", &raw)?,
            None => vec![4, 1],
        };

        let poll_interval = match get("POLL_INTERVAL_SECS") {
            Some(raw) => Duration::from_secs(parse_number("POLL_INTERVAL_SECS", &raw)?),
            None => Duration::from_secs(600),
        };

        let mut webdriver = WebDriverConfig::default();
        if let Some(url) = get("WEBDRIVER_URL") {
            webdriver.server_url = url;
        }
        webdriver.binary_path = get("CHROME_BINARY");
        if let Some(raw) = get("CHROME_HEADLESS") {
            webdriver.headless = raw.parse().map_err(|_| {
                ScanError::Config(format!("CHROME_HEADLESS is not a boolean: {raw}"))
            })?;
        }

        Ok(Self {
            credentials,
            locations,
            window,
            delivery_slot_groups,
            postcode: get("POSTCODE").unwrap_or_default(),
            poll_interval,
            webdriver,
            notify,
        })
    }

    /// Site adapter for the configured postcode.
    pub fn site(&self) -> SlotSite {
        SlotSite {
            postcode: self.postcode.clone(),
            ..SlotSite::default()
        }
    }
}

/// The built-in store table, used when `LOCATIONS` is not set.
fn default_locations() -> Vec<Location> {
    vec![
        Location::new("7268", "Banbridge"),
        Location::new("7615", "Craigavon"),
        Location::new("7214", "Lisburn"),
        Location::new("7275", "Newry"),
    ]
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_locations(raw: &str) -> Result<Vec<Location>, ScanError> {
    split_list(raw)
        .into_iter()
        .map(|entry| {
            entry
                .split_once(':')
                .map(|(id, name)| Location::new(id.trim(), name.trim()))
                .ok_or_else(|| {
                    ScanError::Config(format!("LOCATIONS entry is not `id:name`: {entry}"))
                })
        })
        .collect()
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ScanError> {
    raw.trim()
        .parse()
        .map_err(|_| ScanError::Config(format!("{key} is not a number: {raw}")))
}

fn parse_numbers<T: std::str::FromStr>(key: &str, raw: &str) -> Result<Vec<T>, ScanError> {
    split_list(raw)
        .into_iter()
        .map(|entry| parse_number(key, &entry))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn required_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("TESCO_EMAIL", "shopper@example.com"),
            ("TESCO_PASSWORD", "hunter2"),
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "token"),
            ("TWILIO_FROM_NUMBER", "+13103214290"),
            ("PHONE_NUMBERS", "+447700900123,+447700900456"),
        ])
    }

    fn config_from(vars: HashMap<&'static str, &'static str>) -> Result<AppConfig, ScanError> {
        AppConfig::from_lookup(|key| vars.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn required_keys_plus_defaults_build_a_config() {
        let config = config_from(required_vars()).unwrap();

        assert_eq!(config.locations.len(), 4);
        assert_eq!(config.locations[0].name, "Banbridge");
        assert_eq!(config.window, SearchWindow::default());
        assert_eq!(config.delivery_slot_groups, vec![4, 1]);
        assert_eq!(config.poll_interval, Duration::from_secs(600));
        assert_eq!(config.notify.phone_numbers.len(), 2);
        assert!(config.notify.sendgrid_api_key.is_none());
        assert!(config.webdriver.headless);
    }

    #[test]
    fn missing_required_key_is_fatal_and_named() {
        let mut vars = required_vars();
        vars.remove("TESCO_EMAIL");
        let err = config_from(vars).unwrap_err();
        assert!(err.to_string().contains("TESCO_EMAIL"), "got: {err}");
    }

    #[test]
    fn empty_phone_number_list_is_rejected() {
        let mut vars = required_vars();
        vars.insert("PHONE_NUMBERS", " , ");
        assert!(config_from(vars).is_err());
    }

    #[test]
    fn recipient_lists_are_split_and_trimmed() {
        let mut vars = required_vars();
        vars.insert("EMAIL_RECIPIENTS", " one@example.com , two@example.com ");
        let config = config_from(vars).unwrap();
        assert_eq!(
            config.notify.email_recipients,
            vec!["one@example.com", "two@example.com"]
        );
    }

    #[test]
    fn locations_override_is_parsed() {
        let mut vars = required_vars();
        vars.insert("LOCATIONS", "7268:Banbridge, 9999:Omagh");
        let config = config_from(vars).unwrap();
        assert_eq!(
            config.locations,
            vec![
                Location::new("7268", "Banbridge"),
                Location::new("9999", "Omagh"),
            ]
        );
    }

    #[test]
    fn malformed_location_entry_is_rejected() {
        let mut vars = required_vars();
        vars.insert("LOCATIONS", "7268");
        assert!(config_from(vars).is_err());
    }

    #[test]
    fn window_override_is_parsed() {
        let mut vars = required_vars();
        vars.insert("SCAN_WINDOW_DAYS", "3,0");
        let config = config_from(vars).unwrap();
        assert_eq!(config.window, SearchWindow::new(vec![0, 3]));
    }

    #[test]
    fn credentials_debug_redacts_the_password() {
        let config = config_from(required_vars()).unwrap();
        let rendered = format!("{:?}", config.credentials);
        assert!(!rendered.contains("hunter2"));
    }
}
