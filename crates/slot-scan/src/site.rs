use crate::scan_types::{Fulfillment, SlotQuery};

/// CSS selector for the login username field.
pub const LOGIN_USERNAME: &str = "#username";

/// CSS selector for the login password field.
pub const LOGIN_PASSWORD: &str = "#password";

/// CSS selector for the login submit control.
pub const LOGIN_SUBMIT: &str = "#signin-button";

/// CSS selector for interstitial/consent prompt buttons (cookie banners and
/// similar) presented around login.
pub const CONSENT_PROMPTS: &str = "button.ui-component__button";

/// CSS selector for an available-slot affordance on a slots page.
pub const AVAILABLE_SLOT: &str = ".available-slot--button";

/// URL adapter for the target retail site.
///
/// Query URLs are deterministic templates over date, location and slot
/// group, reproduced against the site's live scheme.
#[derive(Debug, Clone)]
pub struct SlotSite {
    /// Base URL of the account/login host.
    pub secure_base: String,
    /// Base URL of the shopping host.
    pub shop_base: String,
    /// Postcode passed on collection queries; may be empty.
    pub postcode: String,
}

impl Default for SlotSite {
    fn default() -> Self {
        Self {
            secure_base: "https://secure.tesco.com".to_string(),
            shop_base: "https://www.tesco.com".to_string(),
            postcode: String::new(),
        }
    }
}

impl SlotSite {
    /// Login page URL.
    pub fn login_url(&self) -> String {
        format!("{}/account/en-GB/login", self.secure_base)
    }

    /// Undated slots landing page, visited once before the dated queries.
    pub fn slots_landing_url(&self) -> String {
        format!("{}/groceries/en-GB/slots/collection", self.shop_base)
    }

    /// Search URL for one (date, channel) combination.
    pub fn query_url(&self, query: &SlotQuery) -> String {
        let date = query.date.format("%Y-%m-%d");
        match &query.fulfillment {
            Fulfillment::Collection { location } => format!(
                "{}/groceries/en-GB/slots/collection/{date}?locationId={}&postcode={}&slotGroup=4",
                self.shop_base,
                location.id,
                urlencoding::encode(&self.postcode),
            ),
            Fulfillment::Delivery { slot_group } => format!(
                "{}/groceries/en-GB/slots/delivery/{date}?slotGroup={slot_group}",
                self.shop_base,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan_types::Location;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 4, 25).unwrap()
    }

    #[test]
    fn login_url_matches_site_scheme() {
        assert_eq!(
            SlotSite::default().login_url(),
            "https://secure.tesco.com/account/en-GB/login"
        );
    }

    #[test]
    fn collection_url_matches_site_scheme() {
        let query = SlotQuery {
            date: date(),
            fulfillment: Fulfillment::Collection {
                location: Location::new("7268", "Banbridge"),
            },
        };
        assert_eq!(
            SlotSite::default().query_url(&query),
            "https://www.tesco.com/groceries/en-GB/slots/collection/2020-04-25?locationId=7268&postcode=&slotGroup=4"
        );
    }

    #[test]
    fn delivery_url_matches_site_scheme() {
        let query = SlotQuery {
            date: date(),
            fulfillment: Fulfillment::Delivery { slot_group: 4 },
        };
        assert_eq!(
            SlotSite::default().query_url(&query),
            "https://www.tesco.com/groceries/en-GB/slots/delivery/2020-04-25?slotGroup=4"
        );
    }

    #[test]
    fn postcode_is_percent_encoded() {
        let site = SlotSite {
            postcode: "BT32 3LN".to_string(),
            ..SlotSite::default()
        };
        let query = SlotQuery {
            date: date(),
            fulfillment: Fulfillment::Collection {
                location: Location::new("7214", "Lisburn"),
            },
        };
        assert!(site.query_url(&query).contains("postcode=BT32%203LN"));
    }
}
