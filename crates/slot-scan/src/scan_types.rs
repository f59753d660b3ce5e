use browser_client::BrowserError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A store location eligible for collection slots.
///
/// The set of locations is fixed at startup; there is no lifecycle beyond
/// static configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Provider-side location identifier.
    pub id: String,
    /// Display name used in notifications.
    pub name: String,
}

impl Location {
    /// Convenience constructor.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Day offsets from "today" that each scan pass covers.
///
/// Offsets are sorted ascending and de-duplicated at construction, so a scan
/// pass always walks the window from nearest to farthest date. Dates are
/// resolved fresh each pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchWindow {
    offsets: Vec<i64>,
}

impl SearchWindow {
    /// Builds a window from day offsets, normalizing order and duplicates.
    pub fn new(mut offsets: Vec<i64>) -> Self {
        offsets.sort_unstable();
        offsets.dedup();
        Self { offsets }
    }

    /// Resolves the window against a concrete "today".
    pub fn dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        self.offsets
            .iter()
            .map(|&offset| today + chrono::Duration::days(offset))
            .collect()
    }
}

impl Default for SearchWindow {
    fn default() -> Self {
        Self::new(vec![0, 7, 14])
    }
}

/// Fulfillment channels offered by the retailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fulfillment {
    /// Order picked up at a specific store.
    Collection {
        /// Store the order would be collected from.
        location: Location,
    },
    /// Home delivery; not location-scoped.
    Delivery {
        /// Provider-specific delivery tier parameter.
        slot_group: u32,
    },
}

/// One (date, channel) combination submitted against the remote search
/// space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotQuery {
    /// Date the slot would fall on.
    pub date: NaiveDate,
    /// Channel (and its scope parameter) being queried.
    pub fulfillment: Fulfillment,
}

/// Outcome of a single slot query. Transient; discarded after evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotResult {
    /// No slot rendered within the bounded wait. The normal outcome.
    Unavailable,
    /// At least one slot rendered.
    Available {
        /// Display text of the selected slot, e.g. a time window.
        description: String,
    },
}

/// The alert raised the first time any slot is seen.
///
/// At most one of these is dispatched per process lifetime; after dispatch
/// the process exits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotFound {
    /// Channel the slot was found on.
    pub fulfillment: Fulfillment,
    /// Date of the slot.
    pub date: NaiveDate,
    /// Display text captured from the slot affordance.
    pub description: String,
}

impl SlotFound {
    /// Channel label for messages.
    pub fn channel_label(&self) -> &'static str {
        match self.fulfillment {
            Fulfillment::Collection { .. } => "Collection",
            Fulfillment::Delivery { .. } => "Delivery",
        }
    }

    /// Where the slot applies: the store name for collection, the literal
    /// "Home Delivery" otherwise.
    pub fn place(&self) -> &str {
        match &self.fulfillment {
            Fulfillment::Collection { location } => &location.name,
            Fulfillment::Delivery { .. } => "Home Delivery",
        }
    }
}

/// Custom error type for scan operations.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Navigation or wire transport failed mid-scan. Aborts the current
    /// scan pass; the next tick retries from scratch.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The automation session handle is dead. Recoverable only by
    /// rebuilding the client and logging in again.
    #[error("browser session is dead")]
    SessionDead,

    /// Login form interaction failed or credentials were rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Required configuration missing or malformed. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<BrowserError> for ScanError {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::SessionDead => ScanError::SessionDead,
            other => ScanError::Transport(other.to_string()),
        }
    }
}
