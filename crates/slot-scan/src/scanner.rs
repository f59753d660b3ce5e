use std::time::Duration;

use browser_client::{Browser, BrowserError};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::scan_types::{
    Fulfillment, Location, ScanError, SearchWindow, SlotFound, SlotQuery, SlotResult,
};
use crate::site::{self, SlotSite};

/// Bounded wait for slot affordances to render on a query page.
const SLOT_WAIT: Duration = Duration::from_secs(5);

/// Executes one scan pass over the search space and reports the first
/// available slot.
///
/// Iteration order is date-major then location-major: for each date in the
/// window (ascending), every location's collection query in configured
/// order, then each configured delivery slot group. The order is
/// deterministic; the first hit short-circuits all remaining queries.
pub struct SlotScanner {
    locations: Vec<Location>,
    window: SearchWindow,
    delivery_slot_groups: Vec<u32>,
    site: SlotSite,
}

impl SlotScanner {
    /// Creates a scanner over the given search space.
    pub fn new(
        locations: Vec<Location>,
        window: SearchWindow,
        delivery_slot_groups: Vec<u32>,
        site: SlotSite,
    ) -> Self {
        Self {
            locations,
            window,
            delivery_slot_groups,
            site,
        }
    }

    /// Runs one scan pass with the window resolved against today's date.
    pub async fn scan(&self, browser: &dyn Browser) -> Result<Option<SlotFound>, ScanError> {
        self.scan_from(browser, Utc::now().date_naive()).await
    }

    /// Runs one scan pass with the window resolved against an explicit
    /// "today", so the search space is fully deterministic.
    pub async fn scan_from(
        &self,
        browser: &dyn Browser,
        today: NaiveDate,
    ) -> Result<Option<SlotFound>, ScanError> {
        info!("scanning for slots");

        // Prime the slots section before issuing the dated queries.
        browser.navigate(&self.site.slots_landing_url()).await?;

        for date in self.window.dates(today) {
            for location in &self.locations {
                let query = SlotQuery {
                    date,
                    fulfillment: Fulfillment::Collection {
                        location: location.clone(),
                    },
                };
                if let Some(found) = self.check(browser, query).await? {
                    return Ok(Some(found));
                }
            }

            for &slot_group in &self.delivery_slot_groups {
                let query = SlotQuery {
                    date,
                    fulfillment: Fulfillment::Delivery { slot_group },
                };
                if let Some(found) = self.check(browser, query).await? {
                    return Ok(Some(found));
                }
            }
        }

        debug!("no slots available this pass");
        Ok(None)
    }

    async fn check(
        &self,
        browser: &dyn Browser,
        query: SlotQuery,
    ) -> Result<Option<SlotFound>, ScanError> {
        match self.query(browser, &query).await? {
            SlotResult::Unavailable => Ok(None),
            SlotResult::Available { description } => {
                let found = SlotFound {
                    fulfillment: query.fulfillment,
                    date: query.date,
                    description,
                };
                info!(
                    "found {} slot at {} on {}: {}",
                    found.channel_label(),
                    found.place(),
                    found.date,
                    found.description
                );
                Ok(Some(found))
            }
        }
    }

    /// One query against the remote search space.
    ///
    /// A wait timeout is the normal no-slot outcome, not an error. A
    /// navigation failure aborts the whole pass: mid-scan transport errors
    /// are a session-health signal, not a per-query miss.
    async fn query(
        &self,
        browser: &dyn Browser,
        query: &SlotQuery,
    ) -> Result<SlotResult, ScanError> {
        let url = self.site.query_url(query);
        debug!("querying {url}");
        browser.navigate(&url).await?;

        let slots = match browser.wait_for_elements(site::AVAILABLE_SLOT, SLOT_WAIT).await {
            Ok(slots) => slots,
            Err(BrowserError::WaitTimeout { .. }) => return Ok(SlotResult::Unavailable),
            Err(err) => return Err(err.into()),
        };

        // The site renders slots in chronological order; the last one is
        // taken as the representative option.
        let Some(slot) = slots.last() else {
            return Ok(SlotResult::Unavailable);
        };
        browser.click(slot).await?;
        let description = browser.text(slot).await?;

        Ok(SlotResult::Available { description })
    }
}
