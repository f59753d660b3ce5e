//! # Browser Client
//!
//! Browser automation capability consumed by the slot watcher. The scanner
//! and session manager only see the [`Browser`] trait; the concrete
//! implementation drives a Chrome instance over the W3C WebDriver protocol.

/// WebDriver wire-protocol implementation of the automation surface.
mod webdriver;
pub use webdriver::{WebDriverClient, WebDriverConfig, WebDriverFactory};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Handle to a DOM element located by a [`Browser`].
///
/// The `id` is an opaque reference understood only by the client that
/// produced it; handles from a quit or rebuilt client are worthless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Opaque element reference.
    pub id: String,
}

/// Errors surfaced by the browser automation layer.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The underlying driver session handle is no longer valid. Recoverable
    /// only by discarding the client and building a fresh one.
    #[error("browser session is no longer valid")]
    SessionDead,

    /// Navigation or wire-protocol transport failed.
    #[error("browser transport error: {0}")]
    Transport(String),

    /// No element matched the selector.
    #[error("no element matched `{0}`")]
    NoSuchElement(String),

    /// The wait deadline passed without the selector matching anything.
    #[error("timed out after {timeout:?} waiting for `{selector}`")]
    WaitTimeout {
        /// Selector that never matched.
        selector: String,
        /// Bound that was exceeded.
        timeout: Duration,
    },

    /// The driver answered with something the client could not interpret.
    #[error("unexpected driver response: {0}")]
    Protocol(String),
}

/// Capability surface of an authenticated browsing session.
///
/// One exclusively-owned instance backs the whole process; it is never
/// shared across logical flows.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Loads the given URL in the current session.
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    /// Finds the first element matching a CSS selector.
    async fn find_element(&self, selector: &str) -> Result<Element, BrowserError>;

    /// Finds all elements matching a CSS selector; absent elements yield an
    /// empty vector, not an error.
    async fn find_elements(&self, selector: &str) -> Result<Vec<Element>, BrowserError>;

    /// Polls for the selector until it matches or the timeout elapses.
    async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Element, BrowserError>;

    /// Polls until at least one element matches or the timeout elapses.
    /// A successful return is never empty.
    async fn wait_for_elements(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Element>, BrowserError>;

    /// Clicks an element.
    async fn click(&self, element: &Element) -> Result<(), BrowserError>;

    /// Clears the value of a form field.
    async fn clear(&self, element: &Element) -> Result<(), BrowserError>;

    /// Types text into a form field.
    async fn send_keys(&self, element: &Element, text: &str) -> Result<(), BrowserError>;

    /// Reads an element's rendered text.
    async fn text(&self, element: &Element) -> Result<String, BrowserError>;

    /// Tears the session down. Quitting an already-dead session is allowed
    /// to fail; callers discard the client either way.
    async fn quit(&self) -> Result<(), BrowserError>;
}

/// Builds fresh [`Browser`] instances.
///
/// The session manager keeps a factory alongside the live client so a dead
/// session can be replaced from scratch mid-run.
#[async_trait]
pub trait BrowserFactory: Send + Sync {
    /// Creates a new browser session.
    async fn create(&self) -> Result<Box<dyn Browser>, BrowserError>;
}
