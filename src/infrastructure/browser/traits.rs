use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::errors::ScrapeError;

/// One element matched by `PageView::query_all`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageElement {
    /// Locator the element was found with
    pub locator: String,
    /// Position among the locator's matches
    pub index: usize,
    /// Rendered text
    pub text: String,
    /// Underlying form-control value, if the element has one
    pub value: Option<String>,
    pub visible: bool,
}

/// Shared browsing session, read-only across concurrent evaluations
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Open an isolated view (tab) for one evaluation
    async fn open_view(&self) -> Result<Box<dyn PageView>, ScrapeError>;

    /// Number of views currently open
    fn open_views(&self) -> usize;

    /// Tear the session down
    async fn shutdown(&self) -> Result<(), ScrapeError>;
}

/// A single page instance owned by one evaluation
#[async_trait]
pub trait PageView: Send + Sync {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), ScrapeError>;

    /// Wait until `locator` matches something; `ElementNotFound` on timeout
    async fn wait_for_element(&self, locator: &str, timeout: Duration) -> Result<(), ScrapeError>;

    /// Text of the first match, `None` when nothing matches
    async fn query_text(&self, locator: &str) -> Result<Option<String>, ScrapeError>;

    async fn query_all(&self, locator: &str) -> Result<Vec<PageElement>, ScrapeError>;

    async fn click(&self, element: &PageElement) -> Result<(), ScrapeError>;

    async fn evaluate_script(&self, script: &str) -> Result<serde_json::Value, ScrapeError>;

    /// Visible text of the whole document
    async fn page_text(&self) -> Result<String, ScrapeError>;

    async fn close(self: Box<Self>) -> Result<(), ScrapeError>;
}
