//! In-memory page and alert fakes for application tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::infrastructure::alerts::{AlertSink, PriceDrop};
use crate::infrastructure::browser::{PageElement, PageSession, PageView};
use crate::shared::errors::{AlertError, ScrapeError};

#[derive(Debug, Clone)]
pub struct FakeControl {
    pub text: String,
    pub value: Option<String>,
    pub visible: bool,
}

impl FakeControl {
    pub fn visible(text: &str) -> Self {
        Self { text: text.to_string(), value: None, visible: true }
    }

    pub fn hidden(text: &str) -> Self {
        Self { text: text.to_string(), value: None, visible: false }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }
}

/// Canned content for one URL
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    texts: HashMap<String, String>,
    elements: HashMap<String, Vec<FakeControl>>,
    page_text: String,
    delay: Duration,
    navigate_error: Option<ScrapeError>,
    script_error: bool,
    panic_on_navigate: bool,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, locator: &str, text: &str) -> Self {
        self.texts.insert(locator.to_string(), text.to_string());
        self
    }

    pub fn with_elements(mut self, locator: &str, controls: Vec<FakeControl>) -> Self {
        self.elements.insert(locator.to_string(), controls);
        self
    }

    pub fn with_page_text(mut self, text: &str) -> Self {
        self.page_text = text.to_string();
        self
    }

    /// Navigation sleeps on the tokio clock
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_with(mut self, error: ScrapeError) -> Self {
        self.navigate_error = Some(error);
        self
    }

    pub fn with_broken_scripts(mut self) -> Self {
        self.script_error = true;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_navigate = true;
        self
    }
}

#[derive(Default)]
struct SessionState {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
    clicks: Mutex<Vec<PageElement>>,
}

/// Session serving `FakePage`s by URL and counting view lifecycles
#[derive(Clone, Default)]
pub struct FakeSession {
    pages: Arc<HashMap<String, FakePage>>,
    state: Arc<SessionState>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), page);
        self
    }

    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Highest number of views open at the same time
    pub fn peak(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }

    pub fn clicks(&self) -> Vec<PageElement> {
        self.state.clicks.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSession for FakeSession {
    async fn open_view(&self) -> Result<Box<dyn PageView>, ScrapeError> {
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(FakeView {
            pages: Arc::clone(&self.pages),
            state: Arc::clone(&self.state),
            current: None,
        }))
    }

    fn open_views(&self) -> usize {
        self.state.in_flight.load(Ordering::SeqCst)
    }

    async fn shutdown(&self) -> Result<(), ScrapeError> {
        Ok(())
    }
}

struct FakeView {
    pages: Arc<HashMap<String, FakePage>>,
    state: Arc<SessionState>,
    current: Option<FakePage>,
}

impl FakeView {
    fn page(&self) -> Result<&FakePage, ScrapeError> {
        self.current
            .as_ref()
            .ok_or_else(|| ScrapeError::Navigation("no page loaded".into()))
    }
}

#[async_trait]
impl PageView for FakeView {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), ScrapeError> {
        let page = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::Navigation(format!("unknown url {}", url)))?;
        if !page.delay.is_zero() {
            tokio::time::sleep(page.delay).await;
        }
        if page.panic_on_navigate {
            panic!("renderer crashed");
        }
        if let Some(err) = &page.navigate_error {
            return Err(err.clone());
        }
        self.current = Some(page);
        Ok(())
    }

    async fn wait_for_element(&self, locator: &str, _timeout: Duration) -> Result<(), ScrapeError> {
        let page = self.page()?;
        if page.texts.contains_key(locator) || page.elements.contains_key(locator) {
            Ok(())
        } else {
            Err(ScrapeError::ElementNotFound(locator.to_string()))
        }
    }

    async fn query_text(&self, locator: &str) -> Result<Option<String>, ScrapeError> {
        Ok(self.page()?.texts.get(locator).cloned())
    }

    async fn query_all(&self, locator: &str) -> Result<Vec<PageElement>, ScrapeError> {
        let controls = self.page()?.elements.get(locator).cloned().unwrap_or_default();
        Ok(controls
            .into_iter()
            .enumerate()
            .map(|(index, control)| PageElement {
                locator: locator.to_string(),
                index,
                text: control.text,
                value: control.value,
                visible: control.visible,
            })
            .collect())
    }

    async fn click(&self, element: &PageElement) -> Result<(), ScrapeError> {
        self.state.clicks.lock().unwrap().push(element.clone());
        Ok(())
    }

    async fn evaluate_script(&self, _script: &str) -> Result<serde_json::Value, ScrapeError> {
        if self.page()?.script_error {
            return Err(ScrapeError::Script("script blocked".into()));
        }
        Ok(serde_json::Value::from(0))
    }

    async fn page_text(&self) -> Result<String, ScrapeError> {
        Ok(self.page()?.page_text.clone())
    }

    async fn close(self: Box<Self>) -> Result<(), ScrapeError> {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Records every drop; optionally refuses delivery
#[derive(Default)]
pub struct RecordingAlertSink {
    pub drops: Mutex<Vec<PriceDrop>>,
    fail: bool,
}

impl RecordingAlertSink {
    pub fn failing() -> Self {
        Self { drops: Mutex::new(Vec::new()), fail: true }
    }

    pub fn delivered(&self) -> Vec<PriceDrop> {
        self.drops.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for RecordingAlertSink {
    async fn notify_price_drop(&self, drop: &PriceDrop) -> Result<(), AlertError> {
        self.drops.lock().unwrap().push(drop.clone());
        if self.fail {
            return Err(AlertError::Rejected(503));
        }
        Ok(())
    }
}
