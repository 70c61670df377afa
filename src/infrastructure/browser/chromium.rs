//! Chromium-backed page fetcher using chromiumoxide.
//!
//! Every query runs as a page script, so the view only depends on
//! `Page::evaluate` and navigation.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use super::traits::{PageElement, PageSession, PageView};
use crate::shared::config::ScrapeSettings;
use crate::shared::errors::ScrapeError;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Quote a value as a JavaScript string literal
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Run a page load under one deadline covering every stage of it
async fn bounded_navigation<F, E>(url: &str, timeout_after: Duration, load: F) -> Result<(), ScrapeError>
where
    F: std::future::Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    match timeout(timeout_after, load).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ScrapeError::Navigation(format!("{url}: {e}"))),
        Err(_) => Err(ScrapeError::FetchTimeout {
            what: format!("navigation to {url}"),
            timeout_ms: timeout_after.as_millis() as u64,
        }),
    }
}

/// One headless Chromium shared by every view of a run
pub struct ChromiumSession {
    browser: Mutex<Browser>,
    open_count: Arc<AtomicUsize>,
}

impl ChromiumSession {
    /// Launch Chromium with the configured user agent
    pub async fn launch(settings: &ScrapeSettings) -> Result<Self, ScrapeError> {
        let mut builder = BrowserConfig::builder();
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &settings.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={}", settings.user_agent))
            .build()
            .map_err(|e| ScrapeError::Browser(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Browser(format!("failed to launch Chromium: {e}")))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler event error: {e}");
                }
            }
        });

        info!("🌐 Chromium session started");
        Ok(Self {
            browser: Mutex::new(browser),
            open_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn open_view(&self) -> Result<Box<dyn PageView>, ScrapeError> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::Browser(format!("failed to open page: {e}")))?;

        self.open_count.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(ChromiumView {
            page,
            open_count: Arc::clone(&self.open_count),
        }))
    }

    fn open_views(&self) -> usize {
        self.open_count.load(Ordering::Relaxed)
    }

    async fn shutdown(&self) -> Result<(), ScrapeError> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| ScrapeError::Browser(format!("failed to close browser: {e}")))?;
        if let Err(e) = browser.wait().await {
            warn!("Chromium did not exit cleanly: {e}");
        }
        info!("🛑 Chromium session closed");
        Ok(())
    }
}

/// One Chromium tab
pub struct ChromiumView {
    page: Page,
    open_count: Arc<AtomicUsize>,
}

impl ChromiumView {
    async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T, ScrapeError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScrapeError::Script(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| ScrapeError::Script(format!("unexpected script result: {e:?}")))
    }
}

#[async_trait]
impl PageView for ChromiumView {
    async fn navigate(&mut self, url: &str, timeout_after: Duration) -> Result<(), ScrapeError> {
        let page = &self.page;
        let load = async move {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<(), CdpError>(())
        };
        bounded_navigation(url, timeout_after, load).await
    }

    async fn wait_for_element(&self, locator: &str, timeout_after: Duration) -> Result<(), ScrapeError> {
        let script = format!("document.querySelector({}) !== null", js_string(locator));
        let deadline = Instant::now() + timeout_after;

        loop {
            if self.eval::<bool>(&script).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::ElementNotFound(locator.to_string()));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn query_text(&self, locator: &str) -> Result<Option<String>, ScrapeError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.innerText : null; }})()",
            js_string(locator)
        );
        self.eval(&script).await
    }

    async fn query_all(&self, locator: &str) -> Result<Vec<PageElement>, ScrapeError> {
        let script = format!(
            r#"(() => Array.from(document.querySelectorAll({})).map(el => {{
                const style = window.getComputedStyle(el);
                const rect = el.getBoundingClientRect();
                return {{
                    text: el.innerText || el.textContent || "",
                    value: (el.value === undefined || el.value === null) ? null : String(el.value),
                    visible: style.display !== "none" && style.visibility !== "hidden" && rect.width > 0 && rect.height > 0
                }};
            }}))()"#,
            js_string(locator)
        );

        #[derive(serde::Deserialize)]
        struct RawElement {
            text: String,
            value: Option<String>,
            visible: bool,
        }

        let raw: Vec<RawElement> = self.eval(&script).await?;
        Ok(raw
            .into_iter()
            .enumerate()
            .map(|(index, el)| PageElement {
                locator: locator.to_string(),
                index,
                text: el.text,
                value: el.value,
                visible: el.visible,
            })
            .collect())
    }

    async fn click(&self, element: &PageElement) -> Result<(), ScrapeError> {
        let script = format!(
            "(() => {{ const el = document.querySelectorAll({})[{}]; if (!el) return false; el.click(); return true; }})()",
            js_string(&element.locator),
            element.index
        );
        if self.eval::<bool>(&script).await? {
            Ok(())
        } else {
            Err(ScrapeError::ElementNotFound(format!(
                "{}[{}]",
                element.locator, element.index
            )))
        }
    }

    async fn evaluate_script(&self, script: &str) -> Result<serde_json::Value, ScrapeError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScrapeError::Script(e.to_string()))?;
        // scripts that return `undefined` come back without a value
        Ok(result.into_value().unwrap_or(serde_json::Value::Null))
    }

    async fn page_text(&self) -> Result<String, ScrapeError> {
        self.eval("document.body ? document.body.innerText : \"\"").await
    }

    async fn close(self: Box<Self>) -> Result<(), ScrapeError> {
        let view = *self;
        view.open_count.fetch_sub(1, Ordering::Relaxed);
        view.page
            .close()
            .await
            .map_err(|e| ScrapeError::Browser(format!("failed to close page: {e}")))
    }
}
