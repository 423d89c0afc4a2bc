//! `chromiumoxide`-backed engine.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::config::LaunchConfig;
use crate::engine::{BrowserEngine, BrowserSession, PortalPage};
use crate::error::{BrowserError, Result};

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Default)]
pub struct ChromiumEngine;

impl ChromiumEngine {
    pub fn new() -> Self {
        Self
    }

    /// Build chromiumoxide launch options from our config
    fn build_browser_config(config: &LaunchConfig) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.window_size.0, config.window_size.1)
            .request_timeout(config.request_timeout())
            .args(config.args.clone());

        if !config.headless {
            builder = builder.with_head();
        }
        if config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(executable) = config.resolve_executable() {
            debug!(executable = %executable.display(), "Using browser executable");
            builder = builder.chrome_executable(executable);
        }

        builder.build().map_err(BrowserError::Configuration)
    }
}

#[async_trait]
impl BrowserEngine for ChromiumEngine {
    fn name(&self) -> &'static str {
        "chromium"
    }

    async fn launch(&self, config: &LaunchConfig) -> Result<Box<dyn BrowserSession>> {
        let browser_config = Self::build_browser_config(config)?;

        let (browser, handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // The CDP connection only makes progress while the handler is polled.
        let handler_task = tokio::spawn(async move {
            let errors = pump_handler(handler).await;
            debug!(errors, "CDP handler stream ended");
        });

        Ok(Box::new(ChromiumSession {
            browser: Some(browser),
            handler_task: Some(handler_task),
        }))
    }
}

/// Poll the CDP event stream until it ends. Errors are not fatal: unknown
/// events from newer Chrome builds surface here and later commands still work.
async fn pump_handler<S, T, E>(mut events: S) -> usize
where
    S: Stream<Item = std::result::Result<T, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut errors = 0;
    while let Some(event) = events.next().await {
        if let Err(e) = event {
            errors += 1;
            warn!("chromiumoxide handler event error: {}", e);
        }
    }
    errors
}

pub struct ChromiumSession {
    browser: Option<Browser>,
    handler_task: Option<JoinHandle<()>>,
}

impl ChromiumSession {
    fn browser(&self) -> Result<&Browser> {
        self.browser.as_ref().ok_or(BrowserError::SessionClosed)
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn new_page(&mut self) -> Result<Box<dyn PortalPage>> {
        let page = self
            .browser()?
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::PageCreation(e.to_string()))?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };

        let result = match browser.close().await {
            Ok(_) => {
                if let Err(e) = browser.wait().await {
                    warn!("Browser process did not exit cleanly: {}", e);
                }
                Ok(())
            }
            Err(e) => Err(BrowserError::Engine(e.to_string())),
        };

        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        result
    }

    fn abort(&mut self) {
        // Dropping the Browser kills the child process.
        if self.browser.take().is_some() {
            warn!("Browser session aborted without a graceful close");
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.abort();
    }
}

struct ChromiumPage {
    page: Page,
}

/// The websocket to the browser is gone; no later poll can succeed.
fn is_connection_lost(err: &CdpError) -> bool {
    matches!(
        err,
        CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse
    )
}

fn map_element_error(selector: &str, err: CdpError) -> BrowserError {
    match err {
        CdpError::NotFound | CdpError::Chrome(_) => {
            BrowserError::ElementNotFound(selector.to_string())
        }
        CdpError::Timeout => BrowserError::Engine(format!("CDP request timed out on {selector}")),
        other => BrowserError::Engine(other.to_string()),
    }
}

/// `textContent` is `null` for documents and doctypes, a string otherwise.
fn text_content(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(text) => Some(text),
        _ => None,
    }
}

#[async_trait]
impl PortalPage for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation(format!("{url}: {e}")))?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.page.find_element(selector).await {
                Ok(_) => return Ok(()),
                Err(e) if is_connection_lost(&e) => {
                    return Err(BrowserError::Engine(e.to_string()));
                }
                // Not rendered yet.
                Err(_) => {}
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::timeout(selector, timeout));
            }
            sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| map_element_error(selector, e))?;
        element
            .click()
            .await
            .map_err(|e| map_element_error(selector, e))?;
        element
            .type_str(text)
            .await
            .map_err(|e| map_element_error(selector, e))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| map_element_error(selector, e))?;
        element
            .click()
            .await
            .map_err(|e| map_element_error(selector, e))?;
        Ok(())
    }

    async fn read_text(&self, selector: &str) -> Result<Option<String>> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| map_element_error(selector, e))?;
        let returns = element
            .call_js_fn("function() { return this.textContent; }", false)
            .await
            .map_err(|e| map_element_error(selector, e))?;
        Ok(text_content(returns.result.value))
    }
}
