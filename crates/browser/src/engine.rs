//! Capability traits the orchestrator drives.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::LaunchConfig;
use crate::error::Result;

/// Starts browser sessions.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Get the name of the engine backend
    fn name(&self) -> &'static str;

    async fn launch(&self, config: &LaunchConfig) -> Result<Box<dyn BrowserSession>>;
}

/// One running browser owned by a single scrape attempt.
#[async_trait]
pub trait BrowserSession: Send {
    async fn new_page(&mut self) -> Result<Box<dyn PortalPage>>;

    /// Shut the browser down. Calling this more than once is a no-op.
    async fn close(&mut self) -> Result<()>;

    /// Synchronous best-effort teardown for drop and cancellation paths
    /// where `close` cannot be awaited. Also idempotent.
    fn abort(&mut self);
}

/// A tab on the portal.
#[async_trait]
pub trait PortalPage: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;

    /// Fails with [`BrowserError::Timeout`](crate::BrowserError::Timeout) when
    /// the selector does not match within `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;

    async fn type_text(&self, selector: &str, text: &str) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    async fn read_text(&self, selector: &str) -> Result<Option<String>>;
}
