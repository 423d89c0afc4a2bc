//! Scoped ownership of one browser session.

use browser::{BrowserEngine, BrowserError, BrowserSession, LaunchConfig};
use tracing::{debug, warn};

/// Owns the browser for one attempt.
///
/// `release` closes it gracefully and may be called any number of times. If the
/// guard is dropped while the session is still open (cancellation, panic, an
/// early return that skipped `release`) the session is aborted synchronously.
pub struct SessionGuard {
    session: Option<Box<dyn BrowserSession>>,
}

impl SessionGuard {
    pub async fn acquire(
        engine: &dyn BrowserEngine,
        config: &LaunchConfig,
    ) -> Result<Self, BrowserError> {
        let session = engine.launch(config).await?;
        debug!(engine = engine.name(), "Browser session acquired");
        Ok(Self {
            session: Some(session),
        })
    }

    pub fn session_mut(&mut self) -> Result<&mut (dyn BrowserSession + 'static), BrowserError> {
        self.session
            .as_deref_mut()
            .ok_or(BrowserError::SessionClosed)
    }

    pub async fn release(&mut self) -> Result<(), BrowserError> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        match session.close().await {
            Ok(()) => {
                debug!("Browser session released");
                Ok(())
            }
            Err(e) => {
                warn!("Graceful browser close failed, aborting: {}", e);
                session.abort();
                Err(e)
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            warn!("Browser session dropped while open, aborting");
            session.abort();
        }
    }
}
