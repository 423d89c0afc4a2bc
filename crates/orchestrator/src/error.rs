use browser::BrowserError;
use events::TransportFault;
use thiserror::Error;

/// Why an attempt aborted. Converted to `ScrapeOutcome::Faulted` at the
/// orchestrator boundary; never crosses it as an error.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    Transport(#[from] TransportFault),

    #[error("{0} rendered without any text")]
    EmptyField(&'static str),
}

impl ScrapeError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Portal URL must start with http:// or https://, got '{0}'")]
    InvalidPortalUrl(String),

    #[error("Locator for {0} must not be empty")]
    EmptyLocator(&'static str),
}
