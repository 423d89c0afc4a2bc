use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

/// Errors that can occur during browser operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrowserError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Browser configuration error: {0}")]
    Configuration(String),

    #[error("Page creation failed: {0}")]
    PageCreation(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timeout waiting for {selector} after {timeout_ms}ms")]
    Timeout { selector: String, timeout_ms: u64 },

    #[error("Browser engine error: {0}")]
    Engine(String),

    #[error("Browser session already closed")]
    SessionClosed,
}

impl BrowserError {
    pub fn timeout(selector: impl Into<String>, timeout: std::time::Duration) -> Self {
        Self::Timeout {
            selector: selector.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
