//! Bounded wait with a fallback branch.
//!
//! Used where an element is expected to be *absent* on the happy path: running
//! out of time is an ordinary answer here, not an error.

use std::time::Duration;

use browser::{BrowserError, PortalPage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Rendered in time with non-empty (trimmed) text
    Found(String),
    /// Rendered in time but carries no text
    Empty,
    /// Never rendered within the budget
    TimedOut,
}

pub async fn probe_text(
    page: &dyn PortalPage,
    selector: &str,
    timeout: Duration,
) -> Result<Probe, BrowserError> {
    match page.wait_for_selector(selector, timeout).await {
        Ok(()) => {}
        Err(e) if e.is_timeout() => return Ok(Probe::TimedOut),
        Err(e) => return Err(e),
    }

    let text = match page.read_text(selector).await {
        Ok(text) => text,
        // Removed again between the wait and the read.
        Err(BrowserError::ElementNotFound(_)) => None,
        Err(e) => return Err(e),
    };

    Ok(match text.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Probe::Found(text.to_string()),
        _ => Probe::Empty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser::fake::{FakeEngine, PortalScript};
    use browser::{BrowserEngine, LaunchConfig};

    async fn probe(script: PortalScript) -> Result<Probe, BrowserError> {
        let engine = FakeEngine::new(script);
        let mut session = engine.launch(&LaunchConfig::local()).await?;
        let page = session.new_page().await?;
        probe_text(page.as_ref(), "#lblWarning", Duration::from_millis(2000)).await
    }

    #[tokio::test]
    async fn test_found_trims_text() {
        let result = probe(PortalScript::new().element("#lblWarning", "  Invalid Registration Number \n")).await;
        assert_eq!(result, Ok(Probe::Found("Invalid Registration Number".to_string())));
    }

    #[tokio::test]
    async fn test_blank_text_is_empty() {
        assert_eq!(probe(PortalScript::new().element("#lblWarning", "   ")).await, Ok(Probe::Empty));
        assert_eq!(probe(PortalScript::new().blank_element("#lblWarning")).await, Ok(Probe::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_branch() {
        assert_eq!(probe(PortalScript::new()).await, Ok(Probe::TimedOut));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_warning_counts_as_timeout() {
        let script = PortalScript::new().delayed_element(
            "#lblWarning",
            "Invalid Registration Number",
            Duration::from_millis(2500),
        );
        assert_eq!(probe(script).await, Ok(Probe::TimedOut));
    }
}
