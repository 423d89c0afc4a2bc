//! The login-and-read sequence against the attendance portal.

use std::sync::Arc;
use std::time::Instant;

use attendance_core::{Credential, ProgressEvent, ScrapeOutcome};
use browser::{BrowserEngine, BrowserError, LaunchConfig, PortalPage};
use events::ProgressSink;
use tracing::{debug, error, info, warn};

use crate::config::ScrapeConfig;
use crate::error::{ConfigError, ScrapeError};
use crate::probe::{probe_text, Probe};
use crate::session::SessionGuard;

/// Runs one scrape attempt per [`run`](Self::run) call.
///
/// Holds no per-attempt state, so a single instance can be shared across
/// requests; each call launches and owns its own browser session.
pub struct ScrapeOrchestrator {
    engine: Arc<dyn BrowserEngine>,
    config: ScrapeConfig,
    launch: LaunchConfig,
    login_url: String,
}

impl ScrapeOrchestrator {
    pub fn new(
        engine: Arc<dyn BrowserEngine>,
        config: ScrapeConfig,
        launch: LaunchConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let login_url = config.login_url()?;
        Ok(Self {
            engine,
            config,
            launch,
            login_url,
        })
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Drive the portal for `credential`, reporting each step to `sink`.
    ///
    /// Always returns exactly one outcome and never emits after returning. The
    /// browser session is released on every path before this resolves; if the
    /// future is dropped mid-flight the session guard aborts it instead.
    pub async fn run(&self, credential: &Credential, sink: &dyn ProgressSink) -> ScrapeOutcome {
        let started = Instant::now();
        let mut guard = None;

        let outcome = match self.drive(&mut guard, credential, sink).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(username = %credential, "Scrape failed: {}", err);
                // Nobody is listening after a transport fault.
                if !err.is_transport() {
                    if let Err(e) = sink
                        .emit(ProgressEvent::new(format!("Error during scraping: {err}")))
                        .await
                    {
                        warn!("Could not report scrape failure: {}", e);
                    }
                }
                if let Some(guard) = guard.as_mut() {
                    if let Err(e) = guard.release().await {
                        warn!("Browser release after failure did not complete: {}", e);
                    }
                }
                ScrapeOutcome::Faulted {
                    message: format!("Scraping failed for {credential}: {err}"),
                }
            }
        };

        info!(
            username = %credential,
            outcome = outcome.as_str(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scrape attempt finished"
        );
        outcome
    }

    async fn drive(
        &self,
        slot: &mut Option<SessionGuard>,
        credential: &Credential,
        sink: &dyn ProgressSink,
    ) -> Result<ScrapeOutcome, ScrapeError> {
        let locators = &self.config.locators;

        // 1. Browser session
        step(sink, "Launching browser...").await?;
        let guard = slot.insert(SessionGuard::acquire(self.engine.as_ref(), &self.launch).await?);
        let page = guard.session_mut()?.new_page().await?;

        // 2. Login page
        step(sink, "Navigating to login page...").await?;
        self.navigate(page.as_ref()).await?;

        // 3. Username
        step(sink, "Filling in username...").await?;
        self.wait_for(page.as_ref(), &locators.username_field).await?;
        page.type_text(&locators.username_field, credential.username())
            .await?;

        // 4. Next
        step(sink, "Clicking next button...").await?;
        page.click(&locators.next_button).await?;

        // 5. Unknown registration numbers get a warning label instead of the password form
        step(sink, "Checking for warnings...").await?;
        match probe_text(
            page.as_ref(),
            &locators.warning_label,
            self.config.warning_timeout(),
        )
        .await?
        {
            Probe::Found(reason) => {
                info!(username = %credential, reason = %reason, "Portal rejected credential");
                step(sink, format!("Error: {reason}")).await?;
                guard.release().await?;
                return Ok(ScrapeOutcome::Rejected { reason });
            }
            Probe::Empty | Probe::TimedOut => {
                step(sink, "Username valid, continuing...").await?;
            }
        }

        // 6. Password is the registration number as well
        step(sink, "Filling in password...").await?;
        self.wait_for(page.as_ref(), &locators.password_field).await?;
        page.type_text(&locators.password_field, credential.password())
            .await?;

        // 7. Submit
        step(sink, "Submitting form...").await?;
        page.click(&locators.submit_button).await?;

        // 8. Student area
        step(sink, "Waiting for main student page...").await?;
        self.wait_for(page.as_ref(), &locators.student_main_link)
            .await?;
        step(sink, "Clicking student main link...").await?;
        page.click(&locators.student_main_link).await?;

        // 9. Name
        step(sink, "Waiting for student name...").await?;
        let student_name = self
            .read_label(page.as_ref(), &locators.student_name_label, "Student name")
            .await?;

        // 10. Percentage
        step(sink, "Waiting for total percentage...").await?;
        let total_percentage = self
            .read_label(
                page.as_ref(),
                &locators.total_percentage_label,
                "Total percentage",
            )
            .await?;

        // 11. Summary
        step(
            sink,
            format!("Student Name: {student_name}, Total Percentage: {total_percentage}"),
        )
        .await?;

        // 12. Release
        step(sink, "Closing browser...").await?;
        guard.release().await?;

        // 13. Done
        Ok(ScrapeOutcome::Success {
            student_name,
            total_percentage,
        })
    }

    async fn navigate(&self, page: &dyn PortalPage) -> Result<(), BrowserError> {
        let timeout = self.config.step_timeout();
        match tokio::time::timeout(timeout, page.goto(&self.login_url)).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::Navigation(format!(
                "{}: no response after {}ms",
                self.login_url,
                timeout.as_millis()
            ))),
        }
    }

    async fn wait_for(&self, page: &dyn PortalPage, selector: &str) -> Result<(), BrowserError> {
        page.wait_for_selector(selector, self.config.step_timeout())
            .await
    }

    async fn read_label(
        &self,
        page: &dyn PortalPage,
        selector: &str,
        field: &'static str,
    ) -> Result<String, ScrapeError> {
        self.wait_for(page, selector).await?;
        match page.read_text(selector).await? {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ScrapeError::EmptyField(field)),
        }
    }
}

async fn step(sink: &dyn ProgressSink, message: impl Into<String>) -> Result<(), ScrapeError> {
    let event = ProgressEvent::new(message);
    debug!(step = %event.message, "Scrape step");
    sink.emit(event).await?;
    Ok(())
}
