//! Scripted in-memory portal for tests.
//!
//! Elements are declared up front with their text and render delay. Every call
//! is recorded so tests can assert on the exact action sequence and on how
//! often the session was released.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::config::LaunchConfig;
use crate::engine::{BrowserEngine, BrowserSession, PortalPage};
use crate::error::{BrowserError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Launch,
    NewPage,
    Goto(String),
    Wait(String),
    Type { selector: String, text: String },
    Click(String),
    Read(String),
    Close,
    Abort,
}

#[derive(Debug, Clone)]
struct FakeElement {
    text: Option<String>,
    delay: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct PortalScript {
    elements: HashMap<String, FakeElement>,
    navigation_error: Option<String>,
    launch_error: Option<String>,
    hang_on: Option<String>,
}

impl PortalScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(self, selector: impl Into<String>, text: impl Into<String>) -> Self {
        self.delayed_element(selector, text, Duration::ZERO)
    }

    /// Element that renders after `delay`.
    pub fn delayed_element(
        mut self,
        selector: impl Into<String>,
        text: impl Into<String>,
        delay: Duration,
    ) -> Self {
        self.elements.insert(
            selector.into(),
            FakeElement {
                text: Some(text.into()),
                delay,
            },
        );
        self
    }

    /// Element that renders without any text content.
    pub fn blank_element(mut self, selector: impl Into<String>) -> Self {
        self.elements.insert(
            selector.into(),
            FakeElement {
                text: None,
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn failing_navigation(mut self, message: impl Into<String>) -> Self {
        self.navigation_error = Some(message.into());
        self
    }

    pub fn failing_launch(mut self, message: impl Into<String>) -> Self {
        self.launch_error = Some(message.into());
        self
    }

    /// Waiting for `selector` never resolves; used to exercise cancellation.
    pub fn hanging_on(mut self, selector: impl Into<String>) -> Self {
        self.hang_on = Some(selector.into());
        self
    }
}

#[derive(Debug, Default)]
struct Recorder {
    actions: Mutex<Vec<Action>>,
    launches: AtomicUsize,
    close_calls: AtomicUsize,
    abort_calls: AtomicUsize,
    releases: AtomicUsize,
}

impl Recorder {
    fn record(&self, action: Action) {
        self.actions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(action);
    }
}

#[derive(Debug, Clone)]
pub struct FakeEngine {
    script: Arc<PortalScript>,
    recorder: Arc<Recorder>,
}

impl FakeEngine {
    pub fn new(script: PortalScript) -> Self {
        Self {
            script: Arc::new(script),
            recorder: Arc::new(Recorder::default()),
        }
    }

    pub fn actions(&self) -> Vec<Action> {
        self.recorder
            .actions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn launches(&self) -> usize {
        self.recorder.launches.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.recorder.close_calls.load(Ordering::SeqCst)
    }

    pub fn abort_calls(&self) -> usize {
        self.recorder.abort_calls.load(Ordering::SeqCst)
    }

    /// Number of times a live session was actually torn down.
    pub fn releases(&self) -> usize {
        self.recorder.releases.load(Ordering::SeqCst)
    }

    pub fn typed_into(&self, selector: &str) -> bool {
        self.actions()
            .iter()
            .any(|a| matches!(a, Action::Type { selector: s, .. } if s == selector))
    }
}

#[async_trait]
impl BrowserEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn launch(&self, _config: &LaunchConfig) -> Result<Box<dyn BrowserSession>> {
        self.recorder.record(Action::Launch);
        if let Some(message) = &self.script.launch_error {
            return Err(BrowserError::Launch(message.clone()));
        }
        self.recorder.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            script: Arc::clone(&self.script),
            recorder: Arc::clone(&self.recorder),
            open: true,
        }))
    }
}

struct FakeSession {
    script: Arc<PortalScript>,
    recorder: Arc<Recorder>,
    open: bool,
}

impl FakeSession {
    fn release(&mut self) {
        if self.open {
            self.open = false;
            self.recorder.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn new_page(&mut self) -> Result<Box<dyn PortalPage>> {
        if !self.open {
            return Err(BrowserError::SessionClosed);
        }
        self.recorder.record(Action::NewPage);
        Ok(Box::new(FakePage {
            script: Arc::clone(&self.script),
            recorder: Arc::clone(&self.recorder),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        self.recorder.record(Action::Close);
        self.recorder.close_calls.fetch_add(1, Ordering::SeqCst);
        self.release();
        Ok(())
    }

    fn abort(&mut self) {
        self.recorder.record(Action::Abort);
        self.recorder.abort_calls.fetch_add(1, Ordering::SeqCst);
        self.release();
    }
}

struct FakePage {
    script: Arc<PortalScript>,
    recorder: Arc<Recorder>,
}

impl FakePage {
    fn element(&self, selector: &str) -> Result<&FakeElement> {
        self.script
            .elements
            .get(selector)
            .ok_or_else(|| BrowserError::ElementNotFound(selector.to_string()))
    }
}

#[async_trait]
impl PortalPage for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.recorder.record(Action::Goto(url.to_string()));
        match &self.script.navigation_error {
            Some(message) => Err(BrowserError::Navigation(format!("{url}: {message}"))),
            None => Ok(()),
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.recorder.record(Action::Wait(selector.to_string()));
        if self.script.hang_on.as_deref() == Some(selector) {
            std::future::pending::<()>().await;
        }
        match self.script.elements.get(selector) {
            Some(element) if element.delay <= timeout => {
                sleep(element.delay).await;
                Ok(())
            }
            _ => {
                sleep(timeout).await;
                Err(BrowserError::timeout(selector, timeout))
            }
        }
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        self.recorder.record(Action::Type {
            selector: selector.to_string(),
            text: text.to_string(),
        });
        self.element(selector).map(|_| ())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.recorder.record(Action::Click(selector.to_string()));
        self.element(selector).map(|_| ())
    }

    async fn read_text(&self, selector: &str) -> Result<Option<String>> {
        self.recorder.record(Action::Read(selector.to_string()));
        self.element(selector).map(|e| e.text.clone())
    }
}
