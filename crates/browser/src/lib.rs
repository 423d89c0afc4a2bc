//! Browser automation capability for the attendance portal
//!
//! The orchestrator only talks to the traits in [`engine`]. The production
//! implementation drives a headless Chromium over CDP via `chromiumoxide`;
//! the `fake` feature adds a scripted in-memory portal for tests.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use browser::{BrowserEngine, ChromiumEngine, LaunchConfig};
//!
//! # async fn demo() -> browser::Result<()> {
//! let engine = ChromiumEngine::new();
//! let mut session = engine.launch(&LaunchConfig::local()).await?;
//! let page = session.new_page().await?;
//!
//! page.goto("http://example.com").await?;
//! page.wait_for_selector("h1", Duration::from_secs(5)).await?;
//! let heading = page.read_text("h1").await?;
//! println!("{heading:?}");
//!
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod chromium;
pub mod config;
pub mod engine;
pub mod error;
#[cfg(any(test, feature = "fake"))]
pub mod fake;

pub use chromium::ChromiumEngine;
pub use config::{LaunchConfig, LaunchPreset};
pub use engine::{BrowserEngine, BrowserSession, PortalPage};
pub use error::{BrowserError, Result};
