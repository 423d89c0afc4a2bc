pub mod attempt;
pub mod config;
pub mod error;
pub mod locators;
pub mod probe;
pub mod scraper;
pub mod session;

pub use attempt::{drive_attempt, spawn_attempt, AttemptEnd};
pub use config::ScrapeConfig;
pub use error::{ConfigError, ScrapeError};
pub use locators::PortalLocators;
pub use probe::{probe_text, Probe};
pub use scraper::ScrapeOrchestrator;
pub use session::SessionGuard;
