use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::locators::PortalLocators;

pub const DEFAULT_PORTAL_URL: &str = "http://43.250.40.63";
pub const DEFAULT_LOGIN_PATH: &str = "Login.aspx";
pub const DEFAULT_WARNING_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_STEP_TIMEOUT_MS: u64 = 30_000;

/// Where the portal lives and how long each step may take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Portal origin, e.g. `http://43.250.40.63`
    pub base_url: String,
    /// Login page relative to `base_url`
    pub login_path: String,
    /// Budget for the invalid-username warning to render
    pub warning_timeout_ms: u64,
    /// Budget for every other wait and for navigation
    pub step_timeout_ms: u64,
    pub locators: PortalLocators,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PORTAL_URL.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            warning_timeout_ms: DEFAULT_WARNING_TIMEOUT_MS,
            step_timeout_ms: DEFAULT_STEP_TIMEOUT_MS,
            locators: PortalLocators::default(),
        }
    }
}

impl ScrapeConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn warning_timeout(&self) -> Duration {
        Duration::from_millis(self.warning_timeout_ms)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub fn login_url(&self) -> Result<String, ConfigError> {
        let base = self.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidPortalUrl(self.base_url.clone()));
        }
        Ok(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            self.login_path.trim_start_matches('/')
        ))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.login_url()?;
        self.locators.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_login_url() {
        assert_eq!(
            ScrapeConfig::default().login_url().unwrap(),
            "http://43.250.40.63/Login.aspx"
        );
    }

    #[test]
    fn test_login_url_joins_slashes() {
        let config = ScrapeConfig {
            login_path: "/portal/Login.aspx".to_string(),
            ..ScrapeConfig::default().with_base_url("https://campus.example/")
        };
        assert_eq!(
            config.login_url().unwrap(),
            "https://campus.example/portal/Login.aspx"
        );
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = ScrapeConfig::default().with_base_url("43.250.40.63");
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidPortalUrl("43.250.40.63".to_string()))
        );
    }

    #[test]
    fn test_timeouts() {
        let config = ScrapeConfig::default();
        assert_eq!(config.warning_timeout(), Duration::from_millis(2000));
        assert_eq!(config.step_timeout(), Duration::from_secs(30));
    }
}
