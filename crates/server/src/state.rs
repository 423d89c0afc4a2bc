use std::sync::Arc;

use browser::{BrowserEngine, ChromiumEngine};
use orchestrator::{ConfigError, ScrapeOrchestrator};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ScrapeOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: ScrapeOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Build state around `engine` using the portal and browser settings from `config`
    pub fn with_engine(
        engine: Arc<dyn BrowserEngine>,
        config: &AppConfig,
    ) -> Result<Self, ConfigError> {
        let orchestrator = ScrapeOrchestrator::new(
            engine,
            config.portal.clone(),
            config.browser.launch_config(),
        )?;
        Ok(Self::new(orchestrator))
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Self::with_engine(Arc::new(ChromiumEngine::new()), config)
    }
}
