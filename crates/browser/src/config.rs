use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Executables probed on `PATH` when no explicit path is configured
const CHROME_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

/// Named launch profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchPreset {
    /// Developer machine with a regular Chrome/Chromium install
    #[default]
    Local,
    /// Constrained container or function runtime
    Serverless,
}

/// Configuration for browser instances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Run browser in headless mode
    pub headless: bool,

    /// Pass `--no-sandbox`; needed when running as root inside containers
    pub no_sandbox: bool,

    /// Explicit browser binary; probed on `PATH` when unset
    pub executable: Option<PathBuf>,

    /// Browser window size
    pub window_size: (u32, u32),

    /// CDP request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Additional Chrome flags
    pub args: Vec<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self::local()
    }
}

impl LaunchConfig {
    pub fn local() -> Self {
        Self {
            headless: true,
            no_sandbox: false,
            executable: None,
            window_size: (1280, 800),
            request_timeout_ms: 30_000,
            args: vec![],
        }
    }

    /// Flags for runtimes without `/dev/shm`, a GPU or a user namespace
    pub fn serverless() -> Self {
        Self {
            no_sandbox: true,
            args: vec![
                "--disable-dev-shm-usage".to_string(),
                "--disable-gpu".to_string(),
                "--single-process".to_string(),
                "--no-zygote".to_string(),
            ],
            ..Self::local()
        }
    }

    pub fn from_preset(preset: LaunchPreset) -> Self {
        match preset {
            LaunchPreset::Local => Self::local(),
            LaunchPreset::Serverless => Self::serverless(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Configured executable, falling back to the first known browser on `PATH`.
    /// `None` lets the engine use its own detection.
    pub fn resolve_executable(&self) -> Option<PathBuf> {
        if let Some(path) = &self.executable {
            return Some(path.clone());
        }
        CHROME_CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
    }
}
