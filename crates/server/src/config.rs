use std::path::{Path, PathBuf};

use browser::{LaunchConfig, LaunchPreset};
use orchestrator::ScrapeConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const CONFIG_DIR: &str = "attendance-scraper";
pub const CONFIG_FILE: &str = "config.toml";

pub const ENV_PORTAL_URL: &str = "PORTAL_URL";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";
pub const ENV_PORT: &str = "PORT";

/// Listener address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

/// Browser launch settings layered over a preset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    pub preset: LaunchPreset,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_sandbox: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
}

impl BrowserSection {
    /// Preset defaults with explicit settings applied on top. Extra args are
    /// appended to the preset's own flags.
    pub fn launch_config(&self) -> LaunchConfig {
        let mut launch = LaunchConfig::from_preset(self.preset);
        if let Some(headless) = self.headless {
            launch.headless = headless;
        }
        if let Some(no_sandbox) = self.no_sandbox {
            launch.no_sandbox = no_sandbox;
        }
        if self.executable.is_some() {
            launch.executable.clone_from(&self.executable);
        }
        launch.args.extend(self.args.iter().cloned());
        launch
    }
}

/// Application configuration stored in `<config_dir>/attendance-scraper/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub portal: ScrapeConfig,
    pub browser: BrowserSection,
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Read config from `path`, falling back to defaults
    pub fn read(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "Config file does not exist, using defaults");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    debug!(path = %path.display(), "Config loaded successfully");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                Self::default()
            }
        }
    }

    /// Read `path` or the default location, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::read(&path),
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from `lookup`; unparsable values are ignored with a warning
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_PORTAL_URL).filter(|v| !v.trim().is_empty()) {
            self.portal.base_url = url;
        }
        if let Some(executable) = lookup(ENV_CHROME_EXECUTABLE).filter(|v| !v.trim().is_empty()) {
            self.browser.executable = Some(PathBuf::from(executable));
        }
        if let Some(port) = lookup(ENV_PORT) {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(e) => warn!(value = %port, error = %e, "Ignoring invalid {}", ENV_PORT),
            }
        }
    }

    /// Write config to `path`, creating parent directories as needed
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        debug!(path = %path.display(), "Config saved successfully");
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:3001");
        assert_eq!(config.portal.base_url, "http://43.250.40.63");
        assert_eq!(config.browser.preset, LaunchPreset::Local);
    }

    #[test]
    fn test_config_read_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::read(&temp_dir.path().join(CONFIG_FILE));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_config_read_invalid_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[server\nport = ").unwrap();
        assert_eq!(AppConfig::read(&path), AppConfig::default());
    }

    #[test]
    fn test_config_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r##"
[server]
port = 8080

[portal]
base_url = "https://portal.example.edu"

[portal.locators]
warning_label = "#lblError"

[browser]
preset = "serverless"
args = ["--lang=en-US"]
"##,
        )
        .unwrap();

        let config = AppConfig::read(&path);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.portal.base_url, "https://portal.example.edu");
        assert_eq!(config.portal.login_path, "Login.aspx");
        assert_eq!(config.portal.locators.warning_label, "#lblError");
        assert_eq!(config.portal.locators.next_button, "#btnNext");

        let launch = config.browser.launch_config();
        assert!(launch.no_sandbox);
        assert!(launch.args.contains(&"--disable-dev-shm-usage".to_string()));
        assert_eq!(launch.args.last().map(String::as_str), Some("--lang=en-US"));
    }

    #[test]
    fn test_config_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE);

        let mut config = AppConfig::default();
        config.browser.headless = Some(false);
        config.write(&path).unwrap();

        assert_eq!(AppConfig::read(&path), config);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_PORTAL_URL, "http://10.0.0.5"),
            (ENV_CHROME_EXECUTABLE, "/opt/chrome/chrome"),
            (ENV_PORT, "9000"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.portal.base_url, "http://10.0.0.5");
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.browser.launch_config().executable,
            Some(PathBuf::from("/opt/chrome/chrome"))
        );
    }

    #[test]
    fn test_env_invalid_port_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(|key| (key == ENV_PORT).then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_explicit_settings_override_preset() {
        let section = BrowserSection {
            preset: LaunchPreset::Serverless,
            no_sandbox: Some(false),
            headless: Some(false),
            ..Default::default()
        };
        let launch = section.launch_config();
        assert!(!launch.no_sandbox);
        assert!(!launch.headless);
    }
}
