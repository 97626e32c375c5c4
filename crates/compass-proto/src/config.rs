use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Where the analysis service lives and how we talk to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_analyze_url")]
    pub analyze_url: String,
    /// Probe `GET /health` once at startup.
    #[serde(default = "default_health_check")]
    pub health_check: bool,
    /// Per-request timeout in seconds.  0 = wait forever.
    #[serde(default)]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// mpv volume for preview snippets, 0–100.
    #[serde(default = "default_volume")]
    pub volume: u8,
    /// Skip the mpv shipped next to the executable and use PATH only.
    #[serde(default)]
    pub use_system_mpv: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub mouse: bool,
    #[serde(default = "default_true")]
    pub show_keys_bar: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            analyze_url: default_analyze_url(),
            health_check: default_health_check(),
            timeout_secs: 0,
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            use_system_mpv: false,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            mouse: true,
            show_keys_bar: true,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn default_analyze_url() -> String {
    "http://127.0.0.1:8000/analyze".to_string()
}

fn default_health_check() -> bool {
    true
}

fn default_volume() -> u8 {
    70
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load the default config file, writing one with defaults on first run.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            preview: PreviewConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.analyze_url, "http://127.0.0.1:8000/analyze");
        assert!(config.backend.health_check);
        assert_eq!(config.backend.timeout(), None);
        assert_eq!(config.preview.volume, 70);
        assert!(config.ui.mouse);
        assert!(Config::config_path().ends_with("sonic-compass/config.toml"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [backend]
            analyze_url = "http://10.0.0.5:9000/analyze"
            timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.analyze_url, "http://10.0.0.5:9000/analyze");
        assert_eq!(config.backend.timeout(), Some(Duration::from_secs(30)));
        assert!(config.backend.health_check);
        assert_eq!(config.preview.volume, 70);
        assert!(config.ui.show_keys_bar);
    }

    #[test]
    fn test_load_writes_defaults_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.preview.volume, 70);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.backend.analyze_url, config.backend.analyze_url);
    }
}
