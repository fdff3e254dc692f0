use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub poller: PollerConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PollerConfig {
    #[serde(default = "default_poll_interval_seconds")]
    pub interval_seconds: u64,

    #[serde(default = "default_poll_max_attempts")]
    pub max_attempts: u32,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_timeout_seconds() -> u64 {
    45
}
fn default_poll_interval_seconds() -> u64 {
    4
}
fn default_poll_max_attempts() -> u32 {
    12
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_poll_interval_seconds(),
            max_attempts: default_poll_max_attempts(),
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Config {
    /// Loads `config.yml` from the working directory, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = Path::new("config.yml");
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Path::new("config.yml"))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.gateway.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.gateway.timeout(), Duration::from_secs(45));
        assert_eq!(config.poller.interval(), Duration::from_secs(4));
        assert_eq!(config.poller.max_attempts, 12);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "gateway:\n  base_url: http://gw.internal:9000\n";
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.gateway.base_url, "http://gw.internal:9000");
        assert_eq!(config.gateway.timeout_seconds, 45);
        assert_eq!(config.poller.max_attempts, 12);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");

        let mut config = Config::default();
        config.gateway.base_url = "http://10.0.0.5:8000".to_string();
        config.poller.interval_seconds = 2;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.gateway.base_url, "http://10.0.0.5:8000");
        assert_eq!(loaded.poller.interval_seconds, 2);
        assert_eq!(loaded.poller.max_attempts, 12);
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "gateway: [not, a, map]").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
