use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::source::SimulationConfig;
use crate::tracking::TrackingConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    /// Without this section the service has no position source.
    #[serde(default)]
    pub simulation: Option<SimulationConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub base_folder: PathBuf,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_yaml("storage:\n  base_folder: /tmp/speed\n").unwrap();
        assert_eq!(config.web.bind, "0.0.0.0:8080");
        assert_eq!(config.storage.base_folder, PathBuf::from("/tmp/speed"));
        assert_eq!(config.tracking, TrackingConfig::default());
        assert!(config.simulation.is_none());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
web:
  bind: 127.0.0.1:9000
storage:
  base_folder: ./data
tracking:
  noise_threshold_mps: 0.8
  max_recordings: 10
simulation:
  coordinates: "48.8566,2.3522"
  speed_mps: 12.5
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.web.bind, "127.0.0.1:9000");
        assert_eq!(config.tracking.noise_threshold_mps, 0.8);
        assert_eq!(config.tracking.max_recordings, 10);
        assert_eq!(config.tracking.min_movement_m, 5.0);

        let simulation = config.simulation.unwrap();
        assert_eq!(simulation.speed_mps, 12.5);
        assert_eq!(simulation.jitter_m, 2.0);
    }

    #[test]
    fn test_missing_storage_is_an_error() {
        assert!(matches!(
            Config::from_yaml("web:\n  bind: 0.0.0.0:1\n"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
