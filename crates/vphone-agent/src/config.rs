//! Agent configuration loaded from TOML.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub sensors: SensorConfig,
}

/// Network and runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            log_level: default_log_level(),
        }
    }
}

/// Sensor relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Depth of the ordered sample queue before dispatch backpressures.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            queue_depth: default_queue_depth(),
        }
    }
}

fn default_port() -> u16 {
    8001
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_queue_depth() -> usize {
    64
}

/// Load configuration from the given path, or the default location.
pub fn load_config(path: Option<&str>) -> Result<Config, AgentError> {
    let config_path = match path {
        Some(p) => PathBuf::from(p),
        None => default_config_path(),
    };

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| AgentError::Config(format!("failed to read config: {e}")))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| AgentError::Config(format!("failed to parse config: {e}")))?;
        tracing::info!(path = %config_path.display(), "loaded config");
        Ok(config)
    } else {
        tracing::info!("no config file found, using defaults");
        Ok(Config::default())
    }
}

/// Get the default config directory path.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("vphone")
}

fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}
