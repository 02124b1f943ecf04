//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::analyzer::AnalyzerConfig;
use crate::store::StoreConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Where the persisted aggregate lives
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("habitlens").to_string_lossy().to_string())
        .unwrap_or_else(|| "./habitlens_data".to_string())
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "habitlens=info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            analyzer: AnalyzerConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations, falling back to environment-only config
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("habitlens").join("config.toml")),
            Some(PathBuf::from("./habitlens.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(data_dir) = std::env::var("HABITLENS_DATA_DIR") {
            self.data_dir = data_dir;
        }
        if let Ok(level) = std::env::var("HABITLENS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("HABITLENS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store.max_insights, 50);
        assert_eq!(config.store.max_correlations, 20);
        assert_eq!(config.analyzer.min_correlation_samples, 7);
        assert!(config.logging.level.contains("info"));
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            data_dir = "/tmp/habitlens-test"

            [analyzer]
            correlation_threshold = 0.5

            [store]
            max_insights = 10
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.data_dir, "/tmp/habitlens-test");
        assert_eq!(config.analyzer.correlation_threshold, 0.5);
        // Unspecified fields keep their defaults.
        assert_eq!(config.analyzer.min_correlation_samples, 7);
        assert_eq!(config.store.max_insights, 10);
        assert_eq!(config.store.max_correlations, 20);
    }

    #[test]
    fn test_parse_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.store.max_insights, 50);
    }
}
