//! Configuration settings for the obligo engine.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub reconcile: ReconcileConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("obligo.toml"),
            dirs::config_dir()
                .map(|p| p.join("obligo/config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".obligo/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.cache.enabled {
            if self.cache.ttl_secs == 0 {
                return Err(
                    ConfigError::Invalid("cache.ttl_secs must be > 0".to_string()).into(),
                );
            }
            if self.cache.max_entries == 0 {
                return Err(
                    ConfigError::Invalid("cache.max_entries must be > 0".to_string()).into(),
                );
            }
        }
        Ok(())
    }
}

/// Query result cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether query results are cached at all.
    pub enabled: bool,
    /// Seconds a cached result stays valid.
    pub ttl_secs: u64,
    /// Maximum number of cached query tuples.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 30,
            max_entries: 256,
        }
    }
}

/// Status self-healing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Run the correction pass automatically on every fresh receivable load.
    pub auto: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self { auto: true }
    }
}
