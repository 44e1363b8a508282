//! Configuration management for ropenet
//!
//! Environment-based configuration with defaults, TOML files, validation and
//! runtime feature flags.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

mod error;
mod feature_flags;

pub use error::ConfigError;
pub use feature_flags::{FeatureFlags, FeatureManager};

const ENV_PREFIX: &str = "ROPENET";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store configuration
    pub store: StoreConfig,

    /// Notification generator configuration
    pub generator: GeneratorConfig,

    /// Boundary server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Feature flags
    pub features: FeatureFlags,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Instance made active when the store starts
    pub default_instance: String,

    /// Lowest id the allocator may issue; raised above seed ids if needed
    pub first_id: u64,

    /// Events buffered per subscriber before it starts lagging
    pub event_capacity: usize,

    /// Experience granted by a daily check-in
    pub check_in_experience: u64,

    /// Reputation granted by a daily check-in
    pub check_in_reputation: i64,
}

/// Notification generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Time between synthetic notifications
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Delay before a generated notification is marked read
    #[serde(with = "humantime_serde")]
    pub auto_read_after: Duration,
}

/// Boundary server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Graceful shutdown timeout
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_instance: crate::store::seed::LOCAL_INSTANCE.to_string(),
            first_id: 1000,
            event_capacity: 256,
            check_in_experience: 100,
            check_in_reputation: 10,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(15), auto_read_after: Duration::from_secs(5) }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3001)),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json_format: false, with_target: true }
    }
}

fn env_var(section: &str, key: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{section}_{key}")).ok()
}

fn parse_var<T>(section: &str, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(section, key) {
        Some(raw) => raw.parse().map(Some).map_err(|e| {
            ConfigError::InvalidValue(format!(
                "{ENV_PREFIX}_{section}_{key}={raw}: {e}"
            ))
        }),
        None => Ok(None),
    }
}

fn parse_duration_var(section: &str, key: &str) -> Result<Option<Duration>, ConfigError> {
    match env_var(section, key) {
        Some(raw) => humantime_serde::re::humantime::parse_duration(&raw).map(Some).map_err(|e| {
            ConfigError::InvalidValue(format!("{ENV_PREFIX}_{section}_{key}={raw}: {e}"))
        }),
        None => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: ROPENET_<SECTION>_<KEY>
    /// Example: ROPENET_SERVER_BIND_ADDRESS=0.0.0.0:3001
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `ROPENET_*` variables that are set
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Store
        if let Some(instance) = env_var("STORE", "DEFAULT_INSTANCE") {
            self.store.default_instance = instance;
        }
        if let Some(first_id) = parse_var("STORE", "FIRST_ID")? {
            self.store.first_id = first_id;
        }
        if let Some(capacity) = parse_var("STORE", "EVENT_CAPACITY")? {
            self.store.event_capacity = capacity;
        }
        if let Some(exp) = parse_var("STORE", "CHECK_IN_EXPERIENCE")? {
            self.store.check_in_experience = exp;
        }
        if let Some(rep) = parse_var("STORE", "CHECK_IN_REPUTATION")? {
            self.store.check_in_reputation = rep;
        }

        // Generator
        if let Some(interval) = parse_duration_var("GENERATOR", "INTERVAL")? {
            self.generator.interval = interval;
        }
        if let Some(delay) = parse_duration_var("GENERATOR", "AUTO_READ_AFTER")? {
            self.generator.auto_read_after = delay;
        }

        // Server
        if let Some(addr) = parse_var("SERVER", "BIND_ADDRESS")? {
            self.server.bind_address = addr;
        }
        if let Some(timeout) = parse_duration_var("SERVER", "SHUTDOWN_TIMEOUT")? {
            self.server.shutdown_timeout = timeout;
        }

        // Logging
        if let Some(level) = env_var("LOGGING", "LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = parse_var("LOGGING", "JSON_FORMAT")? {
            self.logging.json_format = json;
        }

        // Features
        if let Some(dedup) = parse_var("FEATURES", "REACTION_DEDUP")? {
            self.features.reaction_dedup = dedup;
        }
        if let Some(enabled) = parse_var("FEATURES", "NOTIFICATION_GENERATOR")? {
            self.features.notification_generator = enabled;
        }
        if let Some(enabled) = parse_var("FEATURES", "AUTO_READ_NOTIFICATIONS")? {
            self.features.auto_read_notifications = enabled;
        }

        Ok(())
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.default_instance.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "default_instance must not be empty".to_string(),
            ));
        }

        if self.store.first_id == 0 {
            return Err(ConfigError::ValidationFailed(
                "first_id must be greater than 0".to_string(),
            ));
        }

        if self.store.event_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "event_capacity must be greater than 0".to_string(),
            ));
        }

        if self.generator.interval.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "generator interval must be greater than 0".to_string(),
            ));
        }

        if self.generator.auto_read_after.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "auto_read_after must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.first_id, 1000);
        assert_eq!(config.generator.interval, Duration::from_secs(15));
        assert_eq!(config.generator.auto_read_after, Duration::from_secs(5));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.store.first_id = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.generator.interval = Duration::ZERO;
        assert!(config.validate().is_err());

        config = Config::default();
        config.store.default_instance = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = Config::default();

        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ropenet.toml");

        let mut config = Config::default();
        config.generator.interval = Duration::from_secs(30);
        config.features.reaction_dedup = true;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.generator.interval, Duration::from_secs(30));
        assert!(loaded.features.reaction_dedup);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("interval = \"30s\""));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[generator]\ninterval = \"2m\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.generator.interval, Duration::from_secs(120));
        assert_eq!(config.generator.auto_read_after, Duration::from_secs(5));
        assert_eq!(config.store.first_id, 1000);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[store\nfirst_id = 1").unwrap();

        assert!(matches!(Config::from_file(&path), Err(ConfigError::ParseError(_))));
        assert!(matches!(
            Config::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::FileReadError(_))
        ));
    }
}
