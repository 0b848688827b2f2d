//! Configuration management for waymark.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "waymark";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "journal.db";

/// Default preferences file name.
const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `WAYMARK_`)
/// 2. TOML config file at `~/.config/waymark/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Location tracking configuration.
    pub tracking: TrackingConfig,
    /// State aggregation configuration.
    pub aggregator: AggregatorConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/waymark/journal.db`
    pub database_path: Option<PathBuf>,
    /// Path to the preferences file.
    /// Defaults to `~/.local/share/waymark/preferences.json`
    pub preferences_path: Option<PathBuf>,
}

/// Location tracking configuration.
///
/// The acceptance thresholds are deliberately configuration rather than
/// contract: tune them per device class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Reject samples whose reported accuracy radius exceeds this, in meters.
    pub max_accuracy_m: f64,
    /// Reject samples closer than this to the last accepted point, in meters,
    /// unless `max_silence_secs` has elapsed.
    pub min_distance_m: f64,
    /// Accept a sample regardless of distance once this many seconds have
    /// passed since the last accepted point.
    pub max_silence_secs: u64,
    /// Capacity of the raw sample channel between a source and the recorder.
    pub sample_channel_capacity: usize,
}

/// State aggregation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// How long the aggregation pipeline keeps computing after its last
    /// subscriber disconnects, in milliseconds.
    pub grace_ms: u64,
    /// Lowest selectable year filter.
    pub year_min: i32,
    /// How many years past the current year the year filter may reach.
    pub year_horizon: i32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: 50.0,
            min_distance_m: 10.0,
            max_silence_secs: 60,
            sample_channel_capacity: 256,
        }
    }
}

impl TrackingConfig {
    /// Get the silence gate as a Duration.
    #[must_use]
    pub fn max_silence(&self) -> Duration {
        Duration::from_secs(self.max_silence_secs)
    }
}

impl AggregatorConfig {
    /// Get the grace window as a Duration.
    #[must_use]
    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            grace_ms: 5_000,
            year_min: 1970,
            year_horizon: 5,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `WAYMARK_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("WAYMARK_").split("_"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.tracking.max_accuracy_m <= 0.0 || !self.tracking.max_accuracy_m.is_finite() {
            return Err(Error::ConfigValidation {
                message: format!(
                    "max_accuracy_m must be a positive number, got {}",
                    self.tracking.max_accuracy_m
                ),
            });
        }

        if self.tracking.min_distance_m < 0.0 || !self.tracking.min_distance_m.is_finite() {
            return Err(Error::ConfigValidation {
                message: format!(
                    "min_distance_m must be non-negative, got {}",
                    self.tracking.min_distance_m
                ),
            });
        }

        if self.tracking.max_silence_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "max_silence_secs must be greater than 0".to_string(),
            });
        }

        if self.tracking.sample_channel_capacity == 0 {
            return Err(Error::ConfigValidation {
                message: "sample_channel_capacity must be greater than 0".to_string(),
            });
        }

        if self.aggregator.year_horizon < 0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "year_horizon must be non-negative, got {}",
                    self.aggregator.year_horizon
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the preferences file path, resolving defaults if not set.
    #[must_use]
    pub fn preferences_path(&self) -> PathBuf {
        self.storage
            .preferences_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(PREFERENCES_FILE_NAME))
    }

    /// Get the silence gate as a Duration.
    #[must_use]
    pub fn max_silence(&self) -> Duration {
        self.tracking.max_silence()
    }

    /// Get the aggregator grace window as a Duration.
    #[must_use]
    pub fn grace_window(&self) -> Duration {
        self.aggregator.grace_window()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert!((config.tracking.max_accuracy_m - 50.0).abs() < f64::EPSILON);
        assert!((config.tracking.min_distance_m - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.tracking.max_silence_secs, 60);
        assert_eq!(config.aggregator.grace_ms, 5_000);
        assert_eq!(config.aggregator.year_min, 1970);
        assert_eq!(config.aggregator.year_horizon, 5);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_negative_accuracy() {
        let mut config = Config::default();
        config.tracking.max_accuracy_m = -1.0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_accuracy_m"));
    }

    #[test]
    fn test_validate_negative_min_distance() {
        let mut config = Config::default();
        config.tracking.min_distance_m = -0.5;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("min_distance_m"));
    }

    #[test]
    fn test_validate_zero_silence() {
        let mut config = Config::default();
        config.tracking.max_silence_secs = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("max_silence_secs"));
    }

    #[test]
    fn test_validate_zero_channel_capacity() {
        let mut config = Config::default();
        config.tracking.sample_channel_capacity = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_negative_year_horizon() {
        let mut config = Config::default();
        config.aggregator.year_horizon = -1;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config
            .database_path()
            .to_string_lossy()
            .contains("journal.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_preferences_path_default() {
        let config = Config::default();
        assert!(config
            .preferences_path()
            .to_string_lossy()
            .contains("preferences.json"));
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.max_silence(), Duration::from_secs(60));
        assert_eq!(config.grace_window(), Duration::from_millis(5_000));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("waymark"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_tracking_config_deserialize() {
        let json = r#"{"max_accuracy_m": 30.0, "min_distance_m": 5.0}"#;
        let tracking: TrackingConfig = serde_json::from_str(json).unwrap();
        assert!((tracking.max_accuracy_m - 30.0).abs() < f64::EPSILON);
        assert!((tracking.min_distance_m - 5.0).abs() < f64::EPSILON);
        // Unspecified fields fall back to defaults
        assert_eq!(tracking.max_silence_secs, 60);
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("max_accuracy_m"));
        assert!(json.contains("grace_ms"));
    }
}
