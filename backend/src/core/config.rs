//! Engine configuration
//!
//! Configuration is plain data with serde defaults, so a partial JSON file
//! overrides only the fields it names:
//!
//! ```rust
//! use debt_payoff_core::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{"monitor": {"scan_interval_secs": 60}}"#).unwrap();
//! assert_eq!(config.monitor.scan_interval_secs, 60);
//! assert!(config.detector.auto_confirm_payoff);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub recorder: RecorderConfig,
    pub detector: DetectorConfig,
    pub monitor: MonitorConfig,
    pub outbox: OutboxConfig,
}

/// Balance change recorder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Compare-and-set attempts before a write is reported as contended
    pub max_commit_attempts: u32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_commit_attempts: 8,
        }
    }
}

/// Milestone detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Move ZeroBalanceDetected debts straight to PaidOff.
    /// When false the user is sent a payoff reminder and confirms manually.
    pub auto_confirm_payoff: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            auto_confirm_payoff: true,
        }
    }
}

/// Periodic monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between periodic detector scans
    pub scan_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 300,
        }
    }
}

/// Notification outbox settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboxConfig {
    /// Delivery attempts per event before it is dropped
    pub max_attempts: u32,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl EngineConfig {
    /// Parse and validate configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Reject values that would stall the engine
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recorder.max_commit_attempts == 0 {
            return Err(ConfigError::Invalid(
                "recorder.max_commit_attempts must be positive".to_string(),
            ));
        }
        if self.monitor.scan_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "monitor.scan_interval_secs must be positive".to_string(),
            ));
        }
        if self.outbox.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "outbox.max_attempts must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Scan interval as a chrono duration
    pub fn scan_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.monitor.scan_interval_secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.recorder.max_commit_attempts, 8);
        assert_eq!(config.monitor.scan_interval_secs, 300);
        assert_eq!(config.outbox.max_attempts, 3);
        assert!(config.detector.auto_confirm_payoff);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = EngineConfig::from_json_str(r#"{"monitor": {"scan_interval_secs": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = EngineConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
