//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! for HWI applications.
//!
//! # Usage
//!
//! ```rust,no_run
//! use hwi_common::config::{ConfigError, ConfigLoader, HwiConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = HwiConfig::load(Path::new("hwi.toml"))?;
//!     config.validate()?;
//!     match config.retry.policy()? {
//!         Some(policy) => println!("Retry policy: {policy}"),
//!         None => println!("Retry policy: per-instruction defaults"),
//!     }
//!     Ok(())
//! }
//! ```

use crate::consts::{
    DEFAULT_DEADLINE_US, DEFAULT_MAX_ATTEMPTS, DEFAULT_PROBE_SAMPLES, NATIVE_SOURCE,
    PROBE_SERVICE_NAME,
};
use crate::policy::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Error type for configuration loading operations.
///
/// This enum represents all possible errors that can occur when loading
/// configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Common configuration fields shared across HWI applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "hwi-probe-bench-01"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: PROBE_SERVICE_NAME.to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Retry mode selector as written in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetryMode {
    /// Per-instruction defaults (`RetryPolicy::default_for`).
    #[default]
    Auto,
    /// Spin until success.
    Unbounded,
    /// Bounded by `max_attempts`.
    Attempts,
    /// Bounded by `deadline_us`.
    Deadline,
}

/// `[retry]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Which bound applies.
    #[serde(default)]
    pub mode: RetryMode,

    /// Attempt limit for `mode = "attempts"`.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wall-clock budget in microseconds for `mode = "deadline"`.
    #[serde(default = "default_deadline_us")]
    pub deadline_us: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_deadline_us() -> u64 {
    DEFAULT_DEADLINE_US
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            mode: RetryMode::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            deadline_us: DEFAULT_DEADLINE_US,
        }
    }
}

impl RetryConfig {
    /// Convert into a `RetryPolicy` applied to every instruction.
    ///
    /// `None` for `mode = "auto"`: each instruction keeps its own default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` when the bound for the selected
    /// mode is zero.
    pub fn policy(&self) -> Result<Option<RetryPolicy>, ConfigError> {
        let policy = match self.mode {
            RetryMode::Auto => {
                debug!("Retry policy: per-instruction defaults");
                return Ok(None);
            }
            RetryMode::Unbounded => RetryPolicy::Unbounded,
            RetryMode::Attempts => RetryPolicy::attempts(self.max_attempts).ok_or_else(|| {
                ConfigError::ValidationError("retry.max_attempts must be > 0".to_string())
            })?,
            RetryMode::Deadline => {
                if self.deadline_us == 0 {
                    return Err(ConfigError::ValidationError(
                        "retry.deadline_us must be > 0".to_string(),
                    ));
                }
                RetryPolicy::Deadline(Duration::from_micros(self.deadline_us))
            }
        };
        debug!(%policy, "Retry policy resolved");
        Ok(Some(policy))
    }
}

/// `[probe]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// Registered source name.
    #[serde(default = "default_source")]
    pub source: String,

    /// Samples drawn per instruction.
    #[serde(default = "default_samples")]
    pub samples: u32,
}

fn default_source() -> String {
    NATIVE_SOURCE.to_string()
}

fn default_samples() -> u32 {
    DEFAULT_PROBE_SAMPLES
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            samples: DEFAULT_PROBE_SAMPLES,
        }
    }
}

/// Top-level HWI configuration file.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "info"
/// service_name = "hwi-probe"
///
/// [retry]
/// mode = "attempts"
/// max_attempts = 10
///
/// [probe]
/// source = "native"
/// samples = 4
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HwiConfig {
    /// Shared application settings.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Retry policy settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Probe settings.
    #[serde(default)]
    pub probe: ProbeConfig,
}

impl HwiConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError::ValidationError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.retry.policy()?;
        if self.probe.source.is_empty() {
            return Err(ConfigError::ValidationError(
                "probe.source cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// This trait provides a default implementation that works with any type
/// implementing `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::num::NonZeroU32;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        assert_eq!(
            toml::from_str::<TestWrapper>("level = \"trace\"")
                .unwrap()
                .level,
            LogLevel::Trace
        );
        assert_eq!(
            toml::from_str::<TestWrapper>("level = \"warn\"")
                .unwrap()
                .level,
            LogLevel::Warn
        );
        assert!(toml::from_str::<TestWrapper>("level = \"loud\"").is_err());
    }

    #[test]
    fn test_log_level_to_tracing() {
        assert_eq!(tracing::Level::from(LogLevel::Debug), tracing::Level::DEBUG);
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = HwiConfig::parse("").unwrap();
        assert_eq!(config, HwiConfig::default());
        assert_eq!(config.probe.source, "native");
        assert_eq!(config.retry.mode, RetryMode::Auto);
        assert_eq!(config.retry.policy().unwrap(), None);
        config.validate().unwrap();
    }

    #[test]
    fn test_deadline_mode() {
        let config = HwiConfig::parse(
            r#"
[retry]
mode = "deadline"
deadline_us = 250
"#,
        )
        .unwrap();
        assert_eq!(
            config.retry.policy().unwrap(),
            Some(RetryPolicy::Deadline(Duration::from_micros(250)))
        );
    }

    #[test]
    fn test_unbounded_mode_ignores_bounds() {
        let config = HwiConfig::parse(
            r#"
[retry]
mode = "unbounded"
max_attempts = 0
"#,
        )
        .unwrap();
        assert_eq!(config.retry.policy().unwrap(), Some(RetryPolicy::Unbounded));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = HwiConfig::parse("[retry]\nmode = \"attempts\"\nmax_attempts = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(ref m) if m.contains("max_attempts")));
    }

    #[test]
    fn test_zero_deadline_rejected() {
        let config = HwiConfig::parse("[retry]\nmode = \"deadline\"\ndeadline_us = 0\n").unwrap();
        assert!(matches!(
            config.retry.policy(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_empty_service_name_rejected() {
        let config = HwiConfig::parse("[shared]\nservice_name = \"\"\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = HwiConfig::parse("[retry]\nbackoff = 3\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[shared]
log_level = "debug"
service_name = "bench-01"

[retry]
mode = "attempts"
max_attempts = 3

[probe]
source = "simulation"
samples = 16
"#
        )
        .unwrap();

        let config = HwiConfig::load(file.path()).unwrap();
        assert_eq!(config.shared.log_level, LogLevel::Debug);
        assert_eq!(config.shared.service_name, "bench-01");
        assert_eq!(
            config.retry.policy().unwrap(),
            Some(RetryPolicy::Attempts(NonZeroU32::new(3).unwrap()))
        );
        assert_eq!(config.probe.source, "simulation");
        assert_eq!(config.probe.samples, 16);
    }

    #[test]
    fn test_load_missing_file() {
        let result = HwiConfig::load(Path::new("/nonexistent/hwi.toml"));
        assert_eq!(result, Err(ConfigError::FileNotFound));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[retry\nmode = ").unwrap();
        assert!(matches!(
            HwiConfig::load(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }
}
