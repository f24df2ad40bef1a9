//! Configuration management for the index query codec
//!
//! This module provides configuration file support with TOML format,
//! environment variable overrides, and sensible defaults.
//!
//! ```toml
//! [codec]
//! max_regex_pattern_len = 1000
//! regex_size_limit = 1048576
//! max_query_depth = 50
//!
//! [logging]
//! log_level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::query::ast::{DEFAULT_MAX_PATTERN_LEN, DEFAULT_REGEX_SIZE_LIMIT};
use crate::query::{QueryCodec, RegexLimits, MAX_QUERY_DEPTH};

/// Upper bound accepted for the compiled regexp size limit
const MAX_REGEX_SIZE_LIMIT: usize = 64 * 1024 * 1024;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Codec configuration
    #[serde(default)]
    pub codec: CodecConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Codec configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CodecConfig {
    /// Maximum regexp pattern length in bytes
    #[serde(default = "default_max_regex_pattern_len")]
    pub max_regex_pattern_len: usize,

    /// Maximum compiled regexp size in bytes
    #[serde(default = "default_regex_size_limit")]
    pub regex_size_limit: usize,

    /// Maximum query tree depth, at most [`MAX_QUERY_DEPTH`]
    #[serde(default = "default_max_query_depth")]
    pub max_query_depth: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_regex_pattern_len() -> usize {
    DEFAULT_MAX_PATTERN_LEN
}
fn default_regex_size_limit() -> usize {
    DEFAULT_REGEX_SIZE_LIMIT
}
fn default_max_query_depth() -> usize {
    MAX_QUERY_DEPTH
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_regex_pattern_len: default_max_regex_pattern_len(),
            regex_size_limit: default_regex_size_limit(),
            max_query_depth: default_max_query_depth(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl CodecConfig {
    /// Regexp limits described by this configuration
    pub fn regex_limits(&self) -> RegexLimits {
        RegexLimits {
            max_pattern_len: self.max_regex_pattern_len,
            size_limit: self.regex_size_limit,
        }
    }

    /// Codec using this configuration
    pub fn codec(&self) -> QueryCodec {
        QueryCodec::new()
            .with_regex_limits(self.regex_limits())
            .with_max_depth(self.max_query_depth)
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(len) = std::env::var("KUBA_QUERY_MAX_REGEX_LEN") {
            if let Ok(len) = len.parse() {
                self.codec.max_regex_pattern_len = len;
            }
        }
        if let Ok(limit) = std::env::var("KUBA_QUERY_REGEX_SIZE_LIMIT") {
            if let Ok(limit) = limit.parse() {
                self.codec.regex_size_limit = limit;
            }
        }
        if let Ok(depth) = std::env::var("KUBA_QUERY_MAX_DEPTH") {
            if let Ok(depth) = depth.parse() {
                self.codec.max_query_depth = depth;
            }
        }

        if let Ok(log_level) = std::env::var("RUST_LOG") {
            self.logging.log_level = log_level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.codec.max_regex_pattern_len == 0 {
            return Err(Error::Configuration(
                "Max regex pattern length must be > 0".to_string(),
            ));
        }
        if self.codec.regex_size_limit == 0 {
            return Err(Error::Configuration(
                "Regex size limit must be > 0".to_string(),
            ));
        }
        if self.codec.regex_size_limit > MAX_REGEX_SIZE_LIMIT {
            return Err(Error::Configuration(format!(
                "Regex size limit cannot exceed {} bytes",
                MAX_REGEX_SIZE_LIMIT
            )));
        }
        if self.codec.max_query_depth == 0 || self.codec.max_query_depth > MAX_QUERY_DEPTH {
            return Err(Error::Configuration(format!(
                "Max query depth must be between 1 and {}",
                MAX_QUERY_DEPTH
            )));
        }
        if self.logging.log_level.trim().is_empty() {
            return Err(Error::Configuration("Log level cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Save configuration to TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents).map_err(|e| {
            Error::Configuration(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    // Process environment is shared by every test thread
    static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.codec.max_regex_pattern_len, 1000);
        assert_eq!(config.codec.regex_size_limit, 1024 * 1024);
        assert_eq!(config.codec.max_query_depth, MAX_QUERY_DEPTH);
        assert_eq!(config.logging.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_pattern_len() {
        let mut config = Config::default();
        config.codec.max_regex_pattern_len = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_size_limit() {
        let mut config = Config::default();
        config.codec.regex_size_limit = MAX_REGEX_SIZE_LIMIT + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_max_query_depth() {
        let mut config = Config::default();
        config.codec.max_query_depth = 0;
        assert!(config.validate().is_err());

        config.codec.max_query_depth = MAX_QUERY_DEPTH + 1;
        assert!(config.validate().is_err());

        config.codec.max_query_depth = 8;
        assert!(config.validate().is_ok());
        assert_eq!(config.codec.codec().max_depth(), 8);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[codec]\nmax_regex_pattern_len = 64\n").unwrap();
        assert_eq!(config.codec.max_regex_pattern_len, 64);
        assert_eq!(config.codec.regex_size_limit, DEFAULT_REGEX_SIZE_LIMIT);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_codec_uses_limits() {
        let config = CodecConfig {
            max_regex_pattern_len: 8,
            regex_size_limit: 4096,
            max_query_depth: 10,
        };
        assert_eq!(
            *config.codec().regex_limits(),
            RegexLimits {
                max_pattern_len: 8,
                size_limit: 4096,
            }
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query.toml");

        let mut config = Config::default();
        config.codec.max_regex_pattern_len = 256;
        config.logging.log_level = "debug".to_string();
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/query.toml").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_env_override() {
        let _guard = ENV_LOCK.lock();
        std::env::set_var("KUBA_QUERY_MAX_REGEX_LEN", "77");
        std::env::set_var("KUBA_QUERY_MAX_DEPTH", "12");
        let config = Config::from_env();
        std::env::remove_var("KUBA_QUERY_MAX_REGEX_LEN");
        std::env::remove_var("KUBA_QUERY_MAX_DEPTH");

        assert_eq!(config.codec.max_regex_pattern_len, 77);
        assert_eq!(config.codec.max_query_depth, 12);
    }

    #[test]
    fn test_env_override_ignores_unparsable_values() {
        let _guard = ENV_LOCK.lock();
        std::env::set_var("KUBA_QUERY_REGEX_SIZE_LIMIT", "lots");
        let config = Config::from_env();
        std::env::remove_var("KUBA_QUERY_REGEX_SIZE_LIMIT");

        assert_eq!(config.codec.regex_size_limit, DEFAULT_REGEX_SIZE_LIMIT);
    }
}
