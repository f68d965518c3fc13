//! `SimGram` Configuration Module
//!
//! Provides configuration file support via `simgram.toml`, environment
//! variables, and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (CLI flags)
//! 2. Environment variables (`SIMGRAM_*`)
//! 3. Configuration file (`simgram.toml`)
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::measure::Measure;
use crate::ngram::MAX_NGRAM_SIZE;
use crate::IndexOptions;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// Index construction section. Only consulted when a database is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of characters per n-gram.
    pub ngram_size: usize,
    /// Surround strings with boundary sentinels before slicing.
    pub pad: bool,
    /// Fold case before extracting n-grams.
    pub case_insensitive: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        let options = IndexOptions::default();
        Self {
            ngram_size: options.ngram_size,
            pad: options.pad,
            case_insensitive: options.case_insensitive,
        }
    }
}

impl From<&IndexConfig> for IndexOptions {
    fn from(config: &IndexConfig) -> Self {
        Self {
            ngram_size: config.ngram_size,
            pad: config.pad,
            case_insensitive: config.case_insensitive,
        }
    }
}

/// Retrieval defaults section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default similarity measure.
    pub measure: Measure,
    /// Default similarity threshold in `(0, 1]`.
    pub threshold: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            measure: Measure::Cosine,
            threshold: 0.7,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `SimGram` configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SimgramConfig {
    /// Index construction options.
    pub index: IndexConfig,
    /// Retrieval defaults.
    pub search: SearchConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl SimgramConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < `simgram.toml` < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("simgram.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SIMGRAM_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_NGRAM_SIZE).contains(&self.index.ngram_size) {
            return Err(ConfigError::InvalidValue {
                key: "index.ngram_size".to_string(),
                message: format!(
                    "value {} is out of range [1, {MAX_NGRAM_SIZE}]",
                    self.index.ngram_size
                ),
            });
        }

        let threshold = self.search.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "search.threshold".to_string(),
                message: format!("value {threshold} is out of range (0, 1]"),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        Ok(())
    }

    /// Index options for creating a new database.
    #[must_use]
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions::from(&self.index)
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
