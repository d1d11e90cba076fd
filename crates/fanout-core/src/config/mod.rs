//! Configuration module for Fanout Core.
//!
//! Every section deserializes with defaults, so an empty document is a valid
//! configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::batch::RunnerOptions;
use crate::retry::RetryPolicy;

/// Default number of items processed concurrently.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10;
/// Default for continuing a batch after an item fails.
pub const DEFAULT_CONTINUE_ON_ERROR: bool = true;
/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default delay before the first retry, in milliseconds.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1_000;
/// Default cap on the delay between retries, in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
/// Default multiplier applied to the delay after each retry.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration document is not valid TOML.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Batch scheduling configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BatchConfig {
    /// Maximum number of items in flight at once.
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
    /// Keep processing remaining items after one fails.
    #[serde(default = "default_continue_on_error")]
    pub continue_on_error: bool,
}

fn default_concurrency_limit() -> usize {
    DEFAULT_CONCURRENCY_LIMIT
}

fn default_continue_on_error() -> bool {
    DEFAULT_CONTINUE_ON_ERROR
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            continue_on_error: DEFAULT_CONTINUE_ON_ERROR,
        }
    }
}

impl BatchConfig {
    /// Build runner options from this section.
    ///
    /// Callbacks are not configurable from a file and start unset.
    pub fn runner_options<T>(&self) -> RunnerOptions<T> {
        RunnerOptions::new()
            .with_concurrency_limit(self.concurrency_limit)
            .with_continue_on_error(self.continue_on_error)
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Number of retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each retry.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_initial_delay_ms() -> u64 {
    DEFAULT_INITIAL_DELAY_MS
}

fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}

fn default_backoff_factor() -> f64 {
    DEFAULT_BACKOFF_FACTOR
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy::new(
            config.max_retries,
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.backoff_factor,
        )
    }
}

/// Root configuration for Fanout.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    /// Batch scheduling configuration.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a configuration from a TOML document.
    pub fn from_toml_str(contents: &str) -> std::result::Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.batch.concurrency_limit == 0 {
            return Err(ConfigError::Invalid(
                "batch.concurrency_limit must be at least 1".to_string(),
            ));
        }
        RetryPolicy::from(&self.retry).validate()
    }

    /// Retry policy described by the `retry` section.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }
}
