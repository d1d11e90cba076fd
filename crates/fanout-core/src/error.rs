//! Error types for Fanout Core.

use crate::batch::BatchError;
use crate::config::ConfigError;
use thiserror::Error;

/// Core error type for Fanout operations.
#[derive(Error, Debug)]
pub enum FanoutError {
    /// Batch scheduling errors
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Fanout operations.
pub type Result<T> = std::result::Result<T, FanoutError>;
