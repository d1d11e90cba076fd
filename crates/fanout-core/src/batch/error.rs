//! Error types for batch processing.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Errors that end a whole batch call.
///
/// Item failures are not batch errors; they are reported per item.
#[derive(Error, Debug)]
pub enum BatchError {
    /// Batch processing was aborted by the first failing item.
    #[error("Batch aborted: {0}")]
    Aborted(#[source] TaskFailure),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BatchError {
    /// Index of the item that aborted the batch, if any.
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            BatchError::Aborted(failure) => Some(failure.index()),
            BatchError::InvalidConfig(_) => None,
        }
    }
}

/// Normalized failure of a single item.
///
/// Wraps whatever the processor returned, keeping its message and cause
/// chain, together with the input position of the item.
#[derive(Debug)]
pub struct TaskFailure {
    index: usize,
    error: anyhow::Error,
}

impl TaskFailure {
    /// Create a failure for the item at `index`.
    pub fn new(index: usize, error: impl Into<anyhow::Error>) -> Self {
        Self { index, error: error.into() }
    }

    /// Input position of the failed item.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The underlying error.
    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    /// Consume the failure, returning the underlying error.
    pub fn into_error(self) -> anyhow::Error {
        self.error
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Item {} failed: {}", self.index, self.error)
    }
}

impl StdError for TaskFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        let source: &(dyn StdError + 'static) = self.error.as_ref();
        Some(source)
    }
}
