//! Data types for batch processing.

use std::fmt;
use std::time::Duration;

use crate::batch::error::TaskFailure;
use crate::config::{DEFAULT_CONCURRENCY_LIMIT, DEFAULT_CONTINUE_ON_ERROR};

/// Callback invoked for every failed item, with the failure and the item.
pub type ErrorCallback<T> = Box<dyn Fn(&TaskFailure, &T) + Send + Sync>;

/// Callback invoked after every settled item.
pub type ProgressCallback = Box<dyn Fn(Progress) + Send + Sync>;

/// Snapshot of a partitioned run, taken after an item settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Items settled so far.
    pub completed: usize,
    /// Items in the batch.
    pub total: usize,
    /// Items that succeeded so far.
    pub successful: usize,
    /// Items that failed so far.
    pub failed: usize,
}

/// Options for an error-partitioning run.
pub struct RunnerOptions<T> {
    /// Maximum number of items in flight at once.
    pub concurrency_limit: usize,
    /// Keep processing after an item fails. When false, the first failure
    /// aborts the run and cancels everything still in flight.
    pub continue_on_error: bool,
    /// Called once per failed item.
    pub on_error: Option<ErrorCallback<T>>,
    /// Called once per settled item.
    pub on_progress: Option<ProgressCallback>,
}

impl<T> Default for RunnerOptions<T> {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            continue_on_error: DEFAULT_CONTINUE_ON_ERROR,
            on_error: None,
            on_progress: None,
        }
    }
}

impl<T> RunnerOptions<T> {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency limit.
    #[must_use]
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// Set whether the run continues past failures.
    #[must_use]
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Set the per-failure callback.
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TaskFailure, &T) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }
}

impl<T> fmt::Debug for RunnerOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerOptions")
            .field("concurrency_limit", &self.concurrency_limit)
            .field("continue_on_error", &self.continue_on_error)
            .field("on_error", &self.on_error.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Items split by outcome.
///
/// Both lists are in completion order, not input order.
#[derive(Debug)]
pub struct Partition<T, R> {
    /// Successfully processed items with their results.
    pub successful: Vec<(T, R)>,
    /// Failed items with error details.
    pub failed: Vec<(T, TaskFailure)>,
    /// Total duration of the run.
    pub total_duration: Duration,
    /// Success rate as a percentage (0.0 to 100.0).
    pub success_rate: f64,
}

impl<T, R> Partition<T, R> {
    /// Create a new partition.
    pub fn new(
        successful: Vec<(T, R)>,
        failed: Vec<(T, TaskFailure)>,
        total_duration: Duration,
    ) -> Self {
        let total = successful.len() + failed.len();
        let success_rate = if total > 0 {
            (successful.len() as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        Self { successful, failed, total_duration, success_rate }
    }

    /// Get total number of items processed.
    pub fn total_items(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    /// Check if all items were successful.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}
