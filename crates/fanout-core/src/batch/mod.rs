//! Batch processing module for bounded execution of async operations.

pub mod error;
pub mod mapper;
pub mod runner;
pub mod types;

pub use error::{BatchError, TaskFailure};
pub use mapper::BatchProcessor;
pub use runner::PartitionRunner;
pub use types::{ErrorCallback, Partition, Progress, ProgressCallback, RunnerOptions};
