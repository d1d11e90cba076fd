//! Fanout Core - bounded coordination primitives for async work.
//!
//! This crate provides the policy layer a service puts on top of its async
//! runtime when it has to fan work out and gather it back:
//! - Bounded concurrent mapping with input-ordered results
//! - Error-partitioning batch runs with optional early abort
//! - Retry with deterministic exponential backoff
//! - Named parallel joins
//!
//! All work for one call is polled inside the caller's task. Nothing is
//! spawned, so processors don't need to be `Send` or `'static`.
//!
//! # Example
//!
//! ```rust,no_run
//! use fanout_core::BatchProcessor;
//!
//! #[tokio::main]
//! async fn main() -> fanout_core::Result<()> {
//!     let processor = BatchProcessor::new(2)?;
//!     let results = processor
//!         .map(vec![1, 2, 3], |x| async move { Ok::<_, std::io::Error>(x * 2) })
//!         .await;
//!     assert_eq!(results.len(), 3);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod join;
pub mod retry;

pub use batch::{
    BatchError, BatchProcessor, ErrorCallback, Partition, PartitionRunner, Progress,
    ProgressCallback, RunnerOptions, TaskFailure,
};
pub use config::{BatchConfig, Config, ConfigError, RetryConfig};
pub use error::{FanoutError, Result};
pub use join::{join_named, join_named_settled};
pub use retry::{Retrier, RetryPolicy, Sleeper, TokioSleeper};
