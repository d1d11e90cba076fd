//! Retry with exponential backoff.

pub mod policy;
pub mod retrier;
pub mod sleeper;

pub use policy::RetryPolicy;
pub use retrier::{Retrier, RetryCondition};
pub use sleeper::{Sleeper, TokioSleeper};
