//! Error-partitioning batch runner.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::pin;
use std::time::Instant;

use futures::StreamExt;
use tracing::{debug, warn};

use crate::batch::error::{BatchError, TaskFailure};
use crate::batch::mapper::BatchProcessor;
use crate::batch::types::{Partition, Progress, RunnerOptions};

/// Runs a batch and splits the items into successes and failures.
///
/// Scheduling is delegated to [`BatchProcessor`], so the same admission
/// rules apply. Failures are captured per item instead of failing the call,
/// unless `continue_on_error` is off.
pub struct PartitionRunner<T> {
    processor: BatchProcessor,
    options: RunnerOptions<T>,
}

impl<T> PartitionRunner<T> {
    /// Create a runner from options.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConfig`] when the concurrency limit is zero.
    pub fn new(options: RunnerOptions<T>) -> Result<Self, BatchError> {
        let processor = BatchProcessor::new(options.concurrency_limit)?;
        Ok(Self { processor, options })
    }

    /// Options this runner was built with.
    pub fn options(&self) -> &RunnerOptions<T> {
        &self.options
    }

    /// Process a batch of items.
    ///
    /// With `continue_on_error` set, every item ends up in exactly one side of
    /// the returned partition. Otherwise the first failure, in completion
    /// order, ends the call with [`BatchError::Aborted`]; tasks still in flight
    /// are dropped at that point and no further items are started.
    pub async fn run<R, E, F, Fut>(
        &self,
        items: Vec<T>,
        processor: F,
    ) -> Result<Partition<T, R>, BatchError>
    where
        T: Clone,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Into<anyhow::Error>,
    {
        let start_time = Instant::now();
        let total = items.len();

        debug!(
            total_items = total,
            concurrency = self.processor.concurrency(),
            continue_on_error = self.options.continue_on_error,
            "Starting partitioned batch"
        );

        let mut successful = Vec::new();
        let mut failed = Vec::new();

        let mut settled = pin!(self.processor.settle(items, |index, item: T| {
            let fut = processor(item.clone());
            async move { (index, item, fut.await) }
        }));

        while let Some((index, item, outcome)) = settled.next().await {
            match outcome {
                Ok(result) => successful.push((item, result)),
                Err(e) => {
                    let failure = TaskFailure::new(index, e);
                    debug!(index = index, error = %failure.error(), "Item failed");
                    self.notify_error(&failure, &item);

                    if !self.options.continue_on_error {
                        warn!(
                            index = index,
                            completed = successful.len() + failed.len() + 1,
                            total_items = total,
                            "Aborting batch on first failure"
                        );
                        return Err(BatchError::Aborted(failure));
                    }
                    failed.push((item, failure));
                }
            }

            if let Some(cb) = &self.options.on_progress {
                cb(Progress {
                    completed: successful.len() + failed.len(),
                    total,
                    successful: successful.len(),
                    failed: failed.len(),
                });
            }
        }

        let total_duration = start_time.elapsed();

        debug!(
            total_items = total,
            successful = successful.len(),
            failed = failed.len(),
            duration_ms = total_duration.as_millis(),
            "Partitioned batch completed"
        );

        Ok(Partition::new(successful, failed, total_duration))
    }

    /// Invoke the error callback, containing any panic it raises.
    fn notify_error(&self, failure: &TaskFailure, item: &T) {
        let Some(cb) = &self.options.on_error else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(|| cb(failure, item))).is_err() {
            warn!(index = failure.index(), "Error callback panicked; continuing");
        }
    }
}
