//! Bounded concurrent mapper.

use std::future::Future;
use std::pin::pin;

use futures::stream::{self, Stream, StreamExt};
use tracing::debug;

use crate::batch::error::BatchError;
use crate::config::DEFAULT_CONCURRENCY_LIMIT;

/// Applies an async processor to every item with bounded concurrency.
///
/// Items are admitted in input order. Once `concurrency` processors are in
/// flight, the next item waits until one of them settles. Results are
/// returned in input order no matter which item finishes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProcessor {
    /// Maximum number of concurrent operations.
    concurrency: usize,
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self { concurrency: DEFAULT_CONCURRENCY_LIMIT }
    }
}

impl BatchProcessor {
    /// Create a new batch processor.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConfig`] when `concurrency` is zero.
    pub fn new(concurrency: usize) -> Result<Self, BatchError> {
        if concurrency == 0 {
            return Err(BatchError::InvalidConfig(
                "concurrency limit must be at least 1".to_string(),
            ));
        }
        Ok(Self { concurrency })
    }

    /// Maximum number of concurrent operations.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Process every item, keeping one result slot per item.
    ///
    /// A processor error is stored in its item's slot and never stops the
    /// other items. The returned vector has the same length and order as
    /// `items`.
    pub async fn map<T, R, E, F, Fut>(&self, items: Vec<T>, processor: F) -> Vec<Result<R, E>>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let total = items.len();
        if total == 0 {
            return Vec::new();
        }

        debug!(total_items = total, concurrency = self.concurrency, "Starting bounded map");

        let mut slots: Vec<Option<Result<R, E>>> =
            std::iter::repeat_with(|| None).take(total).collect();
        let mut settled = pin!(self.settle(items, |index, item| {
            let fut = processor(item);
            async move { (index, fut.await) }
        }));

        let mut failed = 0usize;
        while let Some((index, outcome)) = settled.next().await {
            if outcome.is_err() {
                failed += 1;
            }
            slots[index] = Some(outcome);
        }

        debug!(total_items = total, failed = failed, "Bounded map completed");

        // Every index is settled exactly once, so no slot is left empty.
        slots.into_iter().flatten().collect()
    }

    /// Stream of settled tasks in completion order.
    ///
    /// `task` is called with each item and its input index when the item is
    /// admitted. At most `concurrency` of the returned futures are pending at
    /// any time. Dropping the stream cancels everything still in flight.
    pub(crate) fn settle<T, F, Fut>(
        &self,
        items: Vec<T>,
        mut task: F,
    ) -> impl Stream<Item = Fut::Output>
    where
        F: FnMut(usize, T) -> Fut,
        Fut: Future,
    {
        stream::iter(items.into_iter().enumerate())
            .map(move |(index, item)| task(index, item))
            .buffer_unordered(self.concurrency)
    }
}
