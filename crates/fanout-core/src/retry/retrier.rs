//! Backoff retrier.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ConfigError;
use crate::retry::policy::RetryPolicy;
use crate::retry::sleeper::{Sleeper, TokioSleeper};

/// Predicate deciding whether an error is worth another attempt.
pub type RetryCondition<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// Re-runs a fallible async operation with exponential backoff.
///
/// Attempts are strictly sequential. The call returns the first success, or
/// the last error once retries are exhausted or the retry condition rejects
/// an error. The retry state lives on the stack of each [`Retrier::run`]
/// call, so one retrier can serve many calls.
pub struct Retrier<E> {
    policy: RetryPolicy,
    condition: Option<RetryCondition<E>>,
    sleeper: Arc<dyn Sleeper>,
}

impl<E> Retrier<E> {
    /// Create a retrier that retries every error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the policy's backoff factor is not
    /// a positive finite number.
    pub fn new(policy: RetryPolicy) -> Result<Self, ConfigError> {
        policy.validate()?;
        Ok(Self { policy, condition: None, sleeper: Arc::new(TokioSleeper) })
    }

    /// Only retry errors for which `condition` returns true.
    #[must_use]
    pub fn retry_if<C>(mut self, condition: C) -> Self
    where
        C: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Box::new(condition));
        self
    }

    /// Replace the timer used between attempts.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The policy this retrier follows.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds or the policy gives up.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 0;
        let mut delay = self.policy.initial_delay.min(self.policy.max_delay);

        loop {
            let err = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempts = attempt + 1, "Operation succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if attempt >= self.policy.max_retries {
                warn!(attempts = attempt + 1, "Retries exhausted");
                return Err(err);
            }
            if !self.should_retry(&err) {
                debug!(attempts = attempt + 1, "Error rejected by retry condition");
                return Err(err);
            }

            debug!(
                attempt = attempt + 1,
                max_retries = self.policy.max_retries,
                delay_ms = delay.as_millis(),
                "Retrying after backoff"
            );
            self.sleeper.sleep(delay).await;
            delay = self.policy.next_delay(delay);
            attempt += 1;
        }
    }

    fn should_retry(&self, err: &E) -> bool {
        self.condition.as_ref().is_none_or(|condition| condition(err))
    }
}

impl<E> fmt::Debug for Retrier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrier")
            .field("policy", &self.policy)
            .field("has_condition", &self.condition.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSleeper {
        waits: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn waits_ms(&self) -> Vec<u128> {
            self.waits.lock().unwrap().iter().map(Duration::as_millis).collect()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    fn recording_retrier(policy: RetryPolicy) -> (Retrier<String>, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        let retrier = Retrier::new(policy).unwrap().with_sleeper(sleeper.clone());
        (retrier, sleeper)
    }

    /// Fails the first `failures` calls, then succeeds with the call number.
    async fn flaky(calls: &AtomicU32, failures: u32) -> Result<u32, String> {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= failures {
            Err(format!("failure {}", call))
        } else {
            Ok(call)
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let (retrier, sleeper) = recording_retrier(RetryPolicy::default());
        let calls = AtomicU32::new(0);

        let result = retrier.run(|| flaky(&calls, 2)).await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.waits_ms(), vec![1000, 2000]);
    }

    #[tokio::test]
    async fn test_exhausts_retries() {
        let (retrier, sleeper) = recording_retrier(RetryPolicy::default());
        let calls = AtomicU32::new(0);

        let result = retrier.run(|| flaky(&calls, 10)).await;

        assert_eq!(result, Err("failure 4".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(sleeper.waits_ms(), vec![1000, 2000, 4000]);
    }

    #[tokio::test]
    async fn test_zero_retries_makes_one_attempt() {
        let (retrier, sleeper) = recording_retrier(RetryPolicy::none());
        let calls = AtomicU32::new(0);

        let result = retrier.run(|| flaky(&calls, 1)).await;

        assert_eq!(result, Err("failure 1".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.waits_ms().is_empty());
    }

    #[tokio::test]
    async fn test_retry_condition_stops_early() {
        let (retrier, sleeper) = recording_retrier(RetryPolicy::default());
        let retrier = retrier.retry_if(|err: &String| !err.contains("2"));
        let calls = AtomicU32::new(0);

        let result = retrier.run(|| flaky(&calls, 5)).await;

        assert_eq!(result, Err("failure 2".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(sleeper.waits_ms(), vec![1000]);
    }

    #[tokio::test]
    async fn test_delays_capped_at_max_delay() {
        let policy = RetryPolicy::new(
            5,
            Duration::from_millis(100),
            Duration::from_millis(500),
            3.0,
        );
        let (retrier, sleeper) = recording_retrier(policy);
        let calls = AtomicU32::new(0);

        let result = retrier.run(|| flaky(&calls, 100)).await;

        assert!(result.is_err());
        assert_eq!(sleeper.waits_ms(), vec![100, 300, 500, 500, 500]);
    }

    #[tokio::test]
    async fn test_state_not_shared_between_runs() {
        let (retrier, sleeper) = recording_retrier(RetryPolicy::default());

        let first = AtomicU32::new(0);
        assert_eq!(retrier.run(|| flaky(&first, 1)).await, Ok(2));
        let second = AtomicU32::new(0);
        assert_eq!(retrier.run(|| flaky(&second, 1)).await, Ok(2));

        assert_eq!(sleeper.waits_ms(), vec![1000, 1000]);
    }

    #[test]
    fn test_new_rejects_invalid_policy() {
        let policy = RetryPolicy { backoff_factor: f64::NAN, ..RetryPolicy::default() };
        let result: Result<Retrier<String>, _> = Retrier::new(policy);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
