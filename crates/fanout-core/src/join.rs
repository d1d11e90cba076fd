// Named parallel joins.
//
// Every operation is started at once and polled inside the caller's task.
// There is no concurrency cap; callers bound the number of operations.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use futures::future::{join_all, try_join_all};
use tracing::debug;

/// Run keyed operations concurrently and collect their values by key.
///
/// Fails with the first error observed; the remaining operations are dropped
/// and no partial map is returned. If a key appears more than once, the value
/// of the last occurrence is kept.
pub async fn join_named<K, V, E, I, Fut>(operations: I) -> Result<HashMap<K, V>, E>
where
    I: IntoIterator<Item = (K, Fut)>,
    K: Eq + Hash,
    Fut: Future<Output = Result<V, E>>,
{
    let keyed: Vec<_> = operations
        .into_iter()
        .map(|(key, operation)| async move { operation.await.map(|value| (key, value)) })
        .collect();

    debug!(operations = keyed.len(), "Joining named operations");

    let pairs = try_join_all(keyed).await?;
    Ok(pairs.into_iter().collect())
}

/// Run keyed operations concurrently and keep every outcome.
///
/// Unlike [`join_named`], a failure does not cancel the other operations.
pub async fn join_named_settled<K, V, E, I, Fut>(operations: I) -> HashMap<K, Result<V, E>>
where
    I: IntoIterator<Item = (K, Fut)>,
    K: Eq + Hash,
    Fut: Future<Output = Result<V, E>>,
{
    let keyed: Vec<_> = operations
        .into_iter()
        .map(|(key, operation)| async move { (key, operation.await) })
        .collect();

    debug!(operations = keyed.len(), "Joining named operations (settled)");

    join_all(keyed).await.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::time::Duration;

    fn op(value: u32, delay_ms: u64) -> BoxFuture<'static, Result<u32, String>> {
        async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok(value)
        }
        .boxed()
    }

    fn failing(message: &'static str, delay_ms: u64) -> BoxFuture<'static, Result<u32, String>> {
        async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Err(message.to_string())
        }
        .boxed()
    }

    #[tokio::test]
    async fn test_join_named_collects_all_values() {
        let result = join_named(vec![("a", op(1, 20)), ("b", op(2, 5))]).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result["a"], 1);
        assert_eq!(result["b"], 2);
    }

    #[tokio::test]
    async fn test_join_named_fails_without_partial_map() {
        let result = join_named(vec![("a", op(1, 5)), ("b", failing("b broke", 10))]).await;
        assert_eq!(result, Err("b broke".to_string()));
    }

    #[tokio::test]
    async fn test_join_named_returns_first_observed_failure() {
        let result = join_named(vec![
            ("slow", failing("slow broke", 50)),
            ("fast", failing("fast broke", 5)),
        ])
        .await;
        assert_eq!(result, Err("fast broke".to_string()));
    }

    #[tokio::test]
    async fn test_join_named_runs_concurrently() {
        let start = std::time::Instant::now();
        let ops: Vec<_> = (0..5u32).map(|i| (i, op(i, 40))).collect();
        let result = join_named(ops).await.unwrap();

        assert_eq!(result.len(), 5);
        assert!(start.elapsed() < Duration::from_millis(190));
    }

    #[tokio::test]
    async fn test_join_named_empty() {
        let ops: Vec<(&str, BoxFuture<'static, Result<u32, String>>)> = Vec::new();
        let result = join_named(ops).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_join_named_settled_keeps_failures() {
        let result =
            join_named_settled(vec![("ok", op(7, 5)), ("bad", failing("nope", 5))]).await;

        assert_eq!(result.len(), 2);
        assert_eq!(result["ok"], Ok(7));
        assert_eq!(result["bad"], Err("nope".to_string()));
    }
}
