//! Guarded graph reads: per-attempt timeout plus bounded retry.

use std::future::Future;

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::ReadPolicy;
use crate::{Error, Result};

/// Run one graph read under `policy`.
///
/// A timed-out attempt counts as `GraphUnavailable`. Only
/// `GraphUnavailable` is retried; every other error is returned as is.
pub(crate) async fn guarded<T, F, Fut>(policy: &ReadPolicy, what: &str, mut read: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let total_attempts = policy.max_retries.saturating_add(1);
    let mut last_error: Option<String> = None;

    for attempt in 0..total_attempts {
        match timeout(policy.timeout(), read()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(Error::GraphUnavailable(message))) => {
                last_error = Some(message);
            }
            Ok(Err(other)) => return Err(other),
            Err(_) => {
                last_error = Some(format!("timed out after {}ms", policy.timeout_ms));
            }
        }

        if attempt + 1 < total_attempts {
            let delay = policy.backoff(attempt);
            debug!(what, attempt = attempt + 1, ?delay, "graph read failed, retrying");
            sleep(delay).await;
        }
    }

    let message = last_error.unwrap_or_else(|| "no attempt was made".to_owned());
    warn!(what, attempts = total_attempts, error = %message, "graph read gave up");
    Err(Error::GraphUnavailable(format!(
        "{what}: {message} (after {total_attempts} attempts)"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_policy(max_retries: u32) -> ReadPolicy {
        ReadPolicy {
            timeout_ms: 20,
            max_retries,
            backoff_base_ms: 1,
            backoff_max_ms: 2,
        }
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = guarded(&fast_policy(2), "LIKED", || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::GraphUnavailable("connection reset".into()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = guarded(&fast_policy(2), "OWNS", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::GraphUnavailable("down".into()))
        })
        .await;

        assert!(matches!(result, Err(Error::GraphUnavailable(msg)) if msg.contains("OWNS")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = guarded(&fast_policy(5), "User", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::NotFound("User u9".into()))
        })
        .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_becomes_graph_unavailable() {
        let result: Result<()> = guarded(&fast_policy(0), "FOLLOWS", || async {
            sleep(Duration::from_millis(500)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(Error::GraphUnavailable(msg)) if msg.contains("timed out")));
    }
}
