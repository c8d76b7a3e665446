//! `RetryManager::execute_with_retry`: bounded exponential backoff with
//! a caller-supplied retry predicate and cancellation support.
//!
//! Grounded on the teacher's former `generate_text/retries.rs`
//! (`RetryConfig`, `RetryFunction`, `prepare_retries`,
//! `retry_with_exponential_backoff_respecting_retry_headers`) and
//! `error/retryable_error.rs`'s retry-after-aware error shape, now
//! generalized to any `Future`-returning operation rather than being
//! wired specifically into text generation.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

/// Backoff policy for [`execute_with_retry`].
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryConfig {
    /// Production defaults: exponential backoff starting at 1 second.
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries, base_delay: Duration::from_secs(1), max_delay: Duration::from_secs(30) }
    }

    /// Test-mode defaults: 1ms base delay, matching `spec.md` §4.10's
    /// "test-mode uses 1ms base delay" rule so unit tests don't sleep for
    /// real backoff durations.
    pub fn test_mode(max_retries: u32) -> Self {
        Self { max_retries, base_delay: Duration::from_millis(1), max_delay: Duration::from_millis(100) }
    }

    fn delay_for_attempt(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(hint) = retry_after {
            return hint.min(self.max_delay);
        }
        let exp = self.base_delay.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        exp.min(self.max_delay)
    }
}

/// Runs `op` up to `config.max_retries` additional times beyond the
/// first attempt. Retries only while `should_retry(&error, attempt)`
/// returns true; otherwise the error is returned immediately. Honors
/// `cancel` between attempts, failing with [`CoreError::Cancelled`].
pub async fn execute_with_retry<T, F, Fut, R>(
    config: RetryConfig,
    cancel: &CancellationToken,
    should_retry: R,
    mut op: F,
) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
    R: Fn(&CoreError, u32) -> bool,
{
    let mut attempt: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !should_retry(&error, attempt) {
                    return Err(error);
                }
                if attempt >= config.max_retries {
                    return Err(CoreError::RetryExhausted { attempts: attempt + 1, last_error: error.to_string() });
                }
                let delay = config.delay_for_attempt(attempt, error.retry_after());
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return Err(CoreError::Cancelled),
                }
                attempt += 1;
            }
        }
    }
}

/// Default `should_retry` predicate combining transient-network/5xx and
/// rate-limit classification with `CoreError::is_retryable`.
pub fn default_should_retry(error: &CoreError, _attempt: u32) -> bool {
    error.is_retryable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry_when_op_succeeds_first_try() {
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let result = execute_with_retry(RetryConfig::test_mode(3), &cancel, default_should_retry, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, CoreError>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success_within_budget() {
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let result = execute_with_retry(RetryConfig::test_mode(3), &cancel, default_should_retry, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(crate::error::RetryableErrorBuilder::new("transient").build())
                } else {
                    Ok::<_, CoreError>("done")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_when_should_retry_returns_false() {
        let cancel = CancellationToken::new();
        let result = execute_with_retry(RetryConfig::test_mode(5), &cancel, |_, _| false, || async {
            Err::<(), _>(CoreError::invalid_argument("x", "bad"))
        })
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn stops_retrying_once_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = execute_with_retry(RetryConfig::test_mode(5), &cancel, default_should_retry, || async {
            Err::<(), _>(crate::error::RetryableErrorBuilder::new("x").build())
        })
        .await;
        assert!(matches!(result, Err(CoreError::Cancelled)));
    }
}
