//! Retrying fetch operation
//!
//! Wraps a single remote call with bounded exponential backoff. Transient
//! failures are retried until the budget runs out; permanent failures are
//! returned immediately. The two outcomes stay distinguishable in [`FetchError`].

use crate::rpc::RpcError;
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Retry budget for a single remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt (total attempts = `max_retries + 1`)
    pub max_retries: usize,
    /// Delay before the first retry
    pub min_delay: Duration,
    /// Upper bound on the delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
    }
}

/// Failure of a retried fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every attempt failed transiently and the retry budget is spent.
    #[error("{what} still failing after {attempts} attempts: {source}")]
    Exhausted {
        what: String,
        attempts: usize,
        #[source]
        source: RpcError,
    },

    /// The call failed in a way retrying cannot fix.
    #[error("{what} failed permanently: {source}")]
    Permanent {
        what: String,
        #[source]
        source: RpcError,
    },
}

/// Invoke `call` until it succeeds, fails permanently, or exhausts `config`.
///
/// `what` names the call in logs and errors (e.g. `"block 12775113"`).
pub async fn fetch_with_retry<T, F, Fut>(
    what: &str,
    config: &RetryConfig,
    mut call: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RpcError>>,
{
    let mut attempts = 0usize;
    let result = (|| {
        attempts += 1;
        call()
    })
    .retry(config.backoff())
    .when(RpcError::is_transient)
    .notify(|err: &RpcError, delay: Duration| {
        warn!(call = what, ?delay, error = %err, "Transient RPC failure, retrying");
    })
    .await;

    match result {
        Ok(value) => Ok(value),
        Err(source) if source.is_transient() => Err(FetchError::Exhausted {
            what: what.to_string(),
            attempts,
            source,
        }),
        Err(source) => Err(FetchError::Permanent {
            what: what.to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_retry(max_retries: usize) -> RetryConfig {
        RetryConfig {
            max_retries,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    fn transient() -> RpcError {
        RpcError::Rpc {
            code: -32005,
            message: "limit exceeded".to_string(),
        }
    }

    /// Run a call that fails transiently `failures` times and then returns 42.
    async fn run_scripted(failures: usize, config: RetryConfig) -> (Result<u64, FetchError>, usize) {
        let calls = AtomicUsize::new(0);
        let result = fetch_with_retry("scripted", &config, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < failures {
                    Err(transient())
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        (result, calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_retry_converges_after_k_failures() {
        for k in [0usize, 1, 5] {
            let (result, calls) = run_scripted(k, fast_retry(10)).await;
            assert_eq!(result.unwrap(), 42, "k = {k}");
            assert_eq!(calls, k + 1, "k = {k}");
        }
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let (result, calls) = run_scripted(usize::MAX, fast_retry(3)).await;
        assert_eq!(calls, 4);
        match result.unwrap_err() {
            FetchError::Exhausted { attempts, what, .. } => {
                assert_eq!(attempts, 4);
                assert_eq!(what, "scripted");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<u64, _> = fetch_with_retry("bad request", &fast_retry(10), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(RpcError::Rpc {
                    code: -32602,
                    message: "invalid params".to_string(),
                })
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(FetchError::Permanent { .. })));
    }
}
