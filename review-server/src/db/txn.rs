//! Transaction retry boundary
//!
//! Every aggregate mutation follows the same shape: read the current
//! state, compute the replacement with a pure function, and commit both
//! writes behind a version check. A failed version check (or a busy
//! database) means a concurrent writer got there first; the computation
//! must be re-run against fresh state, never committed from the stale
//! read. [`TxnRetry::run`] owns that loop and the retry budget.

use shared::error::{AppError, AppResult};
use std::future::Future;

/// Bounded optimistic-transaction runner
#[derive(Debug, Clone, Copy)]
pub struct TxnRetry {
    max_retries: u32,
}

impl TxnRetry {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Run `attempt` until it commits or the retry budget is exhausted.
    ///
    /// The closure performs one full read-compute-commit cycle and
    /// reports `Ok(Some(value))` on commit, `Ok(None)` when the commit
    /// lost a version check and must be recomputed, or `Err` for any
    /// terminal failure (validation, not-found, real database errors).
    /// Exhaustion surfaces as `ConcurrencyConflict`.
    pub async fn run<T, F, Fut>(&self, op: &'static str, attempt: F) -> AppResult<T>
    where
        F: Fn(u32) -> Fut,
        Fut: Future<Output = AppResult<Option<T>>>,
    {
        // First try plus `max_retries` re-runs
        for round in 0..=self.max_retries {
            match attempt(round).await? {
                Some(value) => {
                    if round > 0 {
                        tracing::debug!(op, round, "Transaction committed after retry");
                    }
                    return Ok(value);
                }
                None => {
                    tracing::debug!(op, round, "Write conflict, re-reading");
                }
            }
        }

        tracing::warn!(op, retries = self.max_retries, "Transaction retry budget exhausted");
        Err(AppError::concurrency_conflict(format!(
            "{op}: conflicting writers exhausted {} retries",
            self.max_retries
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_commits_first_try() {
        let txn = TxnRetry::new(3);
        let result = txn.run("op", |_| async { Ok(Some(42)) }).await.unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn test_retries_until_commit() {
        let txn = TxnRetry::new(3);
        let attempts = AtomicU32::new(0);
        let result = txn
            .run("op", |_| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move { Ok(if n < 2 { None } else { Some("done") }) }
            })
            .await
            .unwrap();
        assert_eq!(result, "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_is_concurrency_conflict() {
        let txn = TxnRetry::new(2);
        let err = txn
            .run("op", |_| async { Ok(None::<i32>) })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConcurrencyConflict);
    }

    #[tokio::test]
    async fn test_terminal_error_is_not_retried() {
        let txn = TxnRetry::new(5);
        let attempts = AtomicU32::new(0);
        let err = txn
            .run("op", |_| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<Option<i32>, _>(AppError::validation("bad input")) }
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
