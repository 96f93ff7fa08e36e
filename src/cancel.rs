//! Cancellation and deadlines for adapter operations.
//!
//! The losing future is dropped, and with it any connection it had checked
//! out: short-mode connections are closed. A persistent session whose
//! operation was dropped mid-command replaces its connection on the next call,
//! and discards it rather than returning it to the pool at cleanup.

use std::future::Future;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::KvBenchError;

/// Run `op` unless `token` is cancelled first.
///
/// # Errors
/// Returns `KvBenchError::Cancelled` if the token fires before `op` finishes,
/// otherwise whatever `op` returns.
pub async fn with_cancellation<T, F>(token: &CancellationToken, op: F) -> Result<T, KvBenchError>
where
    F: Future<Output = Result<T, KvBenchError>>,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Err(KvBenchError::Cancelled),
        result = op => result,
    }
}

/// Run `op`, giving up at `deadline`.
///
/// # Errors
/// Returns `KvBenchError::DeadlineExceeded` if `op` is still running at the deadline.
pub async fn with_deadline<T, F>(deadline: Instant, op: F) -> Result<T, KvBenchError>
where
    F: Future<Output = Result<T, KvBenchError>>,
{
    tokio::time::timeout_at(deadline, op)
        .await
        .unwrap_or(Err(KvBenchError::DeadlineExceeded))
}
