//! Per-task execution: timeout, cancellation checks, and exponential backoff
//! between retry attempts.

use crate::error::ReplicatorError;
use crate::planner::SyncResult;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            attempts: 3,
            backoff_base: Duration::from_secs(5),
        }
    }
}

/// Run one task to completion under `policy`, retrying on failure with
/// exponential backoff (`backoff_base · 2^(attempt-1)`), honoring cancellation
/// before every attempt and during every backoff sleep.
///
/// `attempt_fn` performs one attempt and returns bytes copied on success.
pub async fn run_with_retry<F, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    mut attempt_fn: F,
) -> SyncResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = crate::error::Result<u64>>,
{
    let started = Instant::now();

    if cancel.is_cancelled() {
        return cancelled_result(0, started, "cancelled before first attempt".to_string());
    }

    let mut last_error: Option<String> = None;

    for attempt in 0..policy.attempts.max(1) {
        if attempt > 0 {
            let backoff = policy.backoff_base * 2u32.pow(attempt - 1);
            tokio::select! {
                _ = tokio::time::sleep(backoff) => {}
                _ = cancel.cancelled() => {
                    return cancelled_result(attempt as usize, started, "cancelled during backoff".to_string());
                }
            }
        }

        if cancel.is_cancelled() {
            return cancelled_result(attempt as usize, started, "cancelled before attempt".to_string());
        }

        let attempt_result = tokio::select! {
            res = timeout(policy.timeout, attempt_fn()) => res,
            _ = cancel.cancelled() => {
                return cancelled_result(attempt as usize, started, "cancelled during attempt".to_string());
            }
        };

        match attempt_result {
            Ok(Ok(bytes_copied)) => {
                return SyncResult {
                    success: true,
                    error: None,
                    bytes_copied,
                    duration_ms: started.elapsed().as_millis() as u64,
                    retries: attempt,
                    skipped: false,
                    skip_reason: None,
                };
            }
            Ok(Err(err)) => last_error = Some(err.to_string()),
            Err(_elapsed) => last_error = Some(format!("task deadline exceeded after {:?}", policy.timeout)),
        }
    }

    SyncResult {
        success: false,
        error: last_error.or_else(|| Some("no attempts were made".to_string())),
        bytes_copied: 0,
        duration_ms: started.elapsed().as_millis() as u64,
        retries: policy.attempts,
        skipped: false,
        skip_reason: None,
    }
}

fn cancelled_result(attempts: usize, started: Instant, cause: String) -> SyncResult {
    let err = ReplicatorError::ContextCancelled {
        attempts,
        elapsed: started.elapsed(),
        cause,
    };
    SyncResult {
        success: false,
        error: Some(err.to_string()),
        bytes_copied: 0,
        duration_ms: started.elapsed().as_millis() as u64,
        retries: attempts as u32,
        skipped: false,
        skip_reason: None,
    }
}
