//! Adaptive batch executor: the engine's top-level `Execute(tasks) -> results`
//! operation.

pub mod adaptive;
pub mod retry;

use crate::error::{ReplicatorError, Result};
use crate::logging::Logger;
use crate::planner::{SyncResult, SyncTask};
use adaptive::AdaptiveStats;
use retry::{run_with_retry, RetryPolicy};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub parallel: usize,
    pub batch_size: usize,
    pub enable_adaptive_batching: bool,
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    pub retry_policy: RetryPolicy,
    pub continue_on_error: bool,
    /// Intra-batch fan-out cap. `None` means unbounded — the batch size is the
    /// only limit, per the executor's default behavior.
    pub max_intra_batch: Option<usize>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            parallel: 3,
            batch_size: 10,
            enable_adaptive_batching: false,
            min_batch_size: 1,
            max_batch_size: 50,
            retry_policy: RetryPolicy::default(),
            continue_on_error: false,
            max_intra_batch: None,
        }
    }
}

pub struct Executor {
    config: ExecutorConfig,
    stats: AdaptiveStats,
    logger: Logger,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        let stats = AdaptiveStats::new(config.batch_size, config.min_batch_size, config.max_batch_size);
        Self { config, stats, logger: Logger::new(false) }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    fn current_batch_size(&self) -> usize {
        if self.config.enable_adaptive_batching {
            self.stats.current_size().max(1)
        } else {
            self.config.batch_size.max(1)
        }
    }

    /// Drive `tasks` through bounded-concurrency batches. `run_task` performs one
    /// task's copy and returns bytes copied; the retry/timeout/cancellation wiring
    /// around it is supplied by the executor, not the caller.
    pub async fn execute<F, Fut>(
        &mut self,
        tasks: &[SyncTask],
        cancel: CancellationToken,
        run_task: F,
    ) -> Result<Vec<SyncResult>>
    where
        F: Fn(SyncTask) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = crate::error::Result<u64>> + Send + 'static,
    {
        let run_task = Arc::new(run_task);
        let mut results: Vec<Option<SyncResult>> = (0..tasks.len()).map(|_| None).collect();
        let semaphore = Arc::new(Semaphore::new(self.config.parallel.max(1)));

        let mut offset = 0;
        let mut batch_errors = 0usize;
        let mut total_batches = 0usize;

        while offset < tasks.len() {
            let batch_size = self.current_batch_size();
            let end = (offset + batch_size).min(tasks.len());
            let batch = &tasks[offset..end];
            total_batches += 1;

            let permit = semaphore.clone().acquire_owned().await.expect("semaphore not closed");
            let batch_started = Instant::now();

            let intra_limit = self.config.max_intra_batch;
            let intra_semaphore = intra_limit.map(|n| Arc::new(Semaphore::new(n.max(1))));
            let mut handles = Vec::with_capacity(batch.len());

            for (local_idx, task) in batch.iter().cloned().enumerate() {
                let global_idx = offset + local_idx;
                let policy = self.config.retry_policy;
                let cancel = cancel.clone();
                let run_task = run_task.clone();
                let intra_semaphore = intra_semaphore.clone();

                let handle = tokio::spawn(async move {
                    let _intra_permit = match &intra_semaphore {
                        Some(sem) => Some(sem.clone().acquire_owned().await.expect("semaphore not closed")),
                        None => None,
                    };
                    run_with_retry(policy, &cancel, || run_task(task.clone())).await
                });
                handles.push((global_idx, handle));
            }

            for (global_idx, handle) in handles {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(_join_error) => SyncResult::cancelled_before_first_attempt("task panicked".to_string()),
                };
                results[global_idx] = Some(result);
            }
            drop(permit);

            let batch_results: Vec<&SyncResult> = results[offset..end].iter().filter_map(|r| r.as_ref()).collect();
            let successes = batch_results.iter().filter(|r| r.success).count();
            let success_rate = if batch_results.is_empty() { 1.0 } else { successes as f64 / batch_results.len() as f64 };
            let avg_duration_ms = if batch_results.is_empty() {
                0.0
            } else {
                batch_results.iter().map(|r| r.duration_ms as f64).sum::<f64>() / batch_results.len() as f64
            };

            if self.config.enable_adaptive_batching {
                self.stats.record_batch(success_rate, avg_duration_ms, Instant::now());
            }

            if successes < batch_results.len() {
                batch_errors += 1;
                self.logger.warning(&format!(
                    "batch [{offset}..{end}) finished in {:?} with {}/{} successes",
                    batch_started.elapsed(),
                    successes,
                    batch_results.len()
                ));
            }

            offset = end;
        }

        let final_results: Vec<SyncResult> = results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| SyncResult::cancelled_before_first_attempt("task never scheduled".to_string())))
            .collect();

        if batch_errors > 0 && !self.config.continue_on_error {
            return Err(ReplicatorError::BatchAggregate {
                failed_batches: batch_errors,
                total_batches,
            });
        }

        Ok(final_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn task(priority: i32) -> SyncTask {
        SyncTask {
            source_registry: "src".to_string(),
            source_repository: "repo".to_string(),
            source_tag: "tag".to_string(),
            destination_registry: "dst".to_string(),
            destination_repository: "repo".to_string(),
            destination_tag: "tag".to_string(),
            architecture: None,
            sign_verification: None,
            priority,
            estimated_size: None,
        }
    }

    #[tokio::test]
    async fn writes_exactly_one_result_per_task() {
        let tasks: Vec<SyncTask> = (0..7).map(|i| task(i)).collect();
        let mut executor = Executor::new(ExecutorConfig { batch_size: 3, parallel: 2, ..Default::default() });
        let results = executor
            .execute(&tasks, CancellationToken::new(), |_t| async { Ok(10u64) })
            .await
            .unwrap();
        assert_eq!(results.len(), 7);
        assert!(results.iter().all(|r| r.success));
    }

    #[tokio::test]
    async fn continue_on_error_false_surfaces_aggregate_error() {
        let tasks: Vec<SyncTask> = (0..4).map(|i| task(i)).collect();
        let mut executor = Executor::new(ExecutorConfig {
            batch_size: 2,
            parallel: 1,
            continue_on_error: false,
            retry_policy: RetryPolicy { attempts: 1, ..RetryPolicy::default() },
            ..Default::default()
        });
        let result = executor
            .execute(&tasks, CancellationToken::new(), |_t| async {
                Err(ReplicatorError::CopyFailed {
                    source: "s".to_string(),
                    destination: "d".to_string(),
                    message: "boom".to_string(),
                })
            })
            .await;
        assert!(matches!(result, Err(ReplicatorError::BatchAggregate { .. })));
    }

    #[tokio::test]
    async fn continue_on_error_true_returns_partial_results() {
        let tasks: Vec<SyncTask> = (0..4).map(|i| task(i)).collect();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let mut executor = Executor::new(ExecutorConfig {
            batch_size: 2,
            parallel: 1,
            continue_on_error: true,
            retry_policy: RetryPolicy { attempts: 1, ..RetryPolicy::default() },
            ..Default::default()
        });
        let results = executor
            .execute(&tasks, CancellationToken::new(), move |_t| {
                let calls = calls_clone.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n % 2 == 0 {
                        Ok(10)
                    } else {
                        Err(ReplicatorError::CopyFailed {
                            source: "s".to_string(),
                            destination: "d".to_string(),
                            message: "boom".to_string(),
                        })
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 4);
    }
}
