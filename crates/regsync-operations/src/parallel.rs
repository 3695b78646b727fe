//! Bounded fan-out of independent units of work.

use std::{future::Future, sync::Arc};

use tokio::sync::Semaphore;
use tracing::error;

use crate::error::{OperationError, Result};

/// Runs every task with at most `max_concurrency` of them in flight and collects all errors.
///
/// Every task runs to completion regardless of its siblings. A ceiling of zero is treated as
/// one. A panicking task is reported as [`OperationError::TaskFailed`]. The returned errors
/// are in no particular order.
pub async fn run_all<I, Fut>(tasks: I, max_concurrency: usize) -> Vec<OperationError>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut handles = Vec::new();

    for task in tasks {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => unreachable!("task semaphore is never closed"),
        };
        handles.push(tokio::spawn(async move {
            let result = task.await;
            drop(permit);
            result
        }));
    }

    let mut errors = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => errors.push(err),
            Err(err) => {
                error!("task failed: {err}");
                errors.push(OperationError::TaskFailed(err.to_string()));
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;

    #[tokio::test]
    async fn test_all_tasks_run_and_errors_are_collected() {
        let done = Arc::new(AtomicUsize::new(0));
        let tasks = (0..10).map(|i| {
            let done = done.clone();
            async move {
                done.fetch_add(1, Ordering::SeqCst);
                if i % 3 == 0 {
                    Err(OperationError::Custom(format!("task {i}")))
                } else {
                    Ok(())
                }
            }
        });

        let errors = run_all(tasks, 3).await;
        assert_eq!(done.load(Ordering::SeqCst), 10);
        assert_eq!(errors.len(), 4);
    }

    #[tokio::test]
    async fn test_concurrency_ceiling() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let tasks = (0..12).map(|_| {
            let running = running.clone();
            let peak = peak.clone();
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        });

        assert!(run_all(tasks, 4).await.is_empty());
        assert!(peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_zero_ceiling_runs_serially() {
        let peak = Arc::new(AtomicUsize::new(0));
        let running = Arc::new(AtomicUsize::new(0));
        let tasks = (0..3).map(|_| {
            let running = running.clone();
            let peak = peak.clone();
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        });

        assert!(run_all(tasks, 0).await.is_empty());
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    async fn outcome(explode: bool) -> Result<()> {
        if explode {
            panic!("boom");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_panicking_task_is_reported() {
        let errors = run_all([outcome(false), outcome(true), outcome(false)], 2).await;
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], OperationError::TaskFailed(_)));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let tasks: Vec<std::future::Ready<Result<()>>> = Vec::new();
        assert!(run_all(tasks, 5).await.is_empty());
    }
}
