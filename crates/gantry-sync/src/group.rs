//! Bounded task group
//!
//! The concurrency primitive every reconciler fans out through. Two modes
//! behind one type, picked by the configured limit:
//!
//! - limit 1: tasks run synchronously in submission order, fail-fast; after
//!   the first error, later submissions are recorded but never executed.
//! - limit > 1: a counting semaphore gates execution; every submitted task is
//!   started regardless of earlier failures (there is no cancellation), and
//!   `wait` returns the first error it observes, dropping the rest.
//!
//! The serial mode gives deterministic ordering for order-sensitive flows;
//! the parallel mode trades determinism for throughput against network-bound
//! work.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::{Result, SyncError};

/// A group of tasks bounded to a maximum concurrency
pub struct TaskGroup {
    inner: Inner,
}

enum Inner {
    Serial {
        first_error: Option<SyncError>,
        skipped: usize,
    },
    Parallel {
        semaphore: Arc<Semaphore>,
        handles: Vec<JoinHandle<Result<()>>>,
    },
}

impl TaskGroup {
    /// Create a group with the given concurrency limit (0 is treated as 1)
    pub fn new(max_concurrency: usize) -> Self {
        let inner = if max_concurrency <= 1 {
            Inner::Serial {
                first_error: None,
                skipped: 0,
            }
        } else {
            Inner::Parallel {
                semaphore: Arc::new(Semaphore::new(max_concurrency)),
                handles: Vec::new(),
            }
        };
        Self { inner }
    }

    /// Submit a task.
    ///
    /// Serial groups execute it before returning; parallel groups start it
    /// immediately and let it run to completion regardless of other tasks'
    /// failures.
    pub async fn submit<F>(&mut self, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        match &mut self.inner {
            Inner::Serial {
                first_error,
                skipped,
            } => {
                if first_error.is_some() {
                    *skipped += 1;
                    return;
                }
                if let Err(e) = task.await {
                    *first_error = Some(e);
                }
            }
            Inner::Parallel { semaphore, handles } => {
                let semaphore = semaphore.clone();
                handles.push(tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.unwrap();
                    task.await
                }));
            }
        }
    }

    /// Number of submissions a serial group refused after its first error
    pub fn skipped(&self) -> usize {
        match &self.inner {
            Inner::Serial { skipped, .. } => *skipped,
            Inner::Parallel { .. } => 0,
        }
    }

    /// Wait for every started task and return the first error observed.
    ///
    /// Other errors from the same group invocation are dropped, not
    /// aggregated.
    pub async fn wait(self) -> Result<()> {
        match self.inner {
            Inner::Serial { first_error, .. } => match first_error {
                Some(e) => Err(e),
                None => Ok(()),
            },
            Inner::Parallel { handles, .. } => {
                let mut first_error = None;
                for handle in handles {
                    let result = match handle.await {
                        Ok(r) => r,
                        Err(e) => Err(SyncError::TaskPanicked(e.to_string())),
                    };
                    if let Err(e) = result {
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
                match first_error {
                    Some(e) => Err(e),
                    None => Ok(()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn boom(label: &str) -> SyncError {
        SyncError::TaskPanicked(label.to_string())
    }

    #[tokio::test]
    async fn test_serial_runs_in_submission_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut group = TaskGroup::new(1);

        for label in ["a", "b", "c"] {
            let order = order.clone();
            group
                .submit(async move {
                    order.lock().unwrap().push(label);
                    Ok(())
                })
                .await;
        }

        group.wait().await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_serial_is_fail_fast() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut group = TaskGroup::new(1);

        {
            let order = order.clone();
            group
                .submit(async move {
                    order.lock().unwrap().push("a");
                    Ok(())
                })
                .await;
        }
        {
            let order = order.clone();
            group
                .submit(async move {
                    order.lock().unwrap().push("b");
                    Err(boom("b failed"))
                })
                .await;
        }
        {
            let order = order.clone();
            group
                .submit(async move {
                    order.lock().unwrap().push("c");
                    Ok(())
                })
                .await;
        }

        assert_eq!(group.skipped(), 1);
        let err = group.wait().await.unwrap_err();
        assert!(err.to_string().contains("b failed"));
        // c was recorded as a no-op, never executed
        assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_parallel_runs_every_task_despite_failure() {
        let executed = Arc::new(AtomicUsize::new(0));
        let mut group = TaskGroup::new(3);

        {
            let executed = executed.clone();
            group
                .submit(async move {
                    executed.fetch_add(1, Ordering::SeqCst);
                    Err(boom("a failed"))
                })
                .await;
        }
        for _ in 0..2 {
            let executed = executed.clone();
            group
                .submit(async move {
                    executed.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .await;
        }

        let err = group.wait().await.unwrap_err();
        // some single error surfaced; every task still executed
        assert!(err.to_string().contains("failed"));
        assert_eq!(executed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_parallel_respects_concurrency_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));
        let mut group = TaskGroup::new(2);

        for _ in 0..8 {
            let in_flight = in_flight.clone();
            let high_water = high_water.clone();
            group
                .submit(async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    high_water.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await;
        }

        group.wait().await.unwrap();
        assert!(high_water.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_empty_group_waits_clean() {
        let group = TaskGroup::new(4);
        group.wait().await.unwrap();
    }
}
