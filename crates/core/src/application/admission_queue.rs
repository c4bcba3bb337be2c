//! Admission Queue - bounded concurrent execution for one queue class
//!
//! Each queue owns a FIFO of pending tasks and an in-flight counter guarded by
//! a single mutex. The lock covers bookkeeping only and is never held across
//! the awaited task body.
//!
//! Admission is one idempotent pass, run after every submission and after every
//! completion: while capacity remains and work is pending, pop the head, count
//! it in flight and spawn it. Calling it with nothing to do is a cheap no-op,
//! so redundant passes from racing submitters and completers are harmless.
//!
//! Invariants:
//! - `0 <= in_flight <= max_concurrency` at every observable instant
//! - each pending task is popped exactly once
//! - a task that fails or panics still releases its slot

use crate::domain::{DomainError, QueueConfig, QueueStatus};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Task {task_id} in queue {queue} aborted before producing a result")]
    TaskAborted { queue: String, task_id: u64 },
}

/// Deferred task body; built only once the task is admitted
type TaskBody = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

struct PendingTask {
    id: u64,
    body: TaskBody,
}

struct QueueState {
    pending: VecDeque<PendingTask>,
    in_flight: usize,
}

struct QueueInner {
    name: String,
    max_concurrency: usize,
    next_id: AtomicU64,
    state: Mutex<QueueState>,
}

/// Bounded concurrent queue (cheap to clone, clones share state)
#[derive(Clone)]
pub struct AdmissionQueue {
    inner: Arc<QueueInner>,
}

impl AdmissionQueue {
    /// Create a queue admitting at most `config.max_concurrency` tasks at once
    ///
    /// # Errors
    /// - DomainError::InvalidCapacity if `max_concurrency` is zero
    pub fn new(config: QueueConfig) -> Result<Self, DomainError> {
        if config.max_concurrency == 0 {
            return Err(DomainError::InvalidCapacity { name: config.name });
        }

        Ok(Self {
            inner: Arc::new(QueueInner {
                name: config.name,
                max_concurrency: config.max_concurrency,
                next_id: AtomicU64::new(1),
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    in_flight: 0,
                }),
            }),
        })
    }

    /// Submit an operation and get a handle resolving to its result
    ///
    /// The task is enqueued immediately; `operation` is not called until the
    /// task is admitted. Must be called from within a tokio runtime because
    /// admission spawns the task body.
    pub fn submit<T, F, Fut>(&self, operation: F) -> Completion<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        let body: TaskBody = Box::new(move || {
            async move {
                let result = operation().await;
                // Caller may have stopped waiting; nothing else depends on delivery
                let _ = tx.send(result);
            }
            .boxed()
        });

        let pending = {
            let mut state = self.inner.lock_state();
            state.pending.push_back(PendingTask { id, body });
            state.pending.len()
        };

        debug!(
            queue = %self.inner.name,
            task_id = id,
            pending = pending,
            "Task submitted"
        );

        QueueInner::admit(&self.inner);

        Completion {
            queue: self.inner.name.clone(),
            task_id: id,
            rx,
        }
    }

    pub fn status(&self) -> QueueStatus {
        let state = self.inner.lock_state();
        QueueStatus {
            name: self.inner.name.clone(),
            pending: state.pending.len(),
            in_flight: state.in_flight,
            max_concurrency: self.inner.max_concurrency,
        }
    }
}

impl QueueInner {
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        // Nothing panics while holding this lock
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admission pass; safe to call redundantly
    fn admit(this: &Arc<Self>) {
        let admitted: Vec<PendingTask> = {
            let mut state = this.lock_state();
            let mut batch = Vec::new();
            while state.in_flight < this.max_concurrency {
                match state.pending.pop_front() {
                    Some(task) => {
                        state.in_flight += 1;
                        batch.push(task);
                    }
                    None => break,
                }
            }
            if !batch.is_empty() {
                info!(
                    queue = %this.name,
                    admitted = batch.len(),
                    in_flight = state.in_flight,
                    max_concurrency = this.max_concurrency,
                    pending = state.pending.len(),
                    "Admitting tasks"
                );
            }
            batch
        };

        for task in admitted {
            let queue = Arc::clone(this);
            tokio::spawn(async move {
                let PendingTask { id, body } = task;
                if let Err(panic) = AssertUnwindSafe(body()).catch_unwind().await {
                    error!(
                        queue = %queue.name,
                        task_id = id,
                        panic_msg = %panic_message(&*panic),
                        "Task panicked"
                    );
                }
                queue.complete(id);
            });
        }
    }

    /// Release one slot, then re-run admission
    fn complete(self: &Arc<Self>, task_id: u64) {
        {
            let mut state = self.lock_state();
            debug_assert!(state.in_flight > 0, "completion without admission");
            state.in_flight = state.in_flight.saturating_sub(1);
            debug!(
                queue = %self.name,
                task_id = task_id,
                in_flight = state.in_flight,
                pending = state.pending.len(),
                "Task completed"
            );
        }
        Self::admit(self);
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Handle to a submitted task's result
///
/// Dropping it does not cancel the task; it still runs to completion.
#[must_use = "dropping a Completion discards the task result"]
pub struct Completion<T> {
    queue: String,
    task_id: u64,
    rx: oneshot::Receiver<T>,
}

impl<T> Unpin for Completion<T> {}

impl<T> Future for Completion<T> {
    type Output = Result<T, QueueError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.map_err(|_| QueueError::TaskAborted {
                queue: self.queue.clone(),
                task_id: self.task_id,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;
    use tokio_test::{assert_pending, assert_ready};

    fn queue(capacity: usize) -> AdmissionQueue {
        AdmissionQueue::new(QueueConfig::new("test", capacity)).unwrap()
    }

    /// Submit a task that reports its start and then blocks until released
    fn submit_gated(
        queue: &AdmissionQueue,
        index: usize,
        started: mpsc::UnboundedSender<usize>,
    ) -> (oneshot::Sender<()>, Completion<usize>) {
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let completion = queue.submit(move || async move {
            let _ = started.send(index);
            let _ = release_rx.await;
            index
        });
        (release_tx, completion)
    }

    async fn wait_for_status(queue: &AdmissionQueue, pending: usize, in_flight: usize) {
        timeout(Duration::from_secs(5), async {
            loop {
                let status = queue.status();
                if status.pending == pending && status.in_flight == in_flight {
                    return;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("queue never reached expected status");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = AdmissionQueue::new(QueueConfig::new("empty", 0));
        assert!(matches!(result, Err(DomainError::InvalidCapacity { .. })));
    }

    #[tokio::test]
    async fn test_submit_returns_result() {
        let queue = queue(2);
        let value = queue.submit(|| async { 21 * 2 }).await.unwrap();
        assert_eq!(value, 42);
        wait_for_status(&queue, 0, 0).await;
    }

    #[tokio::test]
    async fn test_capacity_bounds_in_flight() {
        let capacity = 3;
        let extra = 4;
        let queue = queue(capacity);
        let (started_tx, mut started_rx) = mpsc::unbounded_channel();

        let mut releases = Vec::new();
        let mut completions = Vec::new();
        for i in 0..capacity + extra {
            let (release, completion) = submit_gated(&queue, i, started_tx.clone());
            releases.push(Some(release));
            completions.push(completion);
        }

        for _ in 0..capacity {
            started_rx.recv().await.unwrap();
        }
        wait_for_status(&queue, extra, capacity).await;
        assert!(started_rx.try_recv().is_err(), "task started beyond capacity");

        // Each release admits exactly one more
        for step in 0..extra {
            releases[step].take().unwrap().send(()).unwrap();
            let next = started_rx.recv().await.unwrap();
            assert_eq!(next, capacity + step, "admission must follow submission order");
            wait_for_status(&queue, extra - step - 1, capacity).await;
        }

        for release in releases.iter_mut().filter_map(Option::take) {
            release.send(()).unwrap();
        }
        for (i, completion) in completions.into_iter().enumerate() {
            assert_eq!(completion.await.unwrap(), i);
        }
        wait_for_status(&queue, 0, 0).await;
    }

    #[tokio::test]
    async fn test_fifo_admission_with_single_slot() {
        let queue = queue(1);
        let order = Arc::new(Mutex::new(Vec::new()));

        let completions: Vec<_> = (0..5)
            .map(|i| {
                let order = Arc::clone(&order);
                queue.submit(move || async move {
                    tokio::task::yield_now().await;
                    order.lock().unwrap().push(i);
                })
            })
            .collect();

        for completion in completions {
            completion.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_failed_task_releases_slot() {
        let queue = queue(1);
        let failing = queue.submit(|| async { Err::<u32, String>("device offline".to_string()) });
        let next = queue.submit(|| async { Ok::<u32, String>(7) });

        assert_eq!(failing.await.unwrap(), Err("device offline".to_string()));
        assert_eq!(next.await.unwrap(), Ok(7));
        wait_for_status(&queue, 0, 0).await;
    }

    #[tokio::test]
    async fn test_panicking_task_aborts_only_itself() {
        let queue = queue(1);
        let panicking = queue.submit(|| async {
            if true {
                panic!("task body exploded");
            }
            0u32
        });
        let healthy = queue.submit(|| async { 5u32 });

        let err = panicking.await.unwrap_err();
        assert!(matches!(err, QueueError::TaskAborted { ref queue, .. } if queue == "test"));
        assert_eq!(healthy.await.unwrap(), 5);
        wait_for_status(&queue, 0, 0).await;
    }

    #[tokio::test]
    async fn test_operation_deferred_until_admitted() {
        let queue = queue(1);
        let (started_tx, mut started_rx) = mpsc::unbounded_channel();
        let (release, first) = submit_gated(&queue, 0, started_tx);
        started_rx.recv().await.unwrap();

        let called = Arc::new(AtomicU64::new(0));
        let flag = Arc::clone(&called);
        let mut second = tokio_test::task::spawn(queue.submit(move || {
            flag.fetch_add(1, Ordering::SeqCst);
            async { "second" }
        }));

        assert_pending!(second.poll());
        assert_eq!(called.load(Ordering::SeqCst), 0);
        assert_eq!(queue.status().pending, 1);

        release.send(()).unwrap();
        assert_eq!(first.await.unwrap(), 0);
        wait_for_status(&queue, 0, 0).await;
        assert_eq!(called.load(Ordering::SeqCst), 1);
        assert_eq!(assert_ready!(second.poll()).unwrap(), "second");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_invariant_under_concurrent_submission() {
        let capacity = 2;
        let queue = queue(capacity);
        let running = Arc::new(AtomicU64::new(0));
        let peak = Arc::new(AtomicU64::new(0));

        let mut submitters = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let queue = queue.clone();
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            submitters.spawn(async move {
                let mut completions = Vec::new();
                for _ in 0..10 {
                    let running = Arc::clone(&running);
                    let peak = Arc::clone(&peak);
                    completions.push(queue.submit(move || async move {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(1)).await;
                        running.fetch_sub(1, Ordering::SeqCst);
                    }));
                    let status = queue.status();
                    assert!(status.in_flight <= status.max_concurrency);
                }
                for completion in completions {
                    completion.await.unwrap();
                }
            });
        }

        while let Some(result) = submitters.join_next().await {
            result.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= capacity as u64);
        wait_for_status(&queue, 0, 0).await;
    }
}
