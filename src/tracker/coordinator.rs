//! Tracking of in-flight path operations.
//!
//! Every tracked operation is spawned onto the runtime and registered in a
//! pending table. Settling (success, error or panic) removes the entry and
//! flips its completion signal under the same lock, so a drain can never
//! observe a finished operation as pending or miss an unfinished one.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::Result;

/// Registry of pending operations with a snapshot drain barrier.
#[derive(Debug, Clone, Default)]
pub struct OperationCoordinator {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, watch::Receiver<bool>>>,
}

/// Handle to a tracked operation.
///
/// Resolves once the operation has settled. Dropping the handle does not
/// cancel the operation.
#[derive(Debug)]
pub struct PendingOperation {
    id: u64,
    handle: JoinHandle<()>,
}

impl PendingOperation {
    /// Identifier assigned at registration.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl Future for PendingOperation {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Ready(Ok(())) => Poll::Ready(()),
            Poll::Ready(Err(e)) => {
                tracing::error!(op = self.id, error = %e, "Tracked operation aborted");
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Removes the operation from the pending table when dropped.
struct Settle {
    id: u64,
    inner: Arc<Inner>,
    done_tx: watch::Sender<bool>,
}

impl Drop for Settle {
    fn drop(&mut self) {
        let mut pending = self.inner.pending.lock();
        pending.remove(&self.id);
        self.done_tx.send_replace(true);
    }
}

impl OperationCoordinator {
    /// Create an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register and start `task`.
    ///
    /// The task is spawned immediately and always runs to completion. Its
    /// error, if any, is logged here and goes no further.
    pub fn track<F>(&self, task: F) -> PendingOperation
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (done_tx, done_rx) = watch::channel(false);
        self.inner.pending.lock().insert(id, done_rx);

        let settle = Settle {
            id,
            inner: Arc::clone(&self.inner),
            done_tx,
        };

        let handle = tokio::spawn(async move {
            let _settle = settle;
            if let Err(e) = task.await {
                tracing::error!(op = id, error = %e, "Tracked operation failed");
            }
        });

        PendingOperation { id, handle }
    }

    /// Wait for every operation registered before this call to settle.
    ///
    /// The set of operations is captured when `drain` is called, not when
    /// the returned future is first polled. Work registered afterwards is
    /// not waited for.
    pub fn drain(&self) -> impl Future<Output = ()> + Send + 'static {
        let waiting: Vec<watch::Receiver<bool>> =
            self.inner.pending.lock().values().cloned().collect();

        async move {
            if waiting.is_empty() {
                return;
            }
            tracing::debug!(pending = waiting.len(), "Draining pending operations");
            join_all(waiting.into_iter().map(|mut done_rx| async move {
                // A closed channel also means the operation settled.
                let _ = done_rx.wait_for(|done| *done).await;
            }))
            .await;
        }
    }

    /// Number of operations still in flight.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_drain_waits_for_all_pending() {
        let coordinator = OperationCoordinator::new();
        let finished = Arc::new(AtomicUsize::new(0));

        for delay in [30_u64, 10, 50, 20, 40] {
            let finished = Arc::clone(&finished);
            drop(coordinator.track(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }
        assert_eq!(coordinator.pending_count(), 5);

        coordinator.drain().await;
        assert_eq!(finished.load(Ordering::SeqCst), 5);
        assert_eq!(coordinator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_drain_with_nothing_pending() {
        let coordinator = OperationCoordinator::new();
        coordinator.drain().await;
        assert_eq!(coordinator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_operation_settles() {
        let coordinator = OperationCoordinator::new();
        let op = coordinator.track(async { Err(Error::internal("stat exploded")) });

        op.await;
        coordinator.drain().await;
        assert_eq!(coordinator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_panicking_operation_settles() {
        let coordinator = OperationCoordinator::new();
        #[allow(unreachable_code)]
        let op = coordinator.track(async {
            panic!("boom");
            Ok(())
        });

        op.await;
        assert_eq!(coordinator.pending_count(), 0);
        coordinator.drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_is_a_snapshot_barrier() {
        let coordinator = OperationCoordinator::new();

        drop(coordinator.track(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(())
        }));
        let drain = coordinator.drain();

        drop(coordinator.track(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }));

        tokio::time::timeout(Duration::from_secs(1), drain)
            .await
            .expect("drain should not wait for later work");
        assert_eq!(coordinator.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_dropped_handle_still_completes() {
        let coordinator = OperationCoordinator::new();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let op = coordinator.track(async move {
            let _ = tx.send(());
            Ok(())
        });
        drop(op);

        rx.await.unwrap();
        coordinator.drain().await;
        assert_eq!(coordinator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let coordinator = OperationCoordinator::new();
        let a = coordinator.track(async { Ok(()) });
        let b = coordinator.track(async { Ok(()) });
        assert_ne!(a.id(), b.id());
        a.await;
        b.await;
    }
}
