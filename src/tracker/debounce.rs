//! Trailing-edge debouncing of workspace updates.
//!
//! A single actor task owns the timer. Requests arrive over a channel; the
//! first one moves the actor from idle to pending, every later one pushes the
//! deadline out again. When the deadline passes the actor drains pending
//! operations, emits one snapshot and answers every request it collected.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::coordinator::OperationCoordinator;
use super::emitter::SnapshotEmitter;
use crate::error::TrackerError;
use crate::observability::spans;
use crate::Result;

type Waiter = oneshot::Sender<()>;

/// Coalesces update requests into one emission per quiet period.
#[derive(Debug)]
pub struct DebounceScheduler {
    request_tx: mpsc::UnboundedSender<Waiter>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DebounceScheduler {
    /// Start the scheduler actor.
    #[must_use]
    pub fn spawn(
        window: Duration,
        coordinator: OperationCoordinator,
        emitter: SnapshotEmitter,
    ) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(
            window,
            request_rx,
            coordinator,
            emitter,
            cancel.clone(),
        ));

        Self {
            request_tx,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    /// Ask for an update.
    ///
    /// The request is queued when this is called. The returned future
    /// resolves once the emission that absorbed it has been delivered; every
    /// request in a burst observes the same emission.
    pub fn request_update(&self) -> impl Future<Output = Result<()>> + Send + 'static {
        let (done_tx, done_rx) = oneshot::channel();
        let queued = !self.cancel.is_cancelled() && self.request_tx.send(done_tx).is_ok();
        let cancel = self.cancel.clone();

        async move {
            if queued && done_rx.await.is_ok() {
                return Ok(());
            }
            if cancel.is_cancelled() {
                Err(TrackerError::Disposed.into())
            } else {
                Err(TrackerError::SchedulerClosed.into())
            }
        }
    }

    /// Cancel any pending timer and stop the actor.
    ///
    /// Outstanding requests resolve with [`TrackerError::Disposed`].
    pub fn cancel(&self) {
        self.cancel.cancel();
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

async fn run(
    window: Duration,
    mut request_rx: mpsc::UnboundedReceiver<Waiter>,
    coordinator: OperationCoordinator,
    emitter: SnapshotEmitter,
    cancel: CancellationToken,
) {
    let mut cycle: u64 = 0;

    loop {
        let first = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            next = request_rx.recv() => match next {
                Some(waiter) => waiter,
                None => return,
            },
        };

        let mut waiters = vec![first];
        let timer = tokio::time::sleep(window);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                // Queued requests join this cycle even if the deadline already passed.
                next = request_rx.recv() => match next {
                    Some(waiter) => {
                        waiters.push(waiter);
                        timer.as_mut().reset(Instant::now() + window);
                    }
                    None => return,
                },
                () = &mut timer => break,
            }
        }

        cycle += 1;
        let emission = async {
            coordinator.drain().await;
            emitter.emit();
        }
        .instrument(spans::emission_span(cycle, waiters.len()));

        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = emission => {}
        }

        for waiter in waiters {
            let _ = waiter.send(());
        }
    }
}
