//! Paced request queue for bursty admin writes.
//!
//! DESIGN
//! ======
//! A single worker task drains an unbounded FIFO. Before each dispatch it
//! waits until:
//! - any 429 recovery window has ended, and
//! - `min_delay` has passed since the previous dispatch (doubled while the
//!   post-429 backoff period is active).
//!
//! Each job reports whether it was rate limited; the worker owns all pacing
//! state so no locking is needed.
//!
//! TRADE-OFFS
//! ==========
//! No priority, cancellation or persistence. A caller that stops awaiting its
//! future does not remove the job; the work still runs and its result is
//! discarded.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::QueueConfig;
use crate::error::ApiError;

/// Type-erased unit of work. Resolves to `true` when the backend answered 429.
type Job = Box<dyn FnOnce() -> BoxFuture<'static, bool> + Send>;

#[derive(Clone)]
pub struct RequestQueue {
    tx: mpsc::UnboundedSender<Job>,
    pending: Arc<AtomicUsize>,
}

impl RequestQueue {
    /// Spawn the worker on the current tokio runtime.
    #[must_use]
    pub fn spawn(config: QueueConfig) -> Self {
        let (queue, _handle) = Self::spawn_with_handle(config);
        queue
    }

    /// Spawn the worker and return its handle. The worker exits once every
    /// `RequestQueue` clone is dropped and the backlog is drained.
    #[must_use]
    pub fn spawn_with_handle(config: QueueConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let handle = tokio::spawn(run_worker(rx, config, pending.clone()));
        (Self { tx, pending }, handle)
    }

    /// Jobs enqueued but not yet finished.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Append `work` to the queue and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns whatever `work` returns, or `ApiError::QueueClosed` if the
    /// worker has stopped.
    pub async fn enqueue<F, Fut, T>(&self, work: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            Box::pin(async move {
                let result = work().await;
                let limited = matches!(&result, Err(e) if e.is_rate_limited());
                let _ = result_tx.send(result);
                limited
            })
        });

        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(ApiError::QueueClosed);
        }
        result_rx.await.map_err(|_| ApiError::QueueClosed)?
    }
}

// =============================================================================
// WORKER
// =============================================================================

/// Pacing state owned by the worker.
#[derive(Debug, Default)]
struct Pacer {
    last_dispatch: Option<Instant>,
    recovery_until: Option<Instant>,
    backoff_until: Option<Instant>,
}

impl Pacer {
    /// Earliest instant the next job may start.
    fn next_slot(&self, config: &QueueConfig, now: Instant) -> Instant {
        let mut slot = now;
        if let Some(until) = self.recovery_until {
            slot = slot.max(until);
        }
        if let Some(last) = self.last_dispatch {
            let backoff = self.backoff_until.is_some_and(|until| now < until);
            let gap = if backoff { config.min_delay * 2 } else { config.min_delay };
            slot = slot.max(last + gap);
        }
        slot
    }

    fn record_rate_limited(&mut self, config: &QueueConfig, now: Instant) {
        self.recovery_until = Some(now + config.recovery_window);
        self.backoff_until = Some(now + config.backoff_period);
    }
}

async fn run_worker(mut rx: mpsc::UnboundedReceiver<Job>, config: QueueConfig, pending: Arc<AtomicUsize>) {
    let mut pacer = Pacer::default();
    while let Some(job) = rx.recv().await {
        let now = Instant::now();
        let slot = pacer.next_slot(&config, now);
        if slot > now {
            let wait: Duration = slot - now;
            if pacer.recovery_until.is_some_and(|until| until > now) {
                warn!(wait_ms = wait.as_millis(), "request queue waiting out rate-limit recovery");
            } else {
                debug!(wait_ms = wait.as_millis(), "request queue pacing");
            }
            tokio::time::sleep_until(slot).await;
        }

        pacer.last_dispatch = Some(Instant::now());
        let limited = job().await;
        pending.fetch_sub(1, Ordering::SeqCst);
        if limited {
            let now = Instant::now();
            warn!(
                recovery_secs = config.recovery_window.as_secs(),
                "rate limited (429); entering recovery window"
            );
            pacer.record_rate_limited(&config, now);
        }
    }
    debug!("request queue worker stopped");
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
