//! Fixed-interval refresh loops.
//!
//! A `Poller` fires its task immediately and then every `interval` until the
//! handle is dropped or stopped. Ticks that fall behind are skipped, not
//! bunched. There is no coordination between pollers. A zero interval is
//! raised to `MIN_INTERVAL`.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    /// Start polling on the current tokio runtime.
    #[must_use]
    pub fn start<F, Fut>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                tick().await;
            }
        });
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
