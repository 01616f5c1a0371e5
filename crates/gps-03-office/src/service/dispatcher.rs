//! Bounded pool for next-hop dispatch.
//!
//! Hops are spawned immediately so the caller never waits; each spawned
//! task then waits for a permit, which bounds how many hops one office
//! drives concurrently.

use std::future::Future;
use std::sync::Arc;

use gps_telemetry::IN_FLIGHT_HOPS;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::debug;

/// Semaphore-bounded task spawner with a tracker for draining.
#[derive(Debug, Clone)]
pub struct HopDispatcher {
    tracker: TaskTracker,
    permits: Arc<Semaphore>,
    pool_size: usize,
}

impl HopDispatcher {
    pub fn new(pool_size: usize) -> Self {
        Self {
            tracker: TaskTracker::new(),
            permits: Arc::new(Semaphore::new(pool_size)),
            pool_size,
        }
    }

    /// Run `hop` on the pool. Returns without waiting for it to start.
    ///
    /// After `close`, queued hops that have not yet started are dropped.
    pub fn spawn<F>(&self, hop: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        self.tracker.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                debug!("Dispatcher closed, hop abandoned");
                return;
            };
            IN_FLIGHT_HOPS.inc();
            hop.await;
            IN_FLIGHT_HOPS.dec();
        });
    }

    /// Hops spawned and not yet finished (including those waiting for a
    /// permit).
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Wait until every hop spawned so far has finished.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        if !self.permits.is_closed() {
            self.tracker.reopen();
        }
    }

    /// Refuse new work. Hops already holding a permit run to completion.
    pub fn close(&self) {
        self.permits.close();
        self.tracker.close();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}
