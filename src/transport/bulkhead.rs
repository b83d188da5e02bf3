//! Bounded worker pool isolating one external dependency.

use super::config::BulkheadConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Admission control for requests to a single dependency.
///
/// At most `workers` requests execute at once and at most `queue_depth`
/// more wait for a worker. Anything beyond that is refused immediately by
/// [`try_reserve`](Self::try_reserve) instead of queueing without bound.
#[derive(Debug, Clone)]
pub struct Bulkhead {
    workers: Arc<Semaphore>,
    occupied: Arc<AtomicUsize>,
    capacity: usize,
}

impl Bulkhead {
    /// Create a bulkhead from its bounds.
    pub fn new(config: BulkheadConfig) -> Self {
        Self {
            workers: Arc::new(Semaphore::new(config.workers)),
            occupied: Arc::new(AtomicUsize::new(0)),
            capacity: config.capacity(),
        }
    }

    /// Maximum number of requests executing or waiting.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of requests currently executing or waiting.
    pub fn occupied(&self) -> usize {
        self.occupied.load(Ordering::Acquire)
    }

    /// Stop handing out workers.
    ///
    /// Requests already executing finish normally; queued requests fail
    /// when they try to acquire a worker.
    pub fn close(&self) {
        self.workers.close();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.workers.is_closed()
    }

    /// Claim a place in the pool without waiting.
    ///
    /// Returns `None` when every worker is busy and the queue is full, or
    /// when the pool is closed.
    pub fn try_reserve(&self) -> Option<BulkheadSlot> {
        if self.is_closed() {
            return None;
        }
        self.occupied
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .ok()
            .map(|_| BulkheadSlot {
                workers: Arc::clone(&self.workers),
                occupied: Arc::clone(&self.occupied),
            })
    }
}

/// A claimed place in a [`Bulkhead`]; released on drop.
#[derive(Debug)]
pub struct BulkheadSlot {
    workers: Arc<Semaphore>,
    occupied: Arc<AtomicUsize>,
}

impl BulkheadSlot {
    /// Wait until a worker is free.
    pub async fn acquire_worker(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        Arc::clone(&self.workers).acquire_owned().await
    }
}

impl Drop for BulkheadSlot {
    fn drop(&mut self) {
        self.occupied.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_up_to_capacity() {
        let bulkhead = Bulkhead::new(BulkheadConfig::new(1, 2));
        assert_eq!(bulkhead.capacity(), 3);

        let a = bulkhead.try_reserve();
        let b = bulkhead.try_reserve();
        let c = bulkhead.try_reserve();
        assert!(a.is_some() && b.is_some() && c.is_some());
        assert!(bulkhead.try_reserve().is_none());
        assert_eq!(bulkhead.occupied(), 3);

        drop(b);
        assert_eq!(bulkhead.occupied(), 2);
        assert!(bulkhead.try_reserve().is_some());
    }

    #[tokio::test]
    async fn test_workers_bound_concurrency() {
        let bulkhead = Bulkhead::new(BulkheadConfig::new(1, 1));
        let first = bulkhead.try_reserve().unwrap();
        let second = bulkhead.try_reserve().unwrap();

        let permit = first.acquire_worker().await.unwrap();
        let waiting = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            second.acquire_worker(),
        )
        .await;
        assert!(waiting.is_err(), "second request must wait for a worker");

        drop(permit);
        assert!(second.acquire_worker().await.is_ok());
    }

    #[tokio::test]
    async fn test_close_rejects_new_and_queued_requests() {
        let bulkhead = Bulkhead::new(BulkheadConfig::new(1, 1));
        let running = bulkhead.try_reserve().unwrap();
        let queued = bulkhead.try_reserve().unwrap();
        let permit = running.acquire_worker().await.unwrap();

        bulkhead.close();
        assert!(bulkhead.is_closed());
        assert!(bulkhead.try_reserve().is_none());
        assert!(queued.acquire_worker().await.is_err());

        drop(permit);
        drop(queued);
        drop(running);
        assert_eq!(bulkhead.occupied(), 0);
    }
}
