//! Permit pool bounding how many tasks run at once.
//!
//! The pool is a thin wrapper over a tokio [`Semaphore`] with a fixed
//! capacity. Each task acquires one permit before running and releases it
//! when its [`Permit`] drops, so release happens on every exit path,
//! including failure and abort. One pool is created per orchestrator call;
//! nothing is shared across invocations.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting admission gate with a fixed concurrency ceiling.
///
/// Cloning is cheap; all clones share the same underlying permit count.
#[derive(Debug, Clone)]
pub struct PermitPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// The right to run one task. Dropping it releases the slot and admits the
/// next waiter.
#[derive(Debug)]
pub struct Permit {
    _inner: OwnedSemaphorePermit,
}

impl PermitPool {
    /// Create a pool with the given capacity.
    ///
    /// Capacity is `NonZeroUsize` so a zero ceiling is unrepresentable here;
    /// the orchestrator validates caller input before constructing a pool.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity.get())),
            capacity: capacity.get(),
        }
    }

    /// Wait until a slot is free and claim it.
    ///
    /// Returns `None` if the pool has been closed, which happens only when
    /// the owning run is shutting down (fail-fast, cancellation, or an
    /// abandoned stream). Waiters are queued, so every waiter is eventually
    /// admitted while the pool stays open.
    pub async fn acquire(&self) -> Option<Permit> {
        match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(inner) => Some(Permit { _inner: inner }),
            Err(_) => None,
        }
    }

    /// Close the pool: pending and future `acquire` calls return `None`.
    ///
    /// Already-issued permits are unaffected; tasks holding one run to
    /// completion (or are aborted by their owner).
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// The fixed concurrency ceiling.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
