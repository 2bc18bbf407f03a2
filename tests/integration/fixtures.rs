//! Shared fixtures for the integration suite.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ferno::ProgressObserver;

/// A task that sleeps, then succeeds with `value`.
pub async fn delayed(value: u32, delay: Duration) -> Result<u32, String> {
    tokio::time::sleep(delay).await;
    Ok(value)
}

/// A task that sleeps, then fails with `message`.
pub async fn failing(message: String, delay: Duration) -> Result<u32, String> {
    tokio::time::sleep(delay).await;
    Err(message)
}

/// Tracks how many instrumented tasks run at once and the peak reached.
#[derive(Default)]
pub struct ActiveCounter {
    current: AtomicUsize,
    peak: AtomicUsize,
    started: AtomicUsize,
}

impl ActiveCounter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Highest number of tasks observed executing simultaneously.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Total number of tasks that began executing.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A task that records itself in `counter` while it runs.
pub async fn tracked(value: u32, delay: Duration, counter: Arc<ActiveCounter>) -> Result<u32, String> {
    counter.enter();
    tokio::time::sleep(delay).await;
    counter.exit();
    Ok(value)
}

/// Progress observer that only counts, for asserting advance accounting.
#[derive(Default)]
pub struct CountingObserver {
    advances: AtomicU64,
    finishes: AtomicU64,
}

impl CountingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn advances(&self) -> u64 {
        self.advances.load(Ordering::SeqCst)
    }

    pub fn finishes(&self) -> u64 {
        self.finishes.load(Ordering::SeqCst)
    }
}

impl ProgressObserver for CountingObserver {
    fn advance(&self) {
        self.advances.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        self.finishes.fetch_add(1, Ordering::SeqCst);
    }
}
