//! Concurrency ceiling enforcement.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ferno::{all, RunOptions};

use crate::fixtures::{tracked, ActiveCounter};

/// Test: ceiling is never exceeded
/// Given 30 tasks and a ceiling of 4
/// When `all` runs them
/// Then the instrumented peak of simultaneously-executing tasks is <= 4
#[tokio::test]
async fn test_ceiling_bounds_in_flight_tasks() {
    let counter = ActiveCounter::new();
    let tasks: Vec<_> = (0..30)
        .map(|i| tracked(i, Duration::from_millis(10), Arc::clone(&counter)))
        .collect();

    let out = all(tasks, RunOptions::new().with_concurrency(4))
        .await
        .unwrap();

    assert_eq!(out.len(), 30);
    assert_eq!(counter.started(), 30, "every task must eventually run");
    assert!(
        counter.peak() <= 4,
        "peak concurrency {} exceeded ceiling 4",
        counter.peak()
    );
}

/// Test: C = 1 serializes execution
/// Given 5 tasks of ~30ms each and a ceiling of 1
/// When `all` runs them
/// Then wall-clock time is at least 5 x 30ms
#[tokio::test]
async fn test_ceiling_of_one_serializes() {
    let counter = ActiveCounter::new();
    let tasks: Vec<_> = (0..5)
        .map(|i| tracked(i, Duration::from_millis(30), Arc::clone(&counter)))
        .collect();

    let start = Instant::now();
    all(tasks, RunOptions::new().with_concurrency(1))
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(counter.peak(), 1, "C = 1 must never overlap tasks");
    assert!(
        elapsed >= Duration::from_millis(140),
        "serialized run finished too fast: {:?}",
        elapsed
    );
}

/// Tasks actually overlap when the ceiling allows it: 10 sleeps of 50ms at
/// C = 10 finish far sooner than 500ms.
#[tokio::test]
async fn test_tasks_overlap_under_wide_ceiling() {
    let counter = ActiveCounter::new();
    let tasks: Vec<_> = (0..10)
        .map(|i| tracked(i, Duration::from_millis(50), Arc::clone(&counter)))
        .collect();

    let start = Instant::now();
    all(tasks, RunOptions::new().with_concurrency(10))
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert!(counter.peak() > 1, "tasks should overlap at C = 10");
    assert!(
        elapsed < Duration::from_millis(400),
        "parallel run took {:?}, expected well under 500ms",
        elapsed
    );
}

/// The default ceiling admits at most 20 tasks at once.
#[tokio::test]
async fn test_default_ceiling_is_honored() {
    let counter = ActiveCounter::new();
    let tasks: Vec<_> = (0..60)
        .map(|i| tracked(i, Duration::from_millis(5), Arc::clone(&counter)))
        .collect();

    all(tasks, RunOptions::new()).await.unwrap();

    assert!(
        counter.peak() <= 20,
        "peak {} exceeded default ceiling",
        counter.peak()
    );
}
