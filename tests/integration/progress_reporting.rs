//! Progress accounting under concurrent completion.

use std::time::Duration;

use ferno::{all, props, Progress, RunOptions};

use crate::fixtures::{delayed, failing, CountingObserver};

/// Test: advances equal the task count under load
/// Given 1000 trivial tasks at C = 20
/// When `all` runs them with a counting observer
/// Then exactly 1000 advances are recorded, no losses or duplicates
#[tokio::test]
async fn test_thousand_tasks_advance_exactly_once_each() {
    let observer = CountingObserver::new();
    let tasks: Vec<_> = (0..1000u32).map(|i| async move { Ok::<_, String>(i) }).collect();

    let out = all(
        tasks,
        RunOptions::new()
            .with_concurrency(20)
            .with_progress(Progress::Observer(observer.clone())),
    )
    .await
    .unwrap();

    assert_eq!(out.len(), 1000);
    assert_eq!(observer.advances(), 1000);
    assert_eq!(observer.finishes(), 1);
}

/// A failing task still advances the sink before the failure propagates.
#[tokio::test]
async fn test_failure_still_advances() {
    let observer = CountingObserver::new();
    let tasks = vec![failing("broke".to_string(), Duration::from_millis(5))];

    let result = all(
        tasks,
        RunOptions::new().with_progress(Progress::Observer(observer.clone())),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(observer.advances(), 1, "failed tasks count as completed");
}

/// Empty inputs never touch the progress sink.
#[tokio::test]
async fn test_empty_input_never_signals_progress() {
    let observer = CountingObserver::new();

    let tasks: Vec<std::future::Ready<Result<u32, String>>> = Vec::new();
    all(
        tasks,
        RunOptions::new().with_progress(Progress::Observer(observer.clone())),
    )
    .await
    .unwrap();

    let entries: Vec<(String, std::future::Ready<Result<u32, String>>)> = Vec::new();
    props(
        entries,
        RunOptions::new().with_progress(Progress::Observer(observer.clone())),
    )
    .await
    .unwrap();

    assert_eq!(observer.advances(), 0);
    assert_eq!(observer.finishes(), 0);
}

/// Keyed runs advance once per entry too.
#[tokio::test]
async fn test_props_advances_per_entry() {
    let observer = CountingObserver::new();
    let entries: Vec<_> = (0..25u32)
        .map(|i| (format!("k{}", i), delayed(i, Duration::from_millis(1))))
        .collect();

    let out = props(
        entries,
        RunOptions::new()
            .with_concurrency(5)
            .with_progress(Progress::Observer(observer.clone())),
    )
    .await
    .unwrap();

    assert_eq!(out.len(), 25);
    assert_eq!(observer.advances(), 25);
    assert_eq!(observer.finishes(), 1);
}
