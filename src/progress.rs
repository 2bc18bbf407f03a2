//! Progress reporting for orchestrator runs.
//!
//! The orchestrator only needs a target with an "advance by one" signal;
//! rendering is delegated to an [`indicatif`] progress bar, or to any
//! caller-supplied [`ProgressObserver`]. The disabled mode never constructs
//! a bar and its `advance` compiles down to one atomic increment, so unused
//! progress reporting costs nothing visible.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

/// Label used when progress is enabled without a caller-supplied one.
pub const DEFAULT_LABEL: &str = "ferno";

/// Observer receiving one `advance` signal per completed task.
///
/// Implementations must tolerate concurrent calls from many tasks; the
/// built-in sink serializes counting through atomics before delegating.
pub trait ProgressObserver: Send + Sync {
    /// One task finished (successfully or not).
    fn advance(&self);

    /// The run finished; flush or finalize any rendering.
    fn finish(&self) {}
}

/// Caller-facing progress configuration.
///
/// Mirrors the loosely-typed `disabled | true | "label"` parameter of the
/// original API through `From` impls, plus an escape hatch for a custom
/// observer.
#[derive(Clone, Default)]
pub enum Progress {
    /// No signal dispatched, no rendering cost.
    #[default]
    Disabled,
    /// Terminal progress bar with [`DEFAULT_LABEL`].
    Enabled,
    /// Terminal progress bar with the given label.
    Label(String),
    /// Caller-supplied observer; no bar is constructed.
    Observer(Arc<dyn ProgressObserver>),
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Disabled => write!(f, "Disabled"),
            Progress::Enabled => write!(f, "Enabled"),
            Progress::Label(label) => write!(f, "Label({:?})", label),
            Progress::Observer(_) => write!(f, "Observer(..)"),
        }
    }
}

impl From<bool> for Progress {
    fn from(enabled: bool) -> Self {
        if enabled {
            Progress::Enabled
        } else {
            Progress::Disabled
        }
    }
}

impl From<&str> for Progress {
    fn from(label: &str) -> Self {
        Progress::Label(label.to_string())
    }
}

impl From<String> for Progress {
    fn from(label: String) -> Self {
        Progress::Label(label)
    }
}

enum SinkTarget {
    Noop,
    Bar(ProgressBar),
    Custom(Arc<dyn ProgressObserver>),
}

/// Shared per-run progress state.
///
/// Holds a monotonically increasing completed count and dispatches each
/// advance to the configured target. Created fresh for every orchestrator
/// call and shared with all its task wrappers.
pub struct ProgressSink {
    completed: AtomicU64,
    target: SinkTarget,
}

impl ProgressSink {
    pub(crate) fn new(progress: &Progress, total: u64) -> Self {
        let target = match progress {
            Progress::Disabled => SinkTarget::Noop,
            Progress::Enabled => SinkTarget::Bar(make_bar(DEFAULT_LABEL, total)),
            Progress::Label(label) => SinkTarget::Bar(make_bar(label, total)),
            Progress::Observer(observer) => SinkTarget::Custom(Arc::clone(observer)),
        };
        Self {
            completed: AtomicU64::new(0),
            target,
        }
    }

    /// Record one completed task. Safe to call concurrently; each call
    /// counts exactly once.
    pub fn advance(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        match &self.target {
            SinkTarget::Noop => {}
            SinkTarget::Bar(bar) => bar.inc(1),
            SinkTarget::Custom(observer) => observer.advance(),
        }
    }

    /// Number of tasks that have completed so far.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Finalize rendering after a fully successful run.
    pub(crate) fn finish(&self) {
        match &self.target {
            SinkTarget::Noop => {}
            SinkTarget::Bar(bar) => bar.finish(),
            SinkTarget::Custom(observer) => observer.finish(),
        }
    }

    /// Stop rendering after a failed or cancelled run, leaving the bar at
    /// its last position.
    pub(crate) fn abandon(&self) {
        match &self.target {
            SinkTarget::Noop => {}
            SinkTarget::Bar(bar) => bar.abandon(),
            SinkTarget::Custom(observer) => observer.finish(),
        }
    }
}

fn make_bar(label: &str, total: u64) -> ProgressBar {
    let style = ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
        .expect("static progress template is valid")
        .progress_chars("=> ");
    ProgressBar::new(total)
        .with_style(style)
        .with_message(label.to_string())
}
