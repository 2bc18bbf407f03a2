use std::fmt;

use thiserror::Error;

/// Where a task sits in the output of one orchestrator call.
///
/// List-shaped runs use the zero-based input position; map-shaped runs use
/// the caller's key (rendered via `Display`). The identity exists only to
/// route a result, or a failure report, back to its place in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Zero-based position in the input sequence (`all` / `generate`).
    Index(usize),
    /// Caller-supplied key (`props`).
    Key(String),
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Index(i) => write!(f, "#{}", i),
            Identity::Key(k) => write!(f, "{:?}", k),
        }
    }
}

/// Errors surfaced by `all` / `props` / `generate`.
///
/// `E` is the task's own error type; the orchestrator never interprets it,
/// it only tags it with the failing task's [`Identity`] and propagates it.
#[derive(Error, Debug)]
pub enum Error<E> {
    /// The concurrency ceiling was not a positive integer. Rejected before
    /// any task starts.
    #[error("concurrency must be at least 1 (got {0})")]
    InvalidConcurrency(usize),

    /// A task failed. The whole run is aborted; sibling results are
    /// discarded, never returned as a partial success.
    #[error("task {identity} failed: {error}")]
    Task {
        /// Which task failed.
        identity: Identity,
        /// The task's own error.
        error: E,
    },

    /// The run was cancelled via its cancellation token before all tasks
    /// completed. Distinct from a task failure.
    #[error("run cancelled")]
    Cancelled,

    /// A spawned task could not be joined (it panicked).
    #[error("task join failed: {0}")]
    Join(String),
}

impl<E> Error<E> {
    /// The identity of the failing task, if this is a task failure.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Error::Task { identity, .. } => Some(identity),
            _ => None,
        }
    }
}

pub type Result<T, E> = std::result::Result<T, Error<E>>;
