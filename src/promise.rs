//! Orchestrator entry points: `all`, `props`, and `generate`.
//!
//! All three share one execution discipline: every task is spawned up
//! front, assigned a stable identity, and guarded by a permit from a
//! per-call [`PermitPool`], so at most `concurrency` tasks execute at once
//! no matter how many were submitted. They differ only in the shape the
//! results come back in:
//!
//! - [`all`]: ordered `Vec`, slot `i` holds task `i`'s result
//! - [`props`]: `HashMap` with exactly the input's key set
//! - [`generate`]: a stream yielding results in completion order
//!
//! Failure is fail-fast everywhere: the first task failure closes the
//! pool, aborts still-running siblings, discards completed sibling
//! results, and surfaces [`Error::Task`] tagged with the failing task's
//! identity.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Identity, Result};
use crate::limit::PermitPool;
use crate::progress::{Progress, ProgressSink};
use crate::worker::{self, TaskMessage};
use crate::{flog_debug, flog_error};

/// Concurrency ceiling used when the caller does not override it.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Per-call orchestrator configuration.
///
/// # Example
///
/// ```ignore
/// let opts = RunOptions::new()
///     .with_concurrency(8)
///     .with_progress("downloading");
/// let results = ferno::all(tasks, opts).await?;
/// ```
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum number of tasks in flight at once. Must be at least 1.
    pub concurrency: usize,
    /// Progress reporting configuration.
    pub progress: Progress,
    /// External cancellation for the whole call. The default token is never
    /// cancelled.
    pub cancel: CancellationToken,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            progress: Progress::Disabled,
            cancel: CancellationToken::new(),
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the concurrency ceiling.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Enable progress reporting: `true`, a label, or a custom observer.
    pub fn with_progress(mut self, progress: impl Into<Progress>) -> Self {
        self.progress = progress.into();
        self
    }

    /// Attach a cancellation token covering the whole call.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn checked_concurrency<E>(&self) -> Result<NonZeroUsize, E> {
        NonZeroUsize::new(self.concurrency).ok_or(Error::InvalidConcurrency(self.concurrency))
    }
}

/// Run an ordered sequence of tasks and collect their results in input
/// order.
///
/// Every task is spawned immediately but executes only once it holds a
/// permit, so at most `opts.concurrency` tasks run at a time. The returned
/// `Vec` has the input's length, with slot `i` holding task `i`'s result
/// regardless of completion order.
///
/// Empty input returns an empty `Vec` without creating a permit pool or a
/// progress sink.
///
/// # Errors
///
/// Fails fast on the first task failure with [`Error::Task`], on external
/// cancellation with [`Error::Cancelled`], and on a panicking task with
/// [`Error::Join`]. A non-positive `opts.concurrency` is rejected with
/// [`Error::InvalidConcurrency`] before any task starts.
pub async fn all<I, F, T, E>(tasks: I, opts: RunOptions) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = std::result::Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let capacity = opts.checked_concurrency()?;
    let tasks: Vec<F> = tasks.into_iter().collect();
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let total = tasks.len();
    flog_debug!("all: {} tasks, concurrency {}", total, capacity);

    let pool = PermitPool::new(capacity);
    let sink = Arc::new(ProgressSink::new(&opts.progress, total as u64));
    let mut set = JoinSet::new();
    for (index, task) in tasks.into_iter().enumerate() {
        set.spawn(worker::run(pool.clone(), index, task, Arc::clone(&sink)));
    }

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
    loop {
        tokio::select! {
            _ = opts.cancel.cancelled() => {
                flog_debug!("all: cancelled with {} of {} done", sink.completed(), total);
                return Err(abort_run(&pool, &mut set, &sink, Error::Cancelled));
            }
            joined = set.join_next() => match joined {
                None => break,
                Some(Ok(TaskMessage::Done(index, value))) => slots[index] = Some(value),
                Some(Ok(TaskMessage::Failed(index, error))) => {
                    flog_error!("all: task #{} failed", index);
                    let tagged = Error::Task {
                        identity: Identity::Index(index),
                        error,
                    };
                    return Err(abort_run(&pool, &mut set, &sink, tagged));
                }
                Some(Ok(TaskMessage::Shutdown)) => {
                    return Err(abort_run(&pool, &mut set, &sink, Error::Cancelled));
                }
                Some(Err(join_err)) => {
                    return Err(abort_run(&pool, &mut set, &sink, join_error(join_err)));
                }
            }
        }
    }

    sink.finish();
    slots
        .into_iter()
        .map(|slot| slot.ok_or(Error::Cancelled))
        .collect()
}

/// Run a keyed collection of tasks and collect their results under the
/// same keys.
///
/// Execution is identical to [`all`]; only the identity differs. The
/// returned map has exactly the input's key set. Submission order is
/// immaterial since the output is keyed, not ordered.
///
/// Keys must implement `Display` so a failure can be tagged with the
/// offending key.
///
/// # Errors
///
/// Same failure contract as [`all`], with [`Error::Task`] carrying
/// [`Identity::Key`].
pub async fn props<M, K, F, T, E>(entries: M, opts: RunOptions) -> Result<HashMap<K, T>, E>
where
    M: IntoIterator<Item = (K, F)>,
    K: Eq + Hash + fmt::Display + Send + 'static,
    F: Future<Output = std::result::Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let capacity = opts.checked_concurrency()?;
    let entries: Vec<(K, F)> = entries.into_iter().collect();
    if entries.is_empty() {
        return Ok(HashMap::new());
    }

    let total = entries.len();
    flog_debug!("props: {} tasks, concurrency {}", total, capacity);

    let pool = PermitPool::new(capacity);
    let sink = Arc::new(ProgressSink::new(&opts.progress, total as u64));
    let mut set = JoinSet::new();
    for (key, task) in entries {
        set.spawn(worker::run(pool.clone(), key, task, Arc::clone(&sink)));
    }

    let mut out = HashMap::with_capacity(total);
    loop {
        tokio::select! {
            _ = opts.cancel.cancelled() => {
                flog_debug!("props: cancelled with {} of {} done", sink.completed(), total);
                return Err(abort_run(&pool, &mut set, &sink, Error::Cancelled));
            }
            joined = set.join_next() => match joined {
                None => break,
                Some(Ok(TaskMessage::Done(key, value))) => {
                    out.insert(key, value);
                }
                Some(Ok(TaskMessage::Failed(key, error))) => {
                    flog_error!("props: task {:?} failed", key.to_string());
                    let tagged = Error::Task {
                        identity: Identity::Key(key.to_string()),
                        error,
                    };
                    return Err(abort_run(&pool, &mut set, &sink, tagged));
                }
                Some(Ok(TaskMessage::Shutdown)) => {
                    return Err(abort_run(&pool, &mut set, &sink, Error::Cancelled));
                }
                Some(Err(join_err)) => {
                    return Err(abort_run(&pool, &mut set, &sink, join_error(join_err)));
                }
            }
        }
    }

    sink.finish();
    Ok(out)
}

/// Run an ordered sequence of tasks and stream results in completion
/// order.
///
/// Same admission discipline as [`all`], but each result is handed to the
/// consumer as soon as its task completes, which may differ from submission
/// order. The stream is finite (one item per input task on the success
/// path) and single-pass; a second traversal requires a fresh call.
///
/// Dropping the stream before exhaustion cancels the run: the permit pool
/// is closed so not-yet-started tasks are never admitted, and in-flight
/// tasks are aborted.
///
/// Must be called from within a tokio runtime; the collector runs as a
/// spawned task.
///
/// # Errors
///
/// A non-positive `opts.concurrency` is rejected up front. Task failure,
/// cancellation, and panics surface as the stream's final item, after
/// which it terminates.
pub fn generate<I, F, T, E>(tasks: I, opts: RunOptions) -> Result<ResultStream<T, E>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = std::result::Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let capacity = opts.checked_concurrency()?;
    let tasks: Vec<F> = tasks.into_iter().collect();
    let total = tasks.len();

    // Dropping the stream cancels this child token; an external cancel on
    // the parent reaches it too, so the collector watches one token.
    let shutdown = opts.cancel.child_token();
    let (tx, rx) = mpsc::channel(total.max(1));

    if total == 0 {
        // Sender dropped here; the stream ends on first poll.
        return Ok(ResultStream { rx, shutdown });
    }

    flog_debug!("generate: {} tasks, concurrency {}", total, capacity);

    let pool = PermitPool::new(capacity);
    let sink = Arc::new(ProgressSink::new(&opts.progress, total as u64));
    let mut set = JoinSet::new();
    for (index, task) in tasks.into_iter().enumerate() {
        set.spawn(worker::run(pool.clone(), index, task, Arc::clone(&sink)));
    }

    let external = opts.cancel.clone();
    let collector_shutdown = shutdown.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = collector_shutdown.cancelled() => {
                    abort_run(&pool, &mut set, &sink, ());
                    if external.is_cancelled() {
                        flog_debug!("generate: cancelled with {} of {} done", sink.completed(), total);
                        let _ = tx.send(Err(Error::Cancelled)).await;
                    }
                    break;
                }
                joined = set.join_next() => match joined {
                    None => {
                        sink.finish();
                        break;
                    }
                    Some(Ok(TaskMessage::Done(_, value))) => {
                        if tx.send(Ok(value)).await.is_err() {
                            // Consumer dropped the stream mid-run.
                            abort_run(&pool, &mut set, &sink, ());
                            break;
                        }
                    }
                    Some(Ok(TaskMessage::Failed(index, error))) => {
                        flog_error!("generate: task #{} failed", index);
                        let tagged = Error::Task {
                            identity: Identity::Index(index),
                            error,
                        };
                        abort_run(&pool, &mut set, &sink, ());
                        let _ = tx.send(Err(tagged)).await;
                        break;
                    }
                    Some(Ok(TaskMessage::Shutdown)) => {}
                    Some(Err(join_err)) => {
                        let tagged = join_error(join_err);
                        abort_run(&pool, &mut set, &sink, ());
                        let _ = tx.send(Err(tagged)).await;
                        break;
                    }
                }
            }
        }
    });

    Ok(ResultStream { rx, shutdown })
}

/// Lazily-produced results of a [`generate`] call, in completion order.
///
/// Implements [`futures::Stream`]; consume with `StreamExt::next`.
#[derive(Debug)]
pub struct ResultStream<T, E> {
    rx: mpsc::Receiver<Result<T, E>>,
    shutdown: CancellationToken,
}

impl<T, E> Stream for ResultStream<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl<T, E> Drop for ResultStream<T, E> {
    fn drop(&mut self) {
        // Stops permit issuance for not-yet-started tasks and aborts the
        // rest; a no-op if the run already finished.
        self.shutdown.cancel();
    }
}

/// Shut a run down: no new admissions, abort in-flight siblings, freeze the
/// progress display. Returns the error so call sites stay one-liners.
fn abort_run<Msg, X>(pool: &PermitPool, set: &mut JoinSet<Msg>, sink: &ProgressSink, error: X) -> X
where
    Msg: 'static,
{
    pool.close();
    set.abort_all();
    sink.abandon();
    error
}

fn join_error<E>(err: JoinError) -> Error<E> {
    if err.is_cancelled() {
        Error::Cancelled
    } else {
        Error::Join(err.to_string())
    }
}
