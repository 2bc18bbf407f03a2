//! Task wrapper: one task's trip through the permit pool.
//!
//! Every task an orchestrator call spawns runs through [`run`]: acquire a
//! permit, execute, release, signal progress, report. Permit release is
//! RAII (the permit drops on every exit path, including task failure and
//! abort), and the progress sink is signalled exactly once per task that
//! actually executed.

use std::future::Future;
use std::sync::Arc;

use crate::limit::PermitPool;
use crate::progress::ProgressSink;

/// Outcome of one wrapped task, tagged with its identity.
#[derive(Debug)]
pub(crate) enum TaskMessage<I, T, E> {
    /// The task ran and produced a value.
    Done(I, T),
    /// The task ran and failed.
    Failed(I, E),
    /// The pool was closed before this task was admitted; it never ran and
    /// never signalled progress.
    Shutdown,
}

/// Run one task under the pool's admission discipline.
pub(crate) async fn run<I, F, T, E>(
    pool: PermitPool,
    id: I,
    task: F,
    sink: Arc<ProgressSink>,
) -> TaskMessage<I, T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let permit = match pool.acquire().await {
        Some(permit) => permit,
        None => return TaskMessage::Shutdown,
    };

    let result = task.await;

    // Free the slot before signalling, so the next waiter is admitted even
    // if a custom observer does slow work in advance().
    drop(permit);
    sink.advance();

    match result {
        Ok(value) => TaskMessage::Done(id, value),
        Err(error) => TaskMessage::Failed(id, error),
    }
}
