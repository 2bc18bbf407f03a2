//! Shared utility functions.

use std::future::Future;
use std::io;

/// Run one future to completion from synchronous code.
///
/// Builds a fresh current-thread runtime per call, so this is a bridge for
/// "here and there" sync call sites, not a loop driver. Must not be called
/// from inside an async context.
pub fn block_on<F: Future>(future: F) -> io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}
