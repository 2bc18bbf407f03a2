//! ferno: bounded-concurrency orchestration for async tasks.
//!
//! Given a collection of independent async tasks, ferno runs them
//! concurrently up to a configurable ceiling, reports progress, and hands
//! back results in one of three shapes:
//!
//! - [`all`]: an ordered `Vec` matching the input order
//! - [`props`]: a `HashMap` keyed the way the input was keyed
//! - [`generate`]: a stream of results in completion order
//!
//! All three are fail-fast: the first task failure aborts the run and is
//! surfaced tagged with the failing task's identity. Cancellation via a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) unwinds
//! cleanly, releasing every held permit.

pub mod error;
pub mod limit;
pub mod log;
pub mod progress;
pub mod promise;
pub mod util;

mod worker;

pub use error::{Error, Identity, Result};
pub use limit::{Permit, PermitPool};
pub use progress::{Progress, ProgressObserver, ProgressSink};
pub use promise::{all, generate, props, ResultStream, RunOptions, DEFAULT_CONCURRENCY};
