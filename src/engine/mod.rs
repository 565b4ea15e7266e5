//! # Batch download engine
//!
//! Drives a set of [`FetchableItem`]s to completion with bounded parallelism,
//! automatic retry passes and live progress.
//!
//! ```text
//! Batch ──▶ RetryCoordinator ──pass n──▶ WorkerPool ──▶ Fetcher
//!                 ▲                          │              │
//!                 └──── failures of pass n ──┘        ProgressSink
//!                 │
//!                 ▼
//!           DownloadReport
//! ```
//!
//! The engine knows nothing about the remote catalog, the file layout or
//! the tag format. Those live behind the [`Fetcher`] and [`ProgressSink`]
//! traits, which concrete adapters in [`crate::download`] implement.
//!
//! Failure of a single item never aborts the batch. It is captured as an
//! [`Outcome::Failure`], retried in the next pass, and listed in the final
//! [`DownloadReport`] if every pass failed for it.

mod delay;
mod error;
mod fetcher;
mod item;
mod pool;
mod progress;
mod report;
mod retry;

pub use delay::DelayPolicy;
pub use error::{BatchError, FetchError, PartialFailure};
pub use fetcher::Fetcher;
pub use item::{Batch, FetchableItem, ItemKey, Outcome};
pub use pool::{DEFAULT_MAX_CONCURRENT, WorkerPool};
pub use progress::{ItemProgress, NoopProgress, ProgressSink};
pub use report::{DownloadReport, FailedItem};
pub use retry::{DEFAULT_MAX_PASSES, RetryCoordinator};
