//! # Track downloads
//!
//! Adapters that plug DAB tracks into the generic [`crate::engine`]:
//!
//! - [`TrackFetcher`] resolves, streams and tags one track per attempt
//! - [`batch`] turns tracks, albums and discographies into batches
//! - [`TerminalProgress`] renders engine progress with `indicatif`
//! - [`Downloader`] lays out directories and runs a batch end to end

pub mod batch;
mod fetcher;
mod progress;
mod runner;
pub mod tagging;

pub use fetcher::{TrackFetcher, TrackJob};
pub use progress::TerminalProgress;
pub use runner::{ArtistDownload, Downloader};
