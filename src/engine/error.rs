use std::time::Duration;

use thiserror::Error;

use super::{ItemKey, report::FailedItem};

/// Reason a single fetch attempt did not complete.
///
/// Every variant is treated as transient by the retry coordinator: the item
/// simply stays in the pending set of the next pass.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unable to resolve transfer location: {0}")]
    Resolve(String),

    #[error("transfer failed: {0}")]
    Transfer(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot write metadata: {0}")]
    Tagging(String),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("cancelled before the transfer started")]
    Cancelled,

    #[error("fetcher panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("item {0} was added to the batch twice")]
    DuplicateKey(ItemKey),
}

/// Terminal error of a batch in which some items never succeeded.
///
/// Items that succeeded are not listed; `total - failed.len()` of them made it.
#[derive(Debug)]
pub struct PartialFailure {
    pub total: usize,
    pub passes: usize,
    pub failed: Vec<FailedItem>,
}

impl std::fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self
            .failed
            .iter()
            .map(|item| format!("'{}' (ID: {})", item.name, item.key))
            .collect::<Vec<_>>()
            .join(", ");

        write!(
            f,
            "completed with {count} errors out of {total} items after {passes} passes. Failed to download: {names}",
            count = self.failed.len(),
            total = self.total,
            passes = self.passes,
            names = names
        )
    }
}

impl std::error::Error for PartialFailure {}
