use std::path::PathBuf;

use super::{FetchError, FetchableItem, ItemKey, PartialFailure};

/// An item whose every attempt failed, with the reason of its last attempt.
#[derive(Debug)]
pub struct FailedItem {
    pub key: ItemKey,
    pub name: String,
    pub position: usize,
    pub destination: PathBuf,
    pub reason: FetchError,
}

impl FailedItem {
    pub(crate) fn from_item<T>(item: &FetchableItem<T>, reason: FetchError) -> Self {
        Self {
            key: item.key().clone(),
            name: item.name().to_string(),
            position: item.position(),
            destination: item.destination().to_path_buf(),
            reason,
        }
    }
}

/// Final result of running a batch to completion.
///
/// A report with failures is still a completed run; use
/// [`DownloadReport::into_result`] to turn it into an error for callers that
/// treat any permanent failure as one.
#[derive(Debug)]
pub struct DownloadReport {
    total: usize,
    passes: usize,
    failed: Vec<FailedItem>,
}

impl DownloadReport {
    pub(crate) fn new(total: usize, passes: usize, mut failed: Vec<FailedItem>) -> Self {
        failed.sort_by_key(|item| item.position);
        Self {
            total,
            passes,
            failed,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of passes the coordinator actually ran.
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn failed(&self) -> &[FailedItem] {
        &self.failed
    }

    pub fn succeeded(&self) -> usize {
        self.total - self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn is_failed(&self, key: &ItemKey) -> bool {
        self.failed.iter().any(|item| &item.key == key)
    }

    pub fn into_result(self) -> Result<Self, PartialFailure> {
        if self.failed.is_empty() {
            return Ok(self);
        }

        Err(PartialFailure {
            total: self.total,
            passes: self.passes,
            failed: self.failed,
        })
    }
}
