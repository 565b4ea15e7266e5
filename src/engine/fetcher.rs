use async_trait::async_trait;

use super::{FetchError, FetchableItem, ItemProgress};

/// Capability that performs the transfer of one item.
///
/// A call covers the whole logical operation for the item: resolving the
/// transfer location, writing the bytes to `item.destination()` and any
/// post-processing such as tagging. Any error makes the item eligible for
/// the next pass, so implementations must leave the destination either
/// complete or untouched and must not reuse state from a previous attempt.
#[async_trait]
pub trait Fetcher<T: Send + Sync>: Send + Sync {
    async fn fetch(&self, item: &FetchableItem<T>, progress: &ItemProgress)
    -> Result<(), FetchError>;

    /// Looks up the expected size of an item before the first pass.
    ///
    /// Returning `None` leaves the size unknown; progress is still reported
    /// once the transfer itself discovers it.
    async fn probe_size(&self, _item: &FetchableItem<T>) -> Option<u64> {
        None
    }
}
