use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use super::{DownloadReport, ItemKey};

/// Receiver of progress events emitted while a batch runs.
///
/// Workers of the same pass call into the sink concurrently, so
/// implementations must serialize their own state. Only the per-item
/// methods are required; batch and pass events default to no-ops.
pub trait ProgressSink: Send + Sync {
    fn batch_started(&self, _total: usize) {}

    fn pass_started(&self, _pass: usize, _max_passes: usize, _pending: usize) {}

    /// A new attempt for `key` begins. Progress values reported afterwards
    /// belong to this attempt and start again from zero.
    fn item_started(&self, key: &ItemKey, name: &str, expected_size: Option<u64>);

    /// The real size became known mid-transfer (e.g. from `Content-Length`).
    fn item_total(&self, _key: &ItemKey, _total: u64) {}

    fn item_progress(&self, key: &ItemKey, value: u64);

    fn item_finished(&self, key: &ItemKey, success: bool);

    fn batch_finished(&self, _report: &DownloadReport) {}
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn item_started(&self, _key: &ItemKey, _name: &str, _expected_size: Option<u64>) {}

    fn item_progress(&self, _key: &ItemKey, _value: u64) {}

    fn item_finished(&self, _key: &ItemKey, _success: bool) {}
}

/// Per-attempt progress handle given to a fetcher.
///
/// Values forwarded to the sink never decrease for the lifetime of the
/// handle; a lower value than the last one reported is swallowed.
pub struct ItemProgress {
    key: ItemKey,
    sink: Arc<dyn ProgressSink>,
    current: AtomicU64,
}

impl ItemProgress {
    pub fn new(key: ItemKey, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            key,
            sink,
            current: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    pub fn set_total(&self, total: u64) {
        self.sink.item_total(&self.key, total);
    }

    pub fn set(&self, value: u64) {
        let previous = self.current.fetch_max(value, Ordering::AcqRel);
        if value > previous {
            self.sink.item_progress(&self.key, value);
        }
    }

    pub fn advance(&self, delta: u64) {
        if delta == 0 {
            return;
        }
        let value = self.current.fetch_add(delta, Ordering::AcqRel) + delta;
        self.sink.item_progress(&self.key, value);
    }

    pub fn value(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }
}
