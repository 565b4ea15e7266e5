use std::sync::Arc;

use futures::{StreamExt, stream};
use tokio_util::sync::CancellationToken;

use super::{
    Batch, DownloadReport, FailedItem, FetchableItem, Fetcher, Outcome, ProgressSink, WorkerPool,
};

pub const DEFAULT_MAX_PASSES: usize = 3;

/// Drives a batch through repeated passes of a [`WorkerPool`].
///
/// Pass `n + 1` only contains the items that failed in pass `n`. The run
/// stops when a pass has no failures, when `max_passes` passes have run, or
/// when the cancellation token fires. Passes follow each other immediately;
/// the only spacing between requests is the pool's [`DelayPolicy`](super::DelayPolicy).
#[derive(Debug, Clone)]
pub struct RetryCoordinator {
    pool: WorkerPool,
    max_passes: usize,
    cancel: CancellationToken,
}

impl Default for RetryCoordinator {
    fn default() -> Self {
        Self::new(WorkerPool::default(), DEFAULT_MAX_PASSES)
    }
}

impl RetryCoordinator {
    pub fn new(pool: WorkerPool, max_passes: usize) -> Self {
        Self {
            pool,
            max_passes: max_passes.max(1),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    /// Runs `batch` to completion and reports the items that never succeeded.
    ///
    /// Sizes missing from the batch are probed through the fetcher before the
    /// first pass so progress can be initialised with real totals.
    pub async fn run<T, F>(
        &self,
        batch: Batch<T>,
        fetcher: Arc<F>,
        sink: Arc<dyn ProgressSink>,
    ) -> DownloadReport
    where
        T: Send + Sync,
        F: Fetcher<T>,
    {
        let total = batch.len();
        sink.batch_started(total);

        let mut pending = batch.into_items();
        self.probe_sizes(&mut pending, fetcher.as_ref()).await;

        let mut passes = 0;
        let mut failed: Vec<FailedItem> = Vec::new();

        while !pending.is_empty() && passes < self.max_passes {
            passes += 1;
            if passes > 1 {
                tracing::info!(
                    pass = passes,
                    max_passes = self.max_passes,
                    pending = pending.len(),
                    "retrying failed items"
                );
            }
            sink.pass_started(passes, self.max_passes, pending.len());

            let outcomes = self
                .pool
                .run(pending, Arc::clone(&fetcher), Arc::clone(&sink), &self.cancel)
                .await;

            failed.clear();
            pending = Vec::new();
            for (item, outcome) in outcomes {
                if let Outcome::Failure(reason) = outcome {
                    failed.push(FailedItem::from_item(&item, reason));
                    pending.push(item);
                }
            }

            if self.cancel.is_cancelled() {
                tracing::warn!(pass = passes, "batch cancelled, skipping remaining passes");
                break;
            }
        }

        let report = DownloadReport::new(total, passes, failed);
        sink.batch_finished(&report);
        report
    }

    async fn probe_sizes<T, F>(&self, items: &mut [FetchableItem<T>], fetcher: &F)
    where
        T: Send + Sync,
        F: Fetcher<T>,
    {
        if items.iter().all(|item| item.expected_size().is_some()) {
            return;
        }

        let sizes: Vec<Option<u64>> = stream::iter(items.iter())
            .map(|item| async move {
                match item.expected_size() {
                    Some(size) => Some(size),
                    None => fetcher.probe_size(item).await,
                }
            })
            .buffered(self.pool.max_concurrent())
            .collect()
            .await;

        for (item, size) in items.iter_mut().zip(sizes) {
            item.fill_expected_size(size);
        }
    }
}
