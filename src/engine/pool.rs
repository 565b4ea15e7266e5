use std::{any::Any, collections::VecDeque, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::{FutureExt, future};
use tokio::{
    sync::{Mutex, Semaphore},
    time::timeout,
};
use tokio_util::sync::CancellationToken;

use super::{DelayPolicy, FetchError, FetchableItem, Fetcher, ItemProgress, Outcome, ProgressSink};

pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Runs fetches for a set of items with a hard cap on simultaneous transfers.
///
/// Every transfer holds a permit of the pool's admission gate. Clones of a
/// pool share that gate, so the cap holds across concurrent `run` calls too.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    gate: Arc<Semaphore>,
    max_concurrent: usize,
    delay: DelayPolicy,
    item_timeout: Option<Duration>,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

impl WorkerPool {
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            gate: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            delay: DelayPolicy::None,
            item_timeout: None,
        }
    }

    pub fn with_delay(mut self, delay: DelayPolicy) -> Self {
        self.delay = delay;
        self
    }

    /// Bounds each attempt; an attempt running longer fails with
    /// [`FetchError::TimedOut`].
    pub fn with_item_timeout(mut self, item_timeout: Duration) -> Self {
        self.item_timeout = Some(item_timeout);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Fetches every item once and returns one outcome per item, ordered by
    /// batch position.
    ///
    /// Failures, timeouts and panics of the fetcher or the sink are all
    /// captured as [`Outcome::Failure`]. Once `cancel` fires no further item
    /// is admitted; the ones left in the queue come back as
    /// `Failure(Cancelled)`. An item no worker got to report on comes back as
    /// `Failure(Panicked)`, never as a success.
    pub async fn run<T, F>(
        &self,
        items: Vec<FetchableItem<T>>,
        fetcher: Arc<F>,
        sink: Arc<dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Vec<(FetchableItem<T>, Outcome)>
    where
        T: Send + Sync,
        F: Fetcher<T>,
    {
        if items.is_empty() {
            return Vec::new();
        }

        let workers = self.max_concurrent.min(items.len());
        let queue = Mutex::new((0..items.len()).collect::<VecDeque<_>>());
        let slots = Mutex::new(items.iter().map(|_| None).collect::<Vec<Option<Outcome>>>());

        let stopped = future::join_all((0..workers).map(|id| {
            let worker = Worker {
                id,
                items: &items,
                queue: &queue,
                slots: &slots,
                gate: Arc::clone(&self.gate),
                fetcher: fetcher.as_ref(),
                sink: &sink,
                cancel,
                delay: self.delay,
                item_timeout: self.item_timeout,
            };
            AssertUnwindSafe(worker.run()).catch_unwind()
        }))
        .await;

        for (id, result) in stopped.into_iter().enumerate() {
            if let Err(payload) = result {
                tracing::error!(worker = id, error = %panic_message(&*payload), "download worker aborted");
            }
        }

        let mut outcomes: Vec<_> = items
            .into_iter()
            .zip(slots.into_inner())
            .map(|(item, slot)| {
                let outcome = slot.unwrap_or_else(|| {
                    tracing::warn!(key = %item.key(), "item left without an outcome");
                    Outcome::Failure(FetchError::Panicked(
                        "download worker stopped before finishing this item".to_string(),
                    ))
                });
                (item, outcome)
            })
            .collect();

        outcomes.sort_by_key(|(item, _)| item.position());
        outcomes
    }
}

struct Worker<'a, T, F> {
    id: usize,
    items: &'a [FetchableItem<T>],
    queue: &'a Mutex<VecDeque<usize>>,
    slots: &'a Mutex<Vec<Option<Outcome>>>,
    gate: Arc<Semaphore>,
    fetcher: &'a F,
    sink: &'a Arc<dyn ProgressSink>,
    cancel: &'a CancellationToken,
    delay: DelayPolicy,
    item_timeout: Option<Duration>,
}

impl<T, F> Worker<'_, T, F>
where
    T: Send + Sync,
    F: Fetcher<T>,
{
    async fn run(self) {
        loop {
            let next = self.queue.lock().await.pop_front();
            let Some(index) = next else {
                break;
            };
            let item = &self.items[index];

            if self.cancel.is_cancelled() {
                self.record(index, Outcome::Failure(FetchError::Cancelled)).await;
                continue;
            }

            let permit = tokio::select! {
                permit = Arc::clone(&self.gate).acquire_owned() => permit.ok(),
                _ = self.cancel.cancelled() => None,
            };
            let Some(permit) = permit else {
                self.record(index, Outcome::Failure(FetchError::Cancelled)).await;
                continue;
            };

            let outcome = self.attempt(item).await;
            drop(permit);
            self.record(index, outcome).await;

            let more = !self.queue.lock().await.is_empty();
            if more && !self.cancel.is_cancelled() {
                self.delay.pause().await;
            }
        }
    }

    async fn record(&self, index: usize, outcome: Outcome) {
        self.slots.lock().await[index] = Some(outcome);
    }

    async fn attempt(&self, item: &FetchableItem<T>) -> Outcome {
        tracing::debug!(worker = self.id, key = %item.key(), name = item.name(), "fetch started");

        let reported = AssertUnwindSafe(async {
            self.sink
                .item_started(item.key(), item.name(), item.expected_size());

            let progress = ItemProgress::new(item.key().clone(), Arc::clone(self.sink));
            let fetch = self.fetcher.fetch(item, &progress);
            let result = match self.item_timeout {
                Some(limit) => timeout(limit, fetch)
                    .await
                    .unwrap_or(Err(FetchError::TimedOut(limit))),
                None => fetch.await,
            };

            self.sink.item_finished(item.key(), result.is_ok());
            result
        })
        .catch_unwind()
        .await;

        let outcome = match reported {
            Ok(Ok(())) => Outcome::Success,
            Ok(Err(e)) => Outcome::Failure(e),
            Err(payload) => {
                let message = panic_message(&*payload);
                // The bar may still be open when the panic came from the fetcher
                let _ = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    self.sink.item_finished(item.key(), false)
                }));
                Outcome::Failure(FetchError::Panicked(message))
            }
        };

        match &outcome {
            Outcome::Success => {
                tracing::debug!(worker = self.id, key = %item.key(), "fetch succeeded")
            }
            Outcome::Failure(e) => {
                tracing::warn!(worker = self.id, key = %item.key(), name = item.name(), error = %e, "fetch failed")
            }
        }

        outcome
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
