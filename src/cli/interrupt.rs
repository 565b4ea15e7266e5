use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::warning;

/// Stream of Ctrl-C presses; ends if the signal handler can't be installed.
pub fn ctrl_c_presses() -> impl Stream<Item = ()> + Unpin {
    Box::pin(futures::stream::unfold((), |()| async {
        tokio::signal::ctrl_c().await.ok().map(|()| ((), ()))
    }))
}

/// Cancels `cancel` on the first interrupt so running transfers can wind
/// down, and returns `true` on the second one. Returns `false` when the
/// interrupts end before that.
pub async fn watch_interrupts<S>(mut interrupts: S, cancel: CancellationToken) -> bool
where
    S: Stream<Item = ()> + Unpin,
{
    if interrupts.next().await.is_none() {
        return false;
    }
    warning!("Interrupted, stopping download... Press Ctrl-C again to quit now");
    cancel.cancel();

    interrupts.next().await.is_some()
}
