use futures_util::{
    future::{FusedFuture, Shared},
    FutureExt,
};
use std::{
    future::Future,
    pin::Pin,
    task::{ready, Context, Poll},
};
use tokio::sync::oneshot;

/// A future that resolves once the synchronization session has finished.
///
/// Clones can be awaited from any number of tasks. The future also resolves if
/// the [`CompletionSignal`] is dropped without firing, so a waiter can never
/// hang on a session that died.
#[derive(Clone, Debug)]
pub struct SyncComplete(Shared<oneshot::Receiver<()>>);

impl Future for SyncComplete {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.0.is_terminated() {
            return Poll::Ready(())
        }
        let _ = ready!(self.0.poll_unpin(cx));
        Poll::Ready(())
    }
}

/// Fires the paired [`SyncComplete`] futures.
#[derive(Debug)]
pub struct CompletionSignal(oneshot::Sender<()>);

impl CompletionSignal {
    /// Wakes every waiter.
    pub fn fire(self) {
        let _ = self.0.send(());
    }
}

/// Creates a completion signal and the future it resolves.
pub fn completion_pair() -> (CompletionSignal, SyncComplete) {
    let (tx, rx) = oneshot::channel();
    (CompletionSignal(tx), SyncComplete(rx.shared()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn fire_resolves_all_waiters() {
        let (signal, complete) = completion_pair();

        let mut waiters = Vec::with_capacity(4);
        for _ in 0..4 {
            let complete = complete.clone();
            waiters.push(tokio::task::spawn(async move {
                complete.await;
            }));
        }

        signal.fire();
        for waiter in waiters {
            waiter.await.unwrap();
        }
    }

    #[tokio::test]
    async fn dropped_signal_resolves() {
        let (signal, complete) = completion_pair();
        drop(signal);
        complete.await;
    }

    #[tokio::test]
    async fn resolved_future_stays_ready() {
        let (signal, mut complete) = completion_pair();
        signal.fire();
        (&mut complete).await;
        // polling again after terminal resolution must not panic
        complete.await;
    }
}
