//! A cloneable cancellation signal shared between the executor and the UI.
use core::future::Future;
use core::time::Duration;
use std::sync::Arc;

use tokio::sync::watch;

/// Signals polling loops to stop. Clones observe the same signal, including
/// after [`reset`](Self::reset) re-arms it.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn reset(&self) {
        self.sender.send_replace(false);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Completes once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // the sender lives in `self`, so this only returns once cancelled
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }

    /// Drives `future` until it completes or the token is cancelled,
    /// whichever happens first. A cancelled future is dropped unfinished.
    pub async fn run_until_cancelled<F: Future>(&self, future: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            output = future => Some(output),
        }
    }

    /// Sleeps for `duration`. Returns `false` if cancelled first.
    pub async fn sleep(&self, duration: Duration) -> bool {
        self.run_until_cancelled(tokio::time::sleep(duration))
            .await
            .is_some()
    }
}
