use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cooperative cancellation handle shared between the stream producer
/// and its consumer.
///
/// Cancellation is observed, not forced: the producer selects on
/// [`cancelled`](Self::cancelled) between chunks and stops yielding
/// within one scheduling tick of [`cancel`](Self::cancel). Consumers
/// treat it as clean termination, never as an error.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolves once the token is cancelled. Safe to await more than
    /// once and from multiple clones.
    pub async fn cancelled(&self) {
        // Register before re-checking the flag so a cancel between the
        // check and the await cannot be missed.
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
