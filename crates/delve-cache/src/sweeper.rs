use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::ResponseCache;

/// Default sweep cadence: five minutes.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Periodic expired-entry sweep with an explicit lifecycle, instead of
/// an ambient module-load timer. Dropping the sweeper also stops it.
pub struct CacheSweeper {
    cache: Arc<ResponseCache>,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl CacheSweeper {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self::with_period(cache, DEFAULT_SWEEP_INTERVAL)
    }

    pub fn with_period(cache: Arc<ResponseCache>, period: Duration) -> Self {
        Self {
            cache,
            period,
            handle: None,
        }
    }

    /// Spawn the background sweep task. Calling `start` twice restarts
    /// the task.
    pub fn start(&mut self) {
        self.stop();
        let cache = Arc::clone(&self.cache);
        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            // The first tick fires immediately; skip it so a freshly
            // started sweeper does not race warm-up writes.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let cleaned = cache.cleanup();
                if cleaned > 0 {
                    tracing::info!(cleaned, "cache sweep evicted expired entries");
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_expired_entries() {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(10)));
        cache.set("q", "r", None, None, None);

        let mut sweeper = CacheSweeper::with_period(Arc::clone(&cache), Duration::from_secs(60));
        sweeper.start();
        assert!(sweeper.is_running());
        // The spawned task only registers its interval once polled;
        // yield before advancing or the 61s jump lands before the
        // interval exists and only its immediate first tick fires.
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(61)).await;
        // Let the task run the tick that just came due.
        tokio::task::yield_now().await;

        assert_eq!(cache.size(), 0);
        sweeper.stop();
        assert!(!sweeper.is_running());
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let cache = Arc::new(ResponseCache::default());
        let mut sweeper = CacheSweeper::new(cache);
        sweeper.stop();
        assert!(!sweeper.is_running());
    }
}
