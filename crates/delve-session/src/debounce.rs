use std::time::Duration;
use tokio::time::Instant;

/// Default flush window for incremental content updates.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

/// Trailing-edge debounce over the latest full content string.
///
/// Events carry complete content, not deltas, so only the most recent
/// value matters; each schedule pushes the flush deadline out. The
/// stream end must call [`take_latest`](Self::take_latest) so the last
/// buffered value is never lost.
#[derive(Debug)]
pub struct ContentBuffer {
    latest: Option<String>,
    due: Option<Instant>,
    window: Duration,
}

impl ContentBuffer {
    pub fn new(window: Duration) -> Self {
        Self {
            latest: None,
            due: None,
            window,
        }
    }

    pub fn schedule(&mut self, content: String, now: Instant) {
        self.latest = Some(content);
        self.due = Some(now + self.window);
    }

    /// Flush if the window has elapsed. Returns the content to emit.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.due {
            Some(due) if due <= now => {
                self.due = None;
                self.latest.clone()
            }
            _ => None,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.due
    }

    /// Final buffered content, cancelling any pending flush.
    pub fn take_latest(&mut self) -> Option<String> {
        self.due = None;
        self.latest.take()
    }

    pub fn latest(&self) -> Option<&str> {
        self.latest.as_deref()
    }
}

impl Default for ContentBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flush_before_window() {
        let now = Instant::now();
        let mut buffer = ContentBuffer::default();
        buffer.schedule("a".to_string(), now);

        assert!(buffer.poll(now + Duration::from_millis(100)).is_none());
        assert_eq!(
            buffer.poll(now + Duration::from_millis(150)).as_deref(),
            Some("a")
        );
    }

    #[test]
    fn test_rapid_events_collapse_to_latest() {
        let now = Instant::now();
        let mut buffer = ContentBuffer::default();

        buffer.schedule("a".to_string(), now);
        buffer.schedule("ab".to_string(), now + Duration::from_millis(50));
        buffer.schedule("abc".to_string(), now + Duration::from_millis(100));

        // The deadline moved with each schedule; only one flush occurs
        // and it carries the last value.
        assert!(buffer.poll(now + Duration::from_millis(150)).is_none());
        assert_eq!(
            buffer.poll(now + Duration::from_millis(250)).as_deref(),
            Some("abc")
        );
        assert!(buffer.poll(now + Duration::from_millis(500)).is_none());
    }

    #[test]
    fn test_trailing_take() {
        let now = Instant::now();
        let mut buffer = ContentBuffer::default();
        buffer.schedule("final".to_string(), now);

        assert_eq!(buffer.take_latest().as_deref(), Some("final"));
        assert!(buffer.next_deadline().is_none());
        assert!(buffer.take_latest().is_none());
    }
}
