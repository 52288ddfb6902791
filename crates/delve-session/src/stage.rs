use std::time::Duration;
use tokio::time::Instant;

use delve_types::{ResearchStage, StageUpdate};

/// Stage state machine with minimum-dwell-time smoothing.
///
/// A requested transition that arrives before the minimum display time
/// has elapsed since the last change is deferred for the remainder; a
/// later request replaces the pending one (latest wins, never queued).
/// Every applied transition records the previous stage in the
/// completed list, deduplicated in insertion order.
#[derive(Debug)]
pub struct StageTracker {
    current: Option<StageUpdate>,
    completed: Vec<ResearchStage>,
    last_change: Instant,
    pending: Option<(StageUpdate, Duration, Instant)>,
}

impl StageTracker {
    pub fn new(now: Instant) -> Self {
        Self {
            current: None,
            completed: Vec::new(),
            last_change: now,
            pending: None,
        }
    }

    /// Request a transition with a minimum display time for the stage
    /// currently shown. Returns the update if it applied immediately.
    pub fn request(
        &mut self,
        update: StageUpdate,
        min_display: Duration,
        now: Instant,
    ) -> Option<StageUpdate> {
        let elapsed = now.duration_since(self.last_change);
        let remaining = min_display.saturating_sub(elapsed);

        // Latest request wins: any pending deferred transition is
        // dropped either way.
        self.pending = None;

        if remaining > Duration::ZERO {
            self.pending = Some((update, min_display, now + remaining));
            None
        } else {
            Some(self.apply_gated(update, now))
        }
    }

    /// Apply a transition immediately, bypassing dwell gating. Does
    /// not reset the dwell clock: only gated transitions own it, so an
    /// ungated snap between two gated requests cannot stretch the
    /// second one's deferral.
    pub fn set(&mut self, update: StageUpdate) -> StageUpdate {
        self.pending = None;
        self.apply(update)
    }

    /// Fire the pending transition if its deferral has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<StageUpdate> {
        match &self.pending {
            Some((_, _, due)) if *due <= now => {
                let (update, _, _) = self.pending.take()?;
                Some(self.apply_gated(update, now))
            }
            _ => None,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, _, due)| *due)
    }

    pub fn current(&self) -> Option<&StageUpdate> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut StageUpdate> {
        self.current.as_mut()
    }

    pub fn completed(&self) -> &[ResearchStage] {
        &self.completed
    }

    /// Drop pending and current state. The completed list survives so
    /// the UI can still render what ran.
    pub fn clear(&mut self) {
        self.current = None;
        self.pending = None;
    }

    fn apply(&mut self, update: StageUpdate) -> StageUpdate {
        if let Some(prev) = &self.current {
            if prev.stage != update.stage && !self.completed.contains(&prev.stage) {
                self.completed.push(prev.stage);
            }
        }
        self.current = Some(update.clone());
        update
    }

    fn apply_gated(&mut self, update: StageUpdate, now: Instant) -> StageUpdate {
        self.last_change = now;
        self.apply(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(stage: ResearchStage) -> StageUpdate {
        StageUpdate::new(stage)
    }

    #[test]
    fn test_immediate_transition_when_dwell_satisfied() {
        let now = Instant::now();
        let mut tracker = StageTracker::new(now);

        let applied = tracker.request(update(ResearchStage::Planning), Duration::ZERO, now);
        assert!(applied.is_some());
        assert_eq!(tracker.current().unwrap().stage, ResearchStage::Planning);
    }

    #[test]
    fn test_transition_deferred_for_remaining_dwell() {
        let now = Instant::now();
        let mut tracker = StageTracker::new(now);
        tracker.set(update(ResearchStage::Thinking));

        // 500ms later, request searching with a 1500ms minimum: must
        // not apply before 1500ms since the thinking transition.
        let at_500 = now + Duration::from_millis(500);
        let applied = tracker.request(
            update(ResearchStage::Searching),
            Duration::from_millis(1500),
            at_500,
        );
        assert!(applied.is_none());
        assert_eq!(tracker.current().unwrap().stage, ResearchStage::Thinking);

        // Not yet due at 1499ms.
        assert!(tracker.poll(now + Duration::from_millis(1499)).is_none());

        // Due at 1500ms.
        let fired = tracker.poll(now + Duration::from_millis(1500)).unwrap();
        assert_eq!(fired.stage, ResearchStage::Searching);
    }

    #[test]
    fn test_later_request_replaces_pending() {
        let now = Instant::now();
        let mut tracker = StageTracker::new(now);
        tracker.set(update(ResearchStage::Thinking));

        let at_100 = now + Duration::from_millis(100);
        tracker.request(update(ResearchStage::Searching), Duration::from_millis(2000), at_100);
        let at_200 = now + Duration::from_millis(200);
        tracker.request(update(ResearchStage::Writing), Duration::from_millis(2000), at_200);

        // Only the final request's target is ever observed.
        let fired = tracker.poll(now + Duration::from_secs(5)).unwrap();
        assert_eq!(fired.stage, ResearchStage::Writing);
        assert!(tracker.poll(now + Duration::from_secs(6)).is_none());
    }

    #[test]
    fn test_completed_stages_dedup_insertion_order() {
        let now = Instant::now();
        let mut tracker = StageTracker::new(now);

        tracker.set(update(ResearchStage::Planning));
        tracker.set(update(ResearchStage::Thinking));
        tracker.set(update(ResearchStage::Searching));
        tracker.set(update(ResearchStage::Thinking));
        tracker.set(update(ResearchStage::Writing));

        assert_eq!(
            tracker.completed(),
            &[
                ResearchStage::Planning,
                ResearchStage::Thinking,
                ResearchStage::Searching,
            ]
        );
    }

    #[test]
    fn test_same_stage_reset_not_marked_completed() {
        let now = Instant::now();
        let mut tracker = StageTracker::new(now);

        tracker.set(update(ResearchStage::Writing));
        tracker.set(StageUpdate::new(ResearchStage::Writing).with_message("still writing"));

        assert!(tracker.completed().is_empty());
    }

    #[test]
    fn test_immediate_set_cancels_pending() {
        let now = Instant::now();
        let mut tracker = StageTracker::new(now);
        tracker.set(update(ResearchStage::Thinking));
        tracker.request(update(ResearchStage::Searching), Duration::from_secs(2), now);

        tracker.set(update(ResearchStage::Writing));

        assert_eq!(tracker.current().unwrap().stage, ResearchStage::Writing);
        assert!(tracker.poll(now + Duration::from_secs(10)).is_none());
    }

    #[test]
    fn test_ungated_set_does_not_reset_dwell_clock() {
        let now = Instant::now();
        let mut tracker = StageTracker::new(now);

        // An ungated snap right before a gated request must not push
        // the request's deferral out.
        let at_2s = now + Duration::from_secs(2);
        tracker.set(update(ResearchStage::Researching));
        let applied = tracker.request(
            update(ResearchStage::Searching),
            Duration::from_millis(1500),
            at_2s,
        );
        assert_eq!(applied.unwrap().stage, ResearchStage::Searching);
    }
}
