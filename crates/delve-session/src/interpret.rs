use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;

use delve_types::{AgentMode, EventKind, ResearchStage, RunEvent, Source, StageUpdate};
use serde_json::Value;

use crate::debounce::ContentBuffer;
use crate::extract::extract_sources;
use crate::intermediate::IntermediateResults;
use crate::patterns::StagePatterns;
use crate::stage::StageTracker;
use crate::ui::UiEvent;
use delve_types::SourceSet;

/// Folds the raw event sequence of one run into UI-relevant derived
/// state: answer text (debounced), current stage (dwell-smoothed),
/// deduplicated sources, and intermediate research hints.
///
/// Owned by a single in-flight send; dropped when the send resolves.
pub struct StreamInterpreter {
    mode: AgentMode,
    question: String,
    patterns: StagePatterns,
    tracker: StageTracker,
    buffer: ContentBuffer,
    sources: SourceSet,
    intermediate: IntermediateResults,
    tx: UnboundedSender<UiEvent>,
    started: Instant,
    emitted_completed: usize,
}

impl StreamInterpreter {
    pub fn new(
        mode: AgentMode,
        question: impl Into<String>,
        patterns: StagePatterns,
        tx: UnboundedSender<UiEvent>,
        now: Instant,
    ) -> Self {
        let mut interpreter = Self {
            mode,
            question: question.into(),
            patterns,
            tracker: StageTracker::new(now),
            buffer: ContentBuffer::default(),
            sources: SourceSet::new(),
            intermediate: IntermediateResults::default(),
            tx,
            started: now,
            emitted_completed: 0,
        };
        let planning = interpreter
            .tracker
            .set(StageUpdate::new(ResearchStage::Planning).with_message("Planning the response"));
        interpreter.emit_stage(planning);
        interpreter
    }

    pub fn handle_event(&mut self, event: &RunEvent, now: Instant) {
        match event.kind() {
            EventKind::Metadata => {
                self.scan_payload_text(&event.data, now);
                extract_sources(&event.data, &mut self.sources);
            }
            EventKind::Updates => {
                self.scan_payload_text(&event.data, now);
                self.handle_updates(&event.data, now);
            }
            EventKind::Values => {
                self.handle_values(&event.data, now);
            }
            EventKind::MessagesPartial => {
                self.handle_partial(&event.data, now);
            }
            EventKind::Other => {}
        }
    }

    /// Fire any due deferred stage transition or content flush.
    pub fn poll_timers(&mut self, now: Instant) {
        if let Some(update) = self.tracker.poll(now) {
            self.emit_stage(update);
        }
        if let Some(content) = self.buffer.poll(now) {
            let _ = self.tx.send(UiEvent::Content(content));
        }
    }

    /// Earliest pending timer across the dwell and debounce state.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.tracker.next_deadline(), self.buffer.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Refresh the elapsed-time readout on the visible stage.
    pub fn tick_elapsed(&mut self, now: Instant) {
        let elapsed_ms = now.duration_since(self.started).as_millis() as u64;
        if let Some(current) = self.tracker.current_mut() {
            current.elapsed_ms = Some(elapsed_ms);
            let snapshot = current.clone();
            let _ = self.tx.send(UiEvent::Stage(Some(snapshot)));
        }
    }

    /// Trailing flush at stream end: returns the final buffered answer
    /// (already echo-filtered) and the frozen ordered source list.
    pub fn finish(&mut self, _now: Instant) -> (Option<String>, Vec<Source>) {
        let content = self.buffer.take_latest().filter(|c| !c.is_empty());
        if let Some(final_content) = &content {
            let _ = self.tx.send(UiEvent::Content(final_content.clone()));
        }
        (content, self.sources.to_vec())
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Keyword heuristics plus intermediate-hint scanning, applied to
    /// metadata and updates payloads.
    fn scan_payload_text(&mut self, data: &Value, now: Instant) {
        let text = data.to_string();
        if let Some(stage) = self.patterns.stage_from_text(&text) {
            let update = self.stamped(StageUpdate::new(stage), now);
            let applied = self.tracker.set(update);
            self.emit_stage(applied);
        }
        if self.intermediate.scan(data) {
            let _ = self.tx.send(UiEvent::Intermediate(self.intermediate.clone()));
        }
    }

    /// Per-node update handling. Each top-level key whose last message
    /// carries non-empty string content contributes that message;
    /// content-less messages are skipped outright. Default mode layers
    /// the marker-driven micro state machine with dwell gating on top,
    /// keyed by which graph node produced the message; quick and deep
    /// mode collapse every update to writing.
    fn handle_updates(&mut self, data: &Value, now: Instant) {
        let Some(obj) = data.as_object() else {
            return;
        };

        for (key, node) in obj {
            let Some(last) = node
                .get("messages")
                .and_then(|m| m.as_array())
                .and_then(|m| m.last())
            else {
                continue;
            };

            let Some(text) = last
                .get("content")
                .and_then(|c| c.as_str())
                .filter(|t| !t.is_empty())
            else {
                continue;
            };
            let has_tool_calls = last
                .get("tool_calls")
                .and_then(|t| t.as_array())
                .map(|t| !t.is_empty())
                .unwrap_or(false);

            if self.mode.uses_deep_backend() {
                let update = self.stamped(StageUpdate::new(ResearchStage::Writing), now);
                let applied = self.tracker.set(update);
                self.emit_stage(applied);
            } else {
                self.apply_marker_rules(key, text, has_tool_calls, now);
            }

            let filtered = self.filter_echo(text);
            self.buffer.schedule(filtered, now);
        }

        extract_sources(data, &mut self.sources);
    }

    fn apply_marker_rules(&mut self, node_key: &str, text: &str, has_tool_calls: bool, now: Instant) {
        let from_agent = node_key == self.patterns.agent_node;
        let from_tools = node_key == self.patterns.tools_node;

        let requested = if from_agent && text.contains(&self.patterns.thinking_marker) {
            let update = self
                .stamped(StageUpdate::new(ResearchStage::Thinking), now)
                .with_message(first_line(text));
            self.tracker
                .request(update, self.patterns.thinking_min_display, now)
        } else if from_agent && has_tool_calls {
            let update = self.stamped(StageUpdate::new(ResearchStage::Searching), now);
            self.tracker
                .request(update, self.patterns.tool_call_min_display, now)
        } else if from_tools && text.contains(&self.patterns.tool_marker) {
            let update = self.stamped(StageUpdate::new(ResearchStage::Searching), now);
            self.tracker
                .request(update, self.patterns.tool_min_display, now)
        } else if from_agent && self.patterns.has_result_marker(text) {
            let update = self.stamped(StageUpdate::new(ResearchStage::Writing), now);
            self.tracker
                .request(update, self.patterns.result_min_display, now)
        } else {
            None
        };

        if let Some(update) = requested {
            self.emit_stage(update);
        }
    }

    /// `values` events carry the full message list; the last message's
    /// content becomes the buffered answer, and the whole payload is
    /// mined for sources.
    fn handle_values(&mut self, data: &Value, now: Instant) {
        let messages = data
            .get("messages")
            .and_then(|m| m.as_array())
            .or_else(|| data.as_array());

        if let Some(last) = messages.and_then(|m| m.last()) {
            if let Some(text) = last.get("content").and_then(|c| c.as_str()) {
                if !text.is_empty() {
                    let update = self.stamped(StageUpdate::new(ResearchStage::Writing), now);
                    let applied = self.tracker.set(update);
                    self.emit_stage(applied);
                    let filtered = self.filter_echo(text);
                    self.buffer.schedule(filtered, now);
                }
            }
        }

        extract_sources(data, &mut self.sources);
    }

    /// `messages/partial` carries a list whose first element holds the
    /// growing answer text; tool-call arguments inside it may already
    /// carry search results worth mining for sources.
    fn handle_partial(&mut self, data: &Value, now: Instant) {
        let Some(first) = data.as_array().and_then(|m| m.first()) else {
            return;
        };
        extract_sources(first, &mut self.sources);

        let Some(text) = first.get("content").and_then(|c| c.as_str()) else {
            return;
        };
        if text.is_empty() {
            return;
        }

        let update = self.stamped(StageUpdate::new(ResearchStage::Writing), now);
        let applied = self.tracker.set(update);
        self.emit_stage(applied);

        let filtered = self.filter_echo(text);
        self.buffer.schedule(filtered, now);
    }

    /// Suppress content that merely echoes the user's question.
    /// Marker-bearing content is never filtered; a recognized prefix
    /// plus the exact question is stripped; a bare exact echo becomes
    /// the empty string.
    fn filter_echo(&self, content: &str) -> String {
        let trimmed = content.trim();

        if self.patterns.has_process_marker(trimmed) {
            return content.to_string();
        }

        for prefix in &self.patterns.echo_prefixes {
            let tagged = format!("{}{}", prefix, self.question);
            if trimmed.contains(&tagged) {
                return trimmed.replace(&tagged, "").trim().to_string();
            }
        }

        if trimmed == self.question {
            return String::new();
        }

        content.to_string()
    }

    fn stamped(&self, mut update: StageUpdate, now: Instant) -> StageUpdate {
        update.elapsed_ms = Some(now.duration_since(self.started).as_millis() as u64);
        update
    }

    fn emit_stage(&mut self, update: StageUpdate) {
        for stage in &self.tracker.completed()[self.emitted_completed..] {
            let _ = self.tx.send(UiEvent::StageCompleted(*stage));
        }
        self.emitted_completed = self.tracker.completed().len();
        let _ = self.tx.send(UiEvent::Stage(Some(update)));
    }
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or("").to_string()
}
