use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recognized event tags on a streamed run. The server may emit other
/// tags; those pass through as `Other` and are ignored downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Metadata,
    Updates,
    Values,
    MessagesPartial,
    Other,
}

/// One heterogeneous event record from a streamed run: a string tag
/// plus an arbitrary structured payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub event: String,
    pub data: Value,
}

impl RunEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self.event.as_str() {
            "metadata" => EventKind::Metadata,
            "updates" => EventKind::Updates,
            "values" => EventKind::Values,
            "messages/partial" => EventKind::MessagesPartial,
            _ => EventKind::Other,
        }
    }
}
