use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::Source;

/// Chat message roles (the agent protocol also emits "human"/"ai",
/// normalized by the client when loading thread state)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single chat message owned by the session, in display order.
///
/// Assistant messages are append-only once finalized: editing a prior
/// user message truncates the list and resends, it never mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,

    /// Wall-clock time the answer took, in milliseconds. Forced to 0
    /// for cache hits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Deduplicated citations attached at finalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            duration_ms: None,
            sources: None,
            feedback: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            duration_ms: None,
            sources: None,
            feedback: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        if !sources.is_empty() {
            self.sources = Some(sources);
        }
        self
    }
}

/// User rating of an assistant answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    /// 1..=5
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Feedback {
    pub fn new(rating: u8, comment: Option<String>) -> Self {
        Self {
            rating: rating.clamp(1, 5),
            comment,
            timestamp: Utc::now(),
        }
    }
}
