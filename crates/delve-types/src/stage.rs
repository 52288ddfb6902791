use serde::{Deserialize, Serialize};

/// Coarse semantic phase of an in-flight answer. Exactly one stage is
/// current per request; previous stages accumulate in a completed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchStage {
    Planning,
    Thinking,
    Searching,
    Researching,
    Analyzing,
    Writing,
    Complete,
    Error,
}

impl ResearchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Thinking => "thinking",
            Self::Searching => "searching",
            Self::Researching => "researching",
            Self::Analyzing => "analyzing",
            Self::Writing => "writing",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

/// Stage value pushed to the UI, with optional progress details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageUpdate {
    pub stage: ResearchStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl StageUpdate {
    pub fn new(stage: ResearchStage) -> Self {
        Self {
            stage,
            message: None,
            error: None,
            current_source: None,
            progress: None,
            total: None,
            elapsed_ms: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
