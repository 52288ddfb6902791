use delve_types::{AgentMode, DeepResearchParams};

/// Connection and behavior settings for a [`crate::ChatSession`].
///
/// Defaults match a local deployment: the quick react agent on port
/// 2025 and the deep researcher on port 2024.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub react_url: String,
    pub react_assistant: String,
    pub deep_url: String,
    pub deep_assistant: String,
    pub api_key: Option<String>,
    pub mode: AgentMode,
    pub deep_params: DeepResearchParams,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            react_url: "http://127.0.0.1:2025".to_string(),
            react_assistant: "react_agent".to_string(),
            deep_url: "http://127.0.0.1:2024".to_string(),
            deep_assistant: "Deep Researcher".to_string(),
            api_key: None,
            mode: AgentMode::Default,
            deep_params: DeepResearchParams::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_mode(mut self, mode: AgentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_deep_params(mut self, params: DeepResearchParams) -> Self {
        self.deep_params = params;
        self
    }

    /// Parameters actually sent for the active mode. Quick mode pins
    /// a single shallow iteration; deep mode uses the configured
    /// values after clamping.
    pub fn effective_params(&self) -> Option<DeepResearchParams> {
        match self.mode {
            AgentMode::Default => None,
            AgentMode::Quick => Some(DeepResearchParams::quick()),
            AgentMode::Deep => Some(self.deep_params.clone().clamped()),
        }
    }
}
