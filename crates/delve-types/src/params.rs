use serde::{Deserialize, Serialize};

/// Which backend serves a send, and with what parameter preset.
///
/// Default mode talks to the fast "react" agent and uses the response
/// cache. Quick and Deep both target the deep-research backend; Quick
/// pins a reduced parameter set, Deep uses the user-configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    Default,
    Quick,
    Deep,
}

impl AgentMode {
    /// Default mode is the only one backed by the response cache.
    pub fn uses_cache(&self) -> bool {
        matches!(self, Self::Default)
    }

    pub fn uses_deep_backend(&self) -> bool {
        matches!(self, Self::Quick | Self::Deep)
    }
}

impl Default for AgentMode {
    fn default() -> Self {
        Self::Default
    }
}

/// Configurable parameters forwarded to the deep-research backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepResearchParams {
    /// 1..=10
    pub max_structured_output_retries: u32,
    pub allow_clarification: bool,
    /// 1..=10
    pub max_concurrent_research_units: u32,
    /// 1..=20
    pub max_researcher_iterations: u32,
}

impl Default for DeepResearchParams {
    fn default() -> Self {
        Self {
            max_structured_output_retries: 3,
            allow_clarification: true,
            max_concurrent_research_units: 5,
            max_researcher_iterations: 10,
        }
    }
}

impl DeepResearchParams {
    /// Fixed preset used in quick mode regardless of user settings.
    pub fn quick() -> Self {
        Self {
            max_structured_output_retries: 1,
            allow_clarification: false,
            max_concurrent_research_units: 5,
            max_researcher_iterations: 1,
        }
    }

    /// Clamp all fields into their documented ranges.
    pub fn clamped(mut self) -> Self {
        self.max_structured_output_retries = self.max_structured_output_retries.clamp(1, 10);
        self.max_concurrent_research_units = self.max_concurrent_research_units.clamp(1, 10);
        self.max_researcher_iterations = self.max_researcher_iterations.clamp(1, 20);
        self
    }
}
