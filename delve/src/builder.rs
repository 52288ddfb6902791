//! High-level builder API for assembling a chat session

use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::session::{ChatSession, SessionConfig, UiEvent};
use crate::types::{AgentMode, DeepResearchParams};

/// High-level builder for a [`ChatSession`] wired to real backends.
///
/// # Example
///
/// ```rust,no_run
/// use delve::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> Result<()> {
/// let (session, events) = SessionBuilder::new()
///     .react_backend("http://127.0.0.1:2025", "react_agent")
///     .deep_backend("http://127.0.0.1:2024", "Deep Researcher")
///     .mode(AgentMode::Default)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    config: SessionConfig,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Create a builder with local-deployment defaults.
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    /// Set the fast-agent endpoint and assistant id.
    pub fn react_backend(
        mut self,
        url: impl Into<String>,
        assistant: impl Into<String>,
    ) -> Self {
        self.config.react_url = url.into();
        self.config.react_assistant = assistant.into();
        self
    }

    /// Set the deep-research endpoint and assistant id.
    pub fn deep_backend(mut self, url: impl Into<String>, assistant: impl Into<String>) -> Self {
        self.config.deep_url = url.into();
        self.config.deep_assistant = assistant.into();
        self
    }

    /// Set the API key sent to both backends.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set the starting agent mode (default: the fast agent).
    pub fn mode(mut self, mode: AgentMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the deep-research parameter defaults.
    pub fn deep_params(mut self, params: DeepResearchParams) -> Self {
        self.config.deep_params = params;
        self
    }

    /// Build the session and its UI event receiver. Must be called
    /// inside a tokio runtime (the cache sweeper spawns a task).
    pub fn build(self) -> Result<(ChatSession, UnboundedReceiver<UiEvent>)> {
        ChatSession::new(self.config)
    }
}
