use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use delve_types::{DeepResearchParams, Message, RunEvent};

use crate::cancel::CancelToken;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<RunEvent>> + Send>>;

/// Everything a run needs besides the thread and assistant ids: the
/// outgoing question, prior history, and optional deep-research
/// configuration (absent for the fast agent).
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub message: String,
    pub history: Vec<Message>,
    pub params: Option<DeepResearchParams>,
}

impl RunRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
            params: None,
        }
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn with_params(mut self, params: DeepResearchParams) -> Self {
        self.params = Some(params);
        self
    }
}

/// Seam between the orchestrator and a remote agent server.
///
/// [`crate::LangGraphClient`] is the production implementation; tests
/// drive the orchestrator with an in-memory fake.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Create a new conversation thread, returning its id.
    async fn create_thread(&self) -> Result<String>;

    /// Load the normalized message list held by a thread.
    async fn thread_state(&self, thread_id: &str) -> Result<Vec<Message>>;

    /// Start a streaming run. The returned stream stops yielding
    /// within one tick of the token being cancelled.
    async fn stream_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        request: RunRequest,
        cancel: CancelToken,
    ) -> Result<EventStream>;

    /// Delete a thread; false means the server refused.
    async fn delete_thread(&self, thread_id: &str) -> Result<bool>;
}
