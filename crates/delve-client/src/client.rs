use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use delve_types::{Message, Role};

use crate::cancel::CancelToken;
use crate::history::messages_from_state;
use crate::sse::parse_event_sse_stream;
use crate::transport::{AgentTransport, EventStream, RunRequest};

/// Stream modes requested on every run; the interpreter consumes all
/// three event families.
const STREAM_MODES: [&str; 3] = ["updates", "values", "messages"];

/// Server-side thread listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadInfo {
    pub thread_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// HTTP client for one LangGraph-compatible agent server.
///
/// Two instances exist in a typical session: one for the fast "react"
/// agent and one for the deep-research backend. They share nothing;
/// thread ids from one are meaningless to the other.
pub struct LangGraphClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl LangGraphClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            headers.insert(
                "x-api-key",
                HeaderValue::from_str(key).context("Invalid API key format")?,
            );
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List server threads for an assistant. Assistant ids that look
    /// like UUIDs are matched on `assistant_id` metadata, anything
    /// else on `graph_id`.
    pub async fn search_threads(&self, assistant_id: &str) -> Result<Vec<ThreadInfo>> {
        let metadata = if Uuid::parse_str(assistant_id).is_ok() {
            json!({ "assistant_id": assistant_id })
        } else {
            json!({ "graph_id": assistant_id })
        };

        let response = self
            .http_client
            .post(format!("{}/threads/search", self.base_url))
            .json(&json!({ "metadata": metadata, "limit": 100 }))
            .send()
            .await
            .context("Failed to search threads")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Agent server error ({}): {}", status, error_text);
        }

        let threads: Vec<ThreadInfo> = response
            .json()
            .await
            .context("Failed to parse thread list")?;
        Ok(threads)
    }

    fn build_run_payload(&self, assistant_id: &str, request: &RunRequest) -> Value {
        let mut messages: Vec<Value> = request
            .history
            .iter()
            .map(|msg| {
                json!({
                    "role": match msg.role {
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    },
                    "content": msg.content,
                })
            })
            .collect();
        messages.push(json!({ "role": "user", "content": request.message }));

        let configurable = match &request.params {
            Some(params) => serde_json::to_value(params).unwrap_or_else(|_| json!({})),
            None => json!({}),
        };

        json!({
            "assistant_id": assistant_id,
            "input": { "messages": messages },
            "config": { "configurable": configurable },
            "stream_mode": STREAM_MODES,
        })
    }
}

#[async_trait]
impl AgentTransport for LangGraphClient {
    async fn create_thread(&self) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/threads", self.base_url))
            .json(&json!({}))
            .send()
            .await
            .context("Failed to create thread")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Thread creation failed ({}): {}", status, error_text);
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse thread response")?;
        let thread_id = body
            .get("thread_id")
            .and_then(|v| v.as_str())
            .context("Thread response missing thread_id")?
            .to_string();

        tracing::debug!(%thread_id, "created thread");
        Ok(thread_id)
    }

    async fn thread_state(&self, thread_id: &str) -> Result<Vec<Message>> {
        let response = self
            .http_client
            .get(format!("{}/threads/{}/state", self.base_url, thread_id))
            .send()
            .await
            .context("Failed to load thread state")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Thread state failed ({}): {}", status, error_text);
        }

        let state: Value = response
            .json()
            .await
            .context("Failed to parse thread state")?;
        Ok(messages_from_state(&state))
    }

    async fn stream_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        request: RunRequest,
        cancel: CancelToken,
    ) -> Result<EventStream> {
        let payload = self.build_run_payload(assistant_id, &request);

        tracing::debug!(
            %thread_id,
            %assistant_id,
            history_len = request.history.len(),
            has_params = request.params.is_some(),
            "starting streamed run"
        );

        let response = self
            .http_client
            .post(format!(
                "{}/threads/{}/runs/stream",
                self.base_url, thread_id
            ))
            .json(&payload)
            .send()
            .await
            .context("Failed to start run")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Agent server error ({}): {}", status, error_text);
        }

        Ok(parse_event_sse_stream(response, cancel))
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<bool> {
        let response = self
            .http_client
            .delete(format!("{}/threads/{}", self.base_url, thread_id))
            .send()
            .await
            .context("Failed to delete thread")?;

        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_types::DeepResearchParams;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = LangGraphClient::new("http://127.0.0.1:2024/", None).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:2024");
    }

    #[test]
    fn test_run_payload_shape() {
        let client = LangGraphClient::new("http://127.0.0.1:2024", None).unwrap();
        let request = RunRequest::new("new question")
            .with_history(vec![Message::user("old question"), Message::assistant("old answer")])
            .with_params(DeepResearchParams::quick());

        let payload = client.build_run_payload("Deep Researcher", &request);

        let messages = payload["input"]["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"], "new question");

        let configurable = &payload["config"]["configurable"];
        assert_eq!(configurable["max_structured_output_retries"], 1);
        assert_eq!(configurable["allow_clarification"], false);
        assert_eq!(configurable["max_concurrent_research_units"], 5);
        assert_eq!(configurable["max_researcher_iterations"], 1);

        assert_eq!(payload["stream_mode"][0], "updates");
    }

    #[test]
    fn test_run_payload_without_params_sends_empty_configurable() {
        let client = LangGraphClient::new("http://127.0.0.1:2024", None).unwrap();
        let payload = client.build_run_payload("react_agent", &RunRequest::new("q"));
        assert!(payload["config"]["configurable"]
            .as_object()
            .unwrap()
            .is_empty());
    }
}
