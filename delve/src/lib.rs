//! # Delve - Research Agent Client for Rust
//!
//! Delve is a client-side engine for chat applications backed by
//! LangGraph-compatible research agents:
//! - 📡 **Streaming runs** (SSE event streams with cooperative cancellation)
//! - 🔬 **Stage reduction** (flicker-free research-stage tracking with dwell times)
//! - 🔗 **Source extraction** (deduplicated citations mined from event payloads)
//! - ⚡ **Response cache** (normalized-query TTL cache with hit/miss stats)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use delve::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (mut session, mut events) = SessionBuilder::new()
//!         .react_backend("http://127.0.0.1:2025", "react_agent")
//!         .deep_backend("http://127.0.0.1:2024", "Deep Researcher")
//!         .build()?;
//!
//!     tokio::spawn(async move {
//!         while let Some(event) = events.recv().await {
//!             if let UiEvent::Content(text) = event {
//!                 println!("{}", text);
//!             }
//!         }
//!     });
//!
//!     session.send("What changed in EV battery tech this year?").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Delve consists of several composable crates:
//!
//! - **delve-types**: Core types (Message, Source, ResearchStage, RunEvent)
//! - **delve-cache**: Normalized-query TTL cache and background sweeper
//! - **delve-client**: LangGraph HTTP client, SSE parsing, cancellation
//! - **delve-session**: Stream interpretation and send orchestration

// Re-export all public APIs
pub use delve_cache as cache;
pub use delve_client as client;
pub use delve_session as session;
pub use delve_types as types;

// Re-export commonly used types
pub use delve_cache::{CacheStats, CacheSweeper, ResponseCache};
pub use delve_client::{AgentTransport, CancelToken, LangGraphClient};
pub use delve_session::{ChatSession, SendOutcome, SessionConfig, StopHandle, UiEvent};
pub use delve_types::{AgentMode, Message, ResearchStage, Source, StageUpdate};

/// High-level builder for assembling a chat session
pub mod builder;

/// Convenient prelude with commonly used types
pub mod prelude {
    pub use crate::builder::SessionBuilder;
    pub use crate::session::{ChatSession, SendOutcome, SessionConfig, UiEvent};
    pub use crate::types::{AgentMode, Message, ResearchStage, Source};
    pub use anyhow::Result;
}
