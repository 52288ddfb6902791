pub mod cancel;
pub mod client;
pub mod history;
pub mod sse;
pub mod transport;

pub use cancel::CancelToken;
pub use client::{LangGraphClient, ThreadInfo};
pub use sse::parse_event_sse_stream;
pub use transport::{AgentTransport, EventStream, RunRequest};
