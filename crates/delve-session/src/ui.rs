use delve_types::{Message, ResearchStage, StageUpdate};

use crate::error::ErrorNotice;
use crate::intermediate::IntermediateResults;

/// Everything the session pushes at the presentation layer. Consumers
/// drain these from the receiver handed back by
/// [`crate::ChatSession::new`].
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Streaming started (true) or finished (false).
    Streaming(bool),
    /// A message was appended to the transcript.
    MessageAppended(Message),
    /// The transcript was truncated to this length (edit-and-resend).
    MessagesTruncated(usize),
    /// The visible stage changed; `None` clears the indicator.
    Stage(Option<StageUpdate>),
    /// A stage finished and moved to the completed list.
    StageCompleted(ResearchStage),
    /// Debounced snapshot of the answer streamed so far.
    Content(String),
    /// Updated in-flight research hints.
    Intermediate(IntermediateResults),
    /// A user-facing error notice.
    Notice(ErrorNotice),
}
