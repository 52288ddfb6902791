use delve_types::AgentMode;

/// Interaction milestones worth recording outside the transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    QuestionAsked {
        question: String,
        mode: AgentMode,
    },
    AnswerProduced {
        question: String,
        duration_ms: u64,
        source_count: usize,
        from_cache: bool,
    },
    FeedbackGiven {
        message_index: usize,
        rating: u8,
    },
}

/// Sink for interaction events. Implementations must not block; the
/// session calls this inline on its own task.
pub trait LogSink: Send + Sync {
    fn record(&self, event: InteractionEvent);
}

/// Discards everything.
pub struct NoopLog;

impl LogSink for NoopLog {
    fn record(&self, _event: InteractionEvent) {}
}

/// Emits events through `tracing` at info level.
pub struct TracingLog;

impl LogSink for TracingLog {
    fn record(&self, event: InteractionEvent) {
        match event {
            InteractionEvent::QuestionAsked { question, mode } => {
                tracing::info!(question = %question, mode = ?mode, "question asked");
            }
            InteractionEvent::AnswerProduced {
                question,
                duration_ms,
                source_count,
                from_cache,
            } => {
                tracing::info!(
                    question = %question,
                    duration_ms,
                    source_count,
                    from_cache,
                    "answer produced"
                );
            }
            InteractionEvent::FeedbackGiven {
                message_index,
                rating,
            } => {
                tracing::info!(message_index, rating, "feedback given");
            }
        }
    }
}
