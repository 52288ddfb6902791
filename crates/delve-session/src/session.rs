use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;

use delve_cache::{CacheSweeper, ResponseCache};
use delve_client::{AgentTransport, CancelToken, LangGraphClient, RunRequest};
use delve_types::{AgentMode, Feedback, Message, ResearchStage, Role, StageUpdate, ThreadMetadata};

use crate::config::SessionConfig;
use crate::error::{classify_error, SessionError};
use crate::interpret::StreamInterpreter;
use crate::log::{InteractionEvent, LogSink, TracingLog};
use crate::patterns::StagePatterns;
use crate::store::SessionStore;
use crate::ui::UiEvent;

/// Upper bound on timer sleep when no debounce or dwell deadline is
/// pending.
const IDLE_DEADLINE: Duration = Duration::from_secs(60);

/// Cadence of the background cache sweep.
const SWEEP_PERIOD: Duration = Duration::from_secs(300);

/// How a send resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Answered from the response cache; no network call was made.
    CacheHit,
    /// The stream ran to completion.
    Completed,
    /// Cancelled by the user; partial state was discarded.
    Aborted,
    /// The run failed; a notice was surfaced.
    Failed,
}

/// Clonable handle that can cancel the in-flight send from another
/// task while [`ChatSession::send`] holds the session borrowed.
#[derive(Clone, Default)]
pub struct StopHandle {
    cancel: Arc<Mutex<Option<CancelToken>>>,
}

impl StopHandle {
    pub fn stop(&self) {
        if let Some(token) = self.slot().as_ref() {
            token.cancel();
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CancelToken>> {
        self.cancel.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Owns one conversation: the transcript, the response cache, both
/// backend transports, and the in-flight send state. All UI-relevant
/// changes flow out through the event channel handed back by the
/// constructor.
///
/// One send is active at a time; a second [`send`](Self::send) while
/// streaming is rejected with [`SessionError::Busy`] rather than
/// queued.
pub struct ChatSession {
    config: SessionConfig,
    cache: Arc<ResponseCache>,
    react: Arc<dyn AgentTransport>,
    deep: Arc<dyn AgentTransport>,
    store: SessionStore,
    log: Arc<dyn LogSink>,
    patterns: StagePatterns,
    events_tx: UnboundedSender<UiEvent>,
    stop: StopHandle,
    streaming: bool,
    sweeper: Option<CacheSweeper>,
}

impl ChatSession {
    /// Build a session talking to real backends per the config, with
    /// the background cache sweep running. Must be called inside a
    /// tokio runtime.
    pub fn new(config: SessionConfig) -> Result<(Self, UnboundedReceiver<UiEvent>)> {
        let react = LangGraphClient::new(&config.react_url, config.api_key.as_deref())?;
        let deep = LangGraphClient::new(&config.deep_url, config.api_key.as_deref())?;
        let (mut session, events) = Self::with_parts(
            config,
            Arc::new(react),
            Arc::new(deep),
            Arc::new(ResponseCache::default()),
            Arc::new(TracingLog),
        );
        session.start_sweeper(SWEEP_PERIOD);
        Ok((session, events))
    }

    /// Assemble a session from injected collaborators.
    pub fn with_parts(
        config: SessionConfig,
        react: Arc<dyn AgentTransport>,
        deep: Arc<dyn AgentTransport>,
        cache: Arc<ResponseCache>,
        log: Arc<dyn LogSink>,
    ) -> (Self, UnboundedReceiver<UiEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let session = Self {
            config,
            cache,
            react,
            deep,
            store: SessionStore::new(),
            log,
            patterns: StagePatterns::default(),
            events_tx,
            stop: StopHandle::default(),
            streaming: false,
            sweeper: None,
        };
        (session, events_rx)
    }

    pub fn with_patterns(mut self, patterns: StagePatterns) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn mode(&self) -> AgentMode {
        self.config.mode
    }

    /// Switching mode does not switch thread; each backend keeps its
    /// own current thread.
    pub fn set_mode(&mut self, mode: AgentMode) {
        self.config.mode = mode;
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Start (or restart) the periodic expired-entry sweep.
    pub fn start_sweeper(&mut self, period: Duration) {
        let mut sweeper = CacheSweeper::with_period(self.cache.clone(), period);
        sweeper.start();
        self.sweeper = Some(sweeper);
    }

    pub fn stop_sweeper(&mut self) {
        if let Some(sweeper) = &mut self.sweeper {
            sweeper.stop();
        }
        self.sweeper = None;
    }

    /// Send a user question and drive it to resolution. Transport and
    /// stream failures resolve as [`SendOutcome::Failed`] with a
    /// notice emitted; only an overlapping send is an `Err`.
    pub async fn send(&mut self, question: impl Into<String>) -> Result<SendOutcome, SessionError> {
        if self.streaming {
            return Err(SessionError::Busy);
        }
        let question = question.into();

        self.streaming = true;
        let cancel = CancelToken::new();
        *self.stop.slot() = Some(cancel.clone());
        self.emit(UiEvent::Streaming(true));

        let result = self.send_inner(&question, cancel.clone()).await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(_) if cancel.is_cancelled() => SendOutcome::Aborted,
            Err(err) => {
                tracing::error!(error = %format!("{:#}", err), "send failed");
                let notice = classify_error(&err, &question);
                let update = StageUpdate::new(ResearchStage::Error)
                    .with_message(notice.message.clone())
                    .with_error(notice.description.clone());
                self.emit(UiEvent::Stage(Some(update)));
                // The failed question is not answered in the transcript;
                // the notice carries it so the caller can offer a retry.
                self.emit(UiEvent::Notice(notice));
                SendOutcome::Failed
            }
        };

        // Cleanup runs on every path. The error stage stays visible;
        // everything else is cleared.
        *self.stop.slot() = None;
        self.streaming = false;
        if outcome != SendOutcome::Failed {
            self.emit(UiEvent::Stage(None));
        }
        self.emit(UiEvent::Streaming(false));

        Ok(outcome)
    }

    /// Cancel the in-flight send, if any. Resolution is cooperative:
    /// the stream stops within one tick and the send resolves as
    /// aborted, not as an error.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Handle for cancelling from another task.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Rewrite a prior user message: truncate the transcript at that
    /// point and resend. Never mutates finalized messages in place.
    pub async fn edit_message(
        &mut self,
        index: usize,
        new_content: impl Into<String>,
    ) -> Result<SendOutcome, SessionError> {
        if self.streaming {
            return Err(SessionError::Busy);
        }
        let message = self
            .store
            .message(index)
            .ok_or(SessionError::NoSuchMessage(index))?;
        if message.role != Role::User {
            return Err(SessionError::NotUser(index));
        }

        let remaining = self.store.truncate_from(index);
        self.emit(UiEvent::MessagesTruncated(remaining));
        self.send(new_content).await
    }

    /// Attach a rating to an assistant answer.
    pub fn set_feedback(
        &mut self,
        index: usize,
        rating: u8,
        comment: Option<String>,
    ) -> Result<(), SessionError> {
        if !(1..=5).contains(&rating) {
            return Err(SessionError::InvalidRating(rating));
        }
        let message = self
            .store
            .message_mut(index)
            .ok_or(SessionError::NoSuchMessage(index))?;
        if message.role != Role::Assistant {
            return Err(SessionError::NotAssistant(index));
        }
        message.feedback = Some(Feedback::new(rating, comment));
        self.log.record(InteractionEvent::FeedbackGiven {
            message_index: index,
            rating,
        });
        Ok(())
    }

    /// Start a fresh chat: empty transcript, no current threads.
    pub fn new_chat(&mut self) {
        self.store.reset();
        self.emit(UiEvent::MessagesTruncated(0));
    }

    /// Replace the transcript with a thread's server-side state.
    pub async fn load_thread(&mut self, thread_id: &str, deep: bool) -> Result<()> {
        let transport = self.transport_for(deep);
        let messages = transport
            .thread_state(thread_id)
            .await
            .context("failed to load thread state")?;
        self.store.set_thread_for_backend(deep, thread_id.to_string());
        self.emit(UiEvent::MessagesTruncated(0));
        for message in &messages {
            self.emit(UiEvent::MessageAppended(message.clone()));
        }
        self.store.replace_messages(messages);
        Ok(())
    }

    /// Delete the current thread on the given backend.
    pub async fn delete_current_thread(&mut self, deep: bool) -> Result<bool> {
        let Some(thread_id) = self.store.thread_for_backend(deep).map(str::to_string) else {
            return Ok(false);
        };
        let deleted = self.transport_for(deep).delete_thread(&thread_id).await?;
        if deleted {
            self.store.forget_thread(&thread_id);
        }
        Ok(deleted)
    }

    async fn send_inner(&mut self, question: &str, cancel: CancelToken) -> Result<SendOutcome> {
        let question_index = self.store.messages().len();
        let user = Message::user(question);
        self.store.push(user.clone());
        self.emit(UiEvent::MessageAppended(user));
        self.log.record(InteractionEvent::QuestionAsked {
            question: question.to_string(),
            mode: self.config.mode,
        });

        if self.config.mode.uses_cache() {
            if let Some(entry) = self.cache.get(question) {
                let mut reply = Message::assistant(entry.response.clone()).with_duration(0);
                if let Some(sources) = entry.sources.clone() {
                    reply = reply.with_sources(sources);
                }
                let source_count = reply.sources.as_ref().map_or(0, Vec::len);
                self.store.push(reply.clone());
                self.emit(UiEvent::MessageAppended(reply));
                self.log.record(InteractionEvent::AnswerProduced {
                    question: question.to_string(),
                    duration_ms: 0,
                    source_count,
                    from_cache: true,
                });
                return Ok(SendOutcome::CacheHit);
            }
        }

        let deep = self.config.mode.uses_deep_backend();
        let transport = self.transport_for(deep);
        let assistant_id = if deep {
            self.config.deep_assistant.clone()
        } else {
            self.config.react_assistant.clone()
        };

        let thread_id = match self.store.thread_for_backend(deep) {
            Some(id) => id.to_string(),
            None => {
                let id = transport
                    .create_thread()
                    .await
                    .context("failed to create a conversation thread")?;
                self.store
                    .register_thread(id.clone(), ThreadMetadata::new(question, &assistant_id));
                self.store.set_thread_for_backend(deep, id.clone());
                id
            }
        };

        let started = Instant::now();
        let mut interpreter = StreamInterpreter::new(
            self.config.mode,
            question,
            self.patterns.clone(),
            self.events_tx.clone(),
            started,
        );

        let mut request =
            RunRequest::new(question).with_history(self.store.history_before(question_index));
        if let Some(params) = self.config.effective_params() {
            request = request.with_params(params);
        }

        let mut stream = transport
            .stream_run(&thread_id, &assistant_id, request, cancel.clone())
            .await?;

        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        let mut aborted = false;
        loop {
            let deadline = interpreter
                .next_deadline()
                .unwrap_or_else(|| Instant::now() + IDLE_DEADLINE);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    aborted = true;
                    break;
                }
                maybe_event = stream.next() => match maybe_event {
                    Some(Ok(event)) => interpreter.handle_event(&event, Instant::now()),
                    Some(Err(err)) => return Err(err),
                    None => break,
                },
                _ = tokio::time::sleep_until(deadline) => {
                    interpreter.poll_timers(Instant::now());
                }
                _ = ticker.tick() => {
                    interpreter.tick_elapsed(Instant::now());
                }
            }
        }

        if aborted || cancel.is_cancelled() {
            return Ok(SendOutcome::Aborted);
        }

        let now = Instant::now();
        let duration_ms = now.duration_since(started).as_millis() as u64;
        let (content, sources) = interpreter.finish(now);

        let Some(content) = content else {
            return Ok(SendOutcome::Completed);
        };

        let reply = Message::assistant(content.clone())
            .with_duration(duration_ms)
            .with_sources(sources.clone());
        self.store.push(reply.clone());
        self.emit(UiEvent::MessageAppended(reply));

        if self.config.mode.uses_cache() {
            let cached_sources = if sources.is_empty() {
                None
            } else {
                Some(sources.clone())
            };
            self.cache
                .set(question, content.clone(), cached_sources, Some(duration_ms), None);
        }

        self.log.record(InteractionEvent::AnswerProduced {
            question: question.to_string(),
            duration_ms,
            source_count: sources.len(),
            from_cache: false,
        });

        Ok(SendOutcome::Completed)
    }

    fn transport_for(&self, deep: bool) -> Arc<dyn AgentTransport> {
        if deep {
            self.deep.clone()
        } else {
            self.react.clone()
        }
    }

    fn emit(&self, event: UiEvent) {
        let _ = self.events_tx.send(event);
    }
}
