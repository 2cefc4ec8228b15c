//! Chat session state and turn execution

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use wayfare_wire::{ChunkStream, DecodedFrame, FrameDecoder, TurnRequest};

use crate::{
    config::ChatConfig,
    error::{Error, Result},
    events::{ChatEvent, TurnOutcome},
    interaction::{self, InteractionChoice},
    reducer::{self, Change, Flow},
    transcript::{Message, MessageId, PendingInteraction, Transcript},
    transport::Transport,
};

/// Mutable session state, guarded by a single lock
#[derive(Debug)]
struct ChatState {
    transcript: Transcript,
    session_id: String,
    /// Assistant message the open stream writes into
    active: Option<MessageId>,
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A conversation with the agent service.
///
/// Cloning is cheap and every clone drives the same conversation, so one task
/// can await [`ChatSession::send`] while another calls [`ChatSession::stop`].
/// At most one turn streams at a time.
#[derive(Clone)]
pub struct ChatSession {
    transport: Arc<dyn Transport>,
    config: Arc<ChatConfig>,
    state: Arc<Mutex<ChatState>>,
    cancel: Arc<Mutex<CancellationToken>>,
    event_tx: broadcast::Sender<ChatEvent>,
}

impl ChatSession {
    /// Create a session with a fresh session id
    pub fn new(transport: Arc<dyn Transport>, config: ChatConfig) -> Self {
        Self::with_session_id(transport, config, new_session_id())
    }

    /// Create a session that continues a known session id
    pub fn with_session_id(
        transport: Arc<dyn Transport>,
        config: ChatConfig,
        session_id: impl Into<String>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            transport,
            config: Arc::new(config),
            state: Arc::new(Mutex::new(ChatState {
                transcript: Transcript::new(),
                session_id: session_id.into(),
                active: None,
            })),
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            event_tx,
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.event_tx.subscribe()
    }

    /// The session configuration
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Snapshot of the transcript
    pub fn transcript(&self) -> Transcript {
        self.state.lock().transcript.clone()
    }

    /// Conversation correlation token sent with every request
    pub fn session_id(&self) -> String {
        self.state.lock().session_id.clone()
    }

    /// Whether a reply is streaming
    pub fn is_busy(&self) -> bool {
        self.state.lock().active.is_some()
    }

    /// The unanswered interaction on the latest assistant message
    pub fn pending_interaction(&self) -> Option<PendingInteraction> {
        self.state
            .lock()
            .transcript
            .last_assistant()
            .and_then(Message::open_interaction)
            .cloned()
    }

    /// Choices for the pending interaction, empty when there is none
    pub fn interaction_choices(&self) -> Vec<InteractionChoice> {
        self.pending_interaction()
            .map(|p| interaction::choices(&p.interaction, &self.config.notices))
            .unwrap_or_default()
    }

    /// Send a user message and stream the reply into the transcript.
    ///
    /// Resolves once the reply closes. Rejections (`EmptyMessage`, `Busy`)
    /// leave the transcript unchanged; everything that goes wrong after the
    /// turn started is reported as a [`TurnOutcome`].
    pub async fn send(&self, text: &str) -> Result<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyMessage);
        }

        let turn = {
            let mut state = self.state.lock();
            if state.active.is_some() {
                return Err(Error::Busy);
            }
            self.begin_turn(&mut state, text, text)
        };
        Ok(self.run_turn(turn).await)
    }

    /// Answer the pending interaction and resume the conversation.
    ///
    /// `value` goes to the agent service, `label` is what the transcript shows
    /// as the user's message (the value is shown when the label is empty).
    pub async fn resolve_pending_interaction(
        &self,
        value: &str,
        label: &str,
    ) -> Result<TurnOutcome> {
        let choice = InteractionChoice::new(value.trim(), label.trim());
        let display = if choice.label.is_empty() {
            choice.value.clone()
        } else {
            choice.label.clone()
        };
        if display.is_empty() {
            return Err(Error::EmptyMessage);
        }

        let turn = {
            let mut state = self.state.lock();
            if state.active.is_some() {
                return Err(Error::Busy);
            }
            let last_id = state.transcript.last_assistant().map(|m| m.id.clone());
            let message = state
                .transcript
                .latest_interaction_mut()
                .ok_or(Error::NoPendingInteraction)?;
            let superseded = last_id.as_ref() != Some(&message.id);
            let Some(pending) = message.pending_interaction.as_mut() else {
                return Err(Error::NoPendingInteraction);
            };
            if pending.is_resolved() {
                return Err(Error::InteractionAlreadyResolved);
            }
            // A newer reply came in after the user typed past the question
            if superseded {
                return Err(Error::NoPendingInteraction);
            }
            let payload = choice.value.clone();
            pending.resolution = Some(choice);
            self.begin_turn(&mut state, &display, &payload)
        };
        Ok(self.run_turn(turn).await)
    }

    /// Answer with one of the choices from [`ChatSession::interaction_choices`]
    pub async fn resolve_with(&self, choice: &InteractionChoice) -> Result<TurnOutcome> {
        self.resolve_pending_interaction(&choice.value, &choice.label)
            .await
    }

    /// Stop the streaming reply, keeping whatever arrived. No-op when idle.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        self.cancel.lock().cancel();
        let Some(id) = state.active.take() else {
            return;
        };
        let resolved = state
            .transcript
            .get_mut(&id)
            .map(|m| reducer::close(m, self.config.strip_finish_marker))
            .unwrap_or_default();
        drop(state);

        tracing::debug!("Stopped turn {}", id);
        if !resolved.is_empty() {
            self.emit(ChatEvent::ToolCallsResolved {
                message_id: id,
                names: resolved,
            });
        }
    }

    /// Stop any reply, drop the transcript and start a new session id
    pub fn clear(&self) {
        let session_id = {
            let mut state = self.state.lock();
            self.cancel.lock().cancel();
            state.active = None;
            state.transcript.clear();
            state.session_id = new_session_id();
            state.session_id.clone()
        };
        tracing::debug!("Started new session {}", session_id);
        self.emit(ChatEvent::Cleared { session_id });
    }

    fn emit(&self, event: ChatEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Append the user entry and the placeholder, arm a fresh cancel token
    fn begin_turn(&self, state: &mut ChatState, display: &str, payload: &str) -> Turn {
        let user_id = state.transcript.push(Message::user(display));
        let mut history = state.transcript.to_wire();
        if let Some(last) = history.last_mut() {
            last.content = payload.to_string();
        }
        let assistant_id = state.transcript.push(Message::assistant_placeholder());
        state.active = Some(assistant_id.clone());

        let token = {
            let mut cancel = self.cancel.lock();
            *cancel = CancellationToken::new();
            cancel.clone()
        };

        self.emit(ChatEvent::TurnStarted {
            user_message_id: user_id,
            assistant_message_id: assistant_id.clone(),
        });

        Turn {
            request: TurnRequest {
                session_id: state.session_id.clone(),
                history,
                query: payload.to_string(),
            },
            message_id: assistant_id,
            token,
        }
    }

    async fn run_turn(&self, turn: Turn) -> TurnOutcome {
        let Turn {
            request,
            message_id,
            token,
        } = turn;

        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            opened = self.transport.open(request) => Some(opened),
        };

        let outcome = match opened {
            None => TurnOutcome::Cancelled,
            Some(Err(e)) => {
                if e.is_retryable() {
                    tracing::debug!("Agent service looks temporarily unavailable");
                }
                TurnOutcome::TransportFailed(e.to_string())
            }
            Some(Ok(chunks)) => self.pump(chunks, &message_id, &token).await,
        };
        self.end_turn(&message_id, &token, outcome)
    }

    /// Read chunks until the reply closes
    async fn pump(
        &self,
        mut chunks: ChunkStream,
        message_id: &MessageId,
        token: &CancellationToken,
    ) -> TurnOutcome {
        let mut decoder = FrameDecoder::new();

        'stream: loop {
            let chunk = tokio::select! {
                biased;
                _ = token.cancelled() => break TurnOutcome::Cancelled,
                chunk = chunks.next() => chunk,
            };

            let text = match chunk {
                Some(Ok(text)) => text,
                Some(Err(e)) => break TurnOutcome::TransportFailed(e.to_string()),
                None => {
                    if let Some(rest) = decoder.finish() {
                        tracing::debug!("Discarding unterminated frame: {:?}", rest);
                    }
                    break TurnOutcome::Completed;
                }
            };

            for raw in decoder.push(&text) {
                let decoded = match self.config.dialect.decode(&raw) {
                    Ok(Some(decoded)) => decoded,
                    Ok(None) => {
                        tracing::debug!("Ignoring frame kind {:?}", raw.event);
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!("Dropping malformed frame: {}", e);
                        continue;
                    }
                };
                if let Some(outcome) = self.apply_frame(message_id, token, decoded) {
                    break 'stream outcome;
                }
            }
        }
    }

    /// Apply one frame; `Some` closes the stream
    fn apply_frame(
        &self,
        message_id: &MessageId,
        token: &CancellationToken,
        decoded: DecodedFrame,
    ) -> Option<TurnOutcome> {
        let (step, agent) = {
            let mut state = self.state.lock();
            if token.is_cancelled() {
                return Some(TurnOutcome::Cancelled);
            }
            let message = match state.transcript.get_mut(message_id) {
                Some(message) => message,
                None => return Some(TurnOutcome::Cancelled),
            };
            let unlabeled = message.agent.is_none();
            let step = reducer::apply(message, decoded, &self.config.notices);
            let agent = message.agent.clone().filter(|_| unlabeled);
            (step, agent)
        };

        let message_id = message_id.clone();
        if let Some(agent) = agent {
            self.emit(ChatEvent::AgentIdentified {
                message_id: message_id.clone(),
                agent,
            });
        }
        match step.change {
            Change::None | Change::AgentError(_) => {}
            Change::Text(delta) => self.emit(ChatEvent::TextDelta { message_id, delta }),
            Change::ToolStarted(name) => self.emit(ChatEvent::ToolCallStarted { message_id, name }),
            Change::ToolsResolved(names) => {
                self.emit(ChatEvent::ToolCallsResolved { message_id, names })
            }
            Change::Interaction(interaction) => self.emit(ChatEvent::InteractionRequested {
                message_id,
                interaction,
            }),
        }

        match step.flow {
            Flow::Continue => None,
            Flow::Finish => Some(TurnOutcome::Completed),
            Flow::Suspend => Some(TurnOutcome::AwaitingInteraction),
            Flow::Failed(message) => Some(TurnOutcome::AgentError(message)),
        }
    }

    /// Finalize the reply and release the session if this turn still owns it
    fn end_turn(
        &self,
        message_id: &MessageId,
        token: &CancellationToken,
        outcome: TurnOutcome,
    ) -> TurnOutcome {
        let (outcome, resolved) = {
            let mut state = self.state.lock();
            let outcome = if token.is_cancelled() {
                TurnOutcome::Cancelled
            } else {
                outcome
            };

            let resolved = match state.transcript.get_mut(message_id) {
                Some(message) => {
                    if let TurnOutcome::TransportFailed(error) = &outcome {
                        reducer::fail(message, error, &self.config.notices);
                    }
                    reducer::close(message, self.config.strip_finish_marker)
                }
                None => Vec::new(),
            };

            if state.active.as_ref() == Some(message_id) {
                state.active = None;
            }
            (outcome, resolved)
        };

        match &outcome {
            TurnOutcome::TransportFailed(error) => {
                tracing::error!("Agent stream failed: {}", error)
            }
            TurnOutcome::AgentError(error) => tracing::warn!("Agent reported an error: {}", error),
            other => tracing::debug!("Turn {} ended: {:?}", message_id, other),
        }

        if !resolved.is_empty() {
            self.emit(ChatEvent::ToolCallsResolved {
                message_id: message_id.clone(),
                names: resolved,
            });
        }
        self.emit(ChatEvent::TurnEnded {
            message_id: message_id.clone(),
            outcome: outcome.clone(),
        });
        outcome
    }
}

/// A turn that has been recorded but not yet streamed
struct Turn {
    request: TurnRequest,
    message_id: MessageId,
    token: CancellationToken,
}
