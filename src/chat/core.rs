//! The turn state machine that merges arriving tokens into a transcript.
//!
//! One turn: append the user message and an initially-empty assistant
//! message, open exactly one stream session, then apply events until the
//! stream ends, fails, or the user cancels. Subscribers get a
//! transcript-changed notification after every applied token so a UI can
//! render incrementally.
use thiserror::Error;
use tokio::sync::watch;

use super::history::PromptHistory;
use super::models::{Message, Role, Transcript};
use super::session::{SessionEvent, StreamSession};
use crate::ollama::{OllamaClient, TokenStream};

/// Placeholder shown when a turn fails before producing any text.
pub const ERROR_NOTICE: &str = "Something went wrong while generating a response.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("prompt is blank")]
    BlankPrompt,
    #[error("a response is already streaming")]
    Busy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Streaming,
}

/// The outcome of applying one session event to the transcript.
#[derive(Debug, PartialEq, Eq)]
pub enum TurnEvent {
    /// A token was appended to the active assistant message.
    Token(String),
    /// The stream ended normally.
    Finished,
    /// The stream failed. The transcript keeps any partial content already
    /// received; only an entirely empty assistant message is replaced by
    /// the error notice.
    Failed,
}

pub struct Chat {
    client: OllamaClient,
    transcript: Transcript,
    history: PromptHistory,
    state: TurnState,
    session: Option<StreamSession>,
    changed: watch::Sender<u64>,
}

impl Chat {
    pub fn new(client: OllamaClient) -> Self {
        let (changed, _) = watch::channel(0);
        Self {
            client,
            transcript: Transcript::new(),
            history: PromptHistory::new(),
            state: TurnState::Idle,
            session: None,
            changed,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn history(&mut self) -> &mut PromptHistory {
        &mut self.history
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.state == TurnState::Streaming
    }

    /// Subscribe to transcript-changed notifications. The watched value is
    /// a revision counter bumped on every change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changed.subscribe()
    }

    fn notify(&self) {
        self.changed.send_modify(|rev| *rev += 1);
    }

    /// Submit a prompt and open the stream for this turn. Rejects blank
    /// prompts and concurrent submits; a connect failure is surfaced in the
    /// transcript as an error notice rather than returned.
    pub async fn submit(&mut self, prompt: &str) -> Result<(), ChatError> {
        let prompt = self.open_turn(prompt)?;

        match self.client.generate(&prompt).await {
            Ok(stream) => self.begin_turn(stream),
            Err(err) => {
                tracing::error!("Failed to open generate stream: {}", err);
                self.transcript.replace_last_content(ERROR_NOTICE);
                self.notify();
            }
        }

        Ok(())
    }

    /// Validate the prompt and append the user message plus the empty
    /// assistant message this turn will stream into.
    fn open_turn(&mut self, prompt: &str) -> Result<String, ChatError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ChatError::BlankPrompt);
        }
        if self.is_streaming() {
            return Err(ChatError::Busy);
        }

        self.history.record(prompt);
        self.transcript.push(Message::new(Role::User, prompt));
        self.transcript.push(Message::new(Role::Assistant, ""));
        self.notify();

        Ok(prompt.to_string())
    }

    /// Attach an already-open token stream as the active session.
    fn begin_turn(&mut self, stream: TokenStream) {
        self.session = Some(StreamSession::spawn(stream));
        self.state = TurnState::Streaming;
    }

    /// Pull the next event from the active session and apply it to the
    /// transcript. Returns `Finished` immediately when no session is live.
    pub async fn next_event(&mut self) -> TurnEvent {
        let Some(session) = self.session.as_mut() else {
            return TurnEvent::Finished;
        };

        match session.next_event().await {
            SessionEvent::Token(token) => {
                self.transcript.append_to_last(&token);
                self.notify();
                TurnEvent::Token(token)
            }
            SessionEvent::Done => {
                self.finish_turn();
                TurnEvent::Finished
            }
            SessionEvent::Failed(err) => {
                tracing::error!("Generate stream failed: {}", err);
                // Keep partial content. A late transport error only
                // replaces an assistant message that is still empty.
                if self.transcript.last().is_some_and(|m| m.content.is_empty()) {
                    self.transcript.replace_last_content(ERROR_NOTICE);
                }
                self.finish_turn();
                TurnEvent::Failed
            }
        }
    }

    /// Cancel the in-flight turn. Partial content already applied stays as
    /// the final content of the assistant message. Idempotent; buffered
    /// tokens are never applied after cancellation.
    pub fn cancel(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.cancel();
        }
        if self.state != TurnState::Idle {
            self.state = TurnState::Idle;
            self.notify();
        }
    }

    fn finish_turn(&mut self) {
        self.session = None;
        self.state = TurnState::Idle;
        self.notify();
    }
}
