//! Session controller: mode-gated dispatch of utterances into the note store.
//!
//! One `Session` exists per process and is passed to every front-end
//! operation. It owns the current mode and listen lifecycle; lifecycle
//! changes go through [`Lifecycle::transition`] so overlapping callers get a
//! `TransitionError` instead of racing each other.
//!
//! After a cycle ends in `Noted` or `Error` a cool-down task returns the
//! lifecycle to `Idle`. Starting a new listen cancels that task.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::classifier::{classify, Classification};
use super::note_store::{NoteStore, NoteStoreError};
use crate::adapters::{CaptureError, SpeechToText, Summarizer, TextToSpeech};
use crate::domain::{FailureReason, Lifecycle, Mode, ModeChange, Outcome, Summary, TransitionError};

/// Default delay before a display state falls back to `Idle`
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(2000);

/// Errors surfaced by the session controller
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Note could not be stored: {0}")]
    Storage(#[source] NoteStoreError),
}

/// Point-in-time view of the session for status displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub mode: Mode,
    /// Mode switch waiting for the current cycle to end
    pub pending_mode: Option<Mode>,
    pub lifecycle: Lifecycle,
    /// Notes appended by this process
    pub notes_taken: usize,
}

struct SessionState {
    mode: Mode,
    pending_mode: Option<Mode>,
    lifecycle: Lifecycle,
    cooldown: Option<CancellationToken>,
}

impl SessionState {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            pending_mode: None,
            lifecycle: Lifecycle::default(),
            cooldown: None,
        }
    }

    fn enter(&mut self, to: Lifecycle) -> Result<(), TransitionError> {
        self.lifecycle = self.lifecycle.transition(to)?;
        if !matches!(to, Lifecycle::Listening | Lifecycle::Processing) {
            if let Some(mode) = self.pending_mode.take() {
                self.mode = mode;
            }
        }
        Ok(())
    }

    fn cancel_cooldown(&mut self) {
        if let Some(token) = self.cooldown.take() {
            token.cancel();
        }
    }
}

/// The single active dictation session
pub struct Session {
    id: Uuid,
    store: Arc<NoteStore>,
    state: Arc<Mutex<SessionState>>,
    cooldown: Duration,
    speaker: Option<Arc<dyn TextToSpeech>>,
}

impl Session {
    /// Create a session in Note Mode
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self {
            id: Uuid::new_v4(),
            store,
            state: Arc::new(Mutex::new(SessionState::new(Mode::default()))),
            cooldown: DEFAULT_COOLDOWN,
            speaker: None,
        }
    }

    /// Start in a specific mode
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.state = Arc::new(Mutex::new(SessionState::new(mode)));
        self
    }

    /// Display interval before `Noted`/`Error` fall back to `Idle`.
    /// A zero interval keeps the display state until the next listen.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Speak replies through a text-to-speech adapter
    pub fn with_speaker(mut self, speaker: Arc<dyn TextToSpeech>) -> Self {
        self.speaker = Some(speaker);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub async fn mode(&self) -> Mode {
        self.state.lock().await.mode
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        self.state.lock().await.lifecycle
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let notes_taken = self.store.len().await;
        let state = self.state.lock().await;
        SessionSnapshot {
            id: self.id,
            mode: state.mode,
            pending_mode: state.pending_mode,
            lifecycle: state.lifecycle,
            notes_taken,
        }
    }

    /// Switch mode. Idempotent; deferred while a listen cycle is in flight.
    pub async fn set_mode(&self, target: Mode) -> ModeChange {
        let mut state = self.state.lock().await;
        match state.lifecycle {
            Lifecycle::Listening | Lifecycle::Processing if state.mode != target => {
                state.pending_mode = Some(target);
                info!(session = %self.id, mode = %target, "Mode switch deferred until cycle ends");
                ModeChange::Deferred(target)
            }
            Lifecycle::Listening | Lifecycle::Processing => {
                state.pending_mode = None;
                ModeChange::Applied(target)
            }
            _ => {
                state.pending_mode = None;
                if state.mode != target {
                    info!(session = %self.id, mode = %target, "Switched mode");
                }
                state.mode = target;
                ModeChange::Applied(target)
            }
        }
    }

    /// Begin a listen cycle (`Idle`/`Noted`/`Error` → `Listening`)
    pub async fn start_listening(&self) -> Result<(), TransitionError> {
        let mut state = self.state.lock().await;
        state.enter(Lifecycle::Listening)?;
        state.cancel_cooldown();
        debug!(session = %self.id, "Listening");
        Ok(())
    }

    /// Move into `Processing`, opening a cycle first for text-only callers
    async fn begin_processing(&self) -> Result<Mode, TransitionError> {
        let mut state = self.state.lock().await;
        if state.lifecycle.can_start_listening() {
            state.enter(Lifecycle::Listening)?;
            state.cancel_cooldown();
        }
        state.enter(Lifecycle::Processing)?;
        Ok(state.mode)
    }

    /// Close the cycle in the display state matching `outcome`
    async fn finish(&self, outcome: Outcome) -> Result<Outcome, TransitionError> {
        let target = if outcome.is_noted() {
            Lifecycle::Noted
        } else {
            Lifecycle::Error
        };

        let mut state = self.state.lock().await;
        state.enter(target)?;
        self.schedule_cooldown(&mut state);

        match &outcome {
            Outcome::Noted { entry, .. } => {
                info!(session = %self.id, date = %entry.date_key, time = %entry.timestamp, "Noted");
            }
            Outcome::Error { reason, .. } => {
                debug!(session = %self.id, ?reason, "Cycle ended without a note");
            }
        }

        Ok(outcome)
    }

    fn schedule_cooldown(&self, state: &mut SessionState) {
        state.cancel_cooldown();
        if self.cooldown.is_zero() {
            return;
        }

        let token = CancellationToken::new();
        state.cooldown = Some(token.clone());

        let shared = Arc::clone(&self.state);
        let delay = self.cooldown;
        let id = self.id;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let mut state = shared.lock().await;
                    if token.is_cancelled() || !state.lifecycle.is_display() {
                        return;
                    }
                    if state.enter(Lifecycle::Idle).is_ok() {
                        state.cooldown = None;
                        debug!(session = %id, "Back to idle");
                    }
                }
            }
        });
    }

    /// Route one transcribed utterance according to the current mode.
    ///
    /// Classification results (empty, not a note command) come back as
    /// `Outcome::Error`. Only storage faults and rejected transitions are
    /// returned as `Err`.
    pub async fn handle_utterance(&self, utterance: &str) -> Result<Outcome, SessionError> {
        let mode = self.begin_processing().await?;

        if utterance.trim().is_empty() {
            let outcome = Outcome::Error {
                reason: FailureReason::EmptyContent,
                heard: None,
            };
            return Ok(self.finish(outcome).await?);
        }

        let payload = match mode {
            Mode::Note => utterance.trim().to_string(),
            Mode::Assistant => match classify(utterance) {
                Classification::Note { trigger, payload } => {
                    debug!(session = %self.id, trigger, "Note command");
                    payload
                }
                Classification::NotANote => {
                    let outcome = Outcome::Error {
                        reason: FailureReason::NotANoteCommand,
                        heard: Some(utterance.to_string()),
                    };
                    return Ok(self.finish(outcome).await?);
                }
            },
        };

        match self.store.append(&payload).await {
            Ok(entry) => {
                let outcome = Outcome::Noted {
                    entry,
                    heard: utterance.to_string(),
                };
                Ok(self.finish(outcome).await?)
            }
            Err(NoteStoreError::EmptyContent) => {
                let outcome = Outcome::Error {
                    reason: FailureReason::EmptyContent,
                    heard: Some(utterance.to_string()),
                };
                Ok(self.finish(outcome).await?)
            }
            Err(err) => {
                warn!(session = %self.id, error = %err, "Failed to store note");
                let outcome = Outcome::Error {
                    reason: FailureReason::Storage {
                        message: err.to_string(),
                    },
                    heard: Some(utterance.to_string()),
                };
                self.finish(outcome).await?;
                Err(SessionError::Storage(err))
            }
        }
    }

    /// Run a full listen cycle against a speech-to-text collaborator
    pub async fn capture_and_handle(&self, stt: &dyn SpeechToText) -> Result<Outcome, SessionError> {
        self.start_listening().await?;

        match stt.capture().await {
            Ok(text) => {
                debug!(session = %self.id, adapter = stt.name(), "Captured utterance");
                self.handle_utterance(&text).await
            }
            Err(err) => {
                let reason = match err {
                    CaptureError::Timeout => FailureReason::CaptureTimeout,
                    CaptureError::Unrecognized => FailureReason::CaptureUnrecognized,
                    CaptureError::Failed(message) => {
                        warn!(session = %self.id, adapter = stt.name(), %message, "Capture failed");
                        FailureReason::CaptureFailed { message }
                    }
                };
                let outcome = Outcome::Error {
                    reason,
                    heard: None,
                };
                Ok(self.finish(outcome).await?)
            }
        }
    }

    /// Summarize today's log with an LLM collaborator.
    ///
    /// An empty or missing log short-circuits to `Summary::NoNotes` without
    /// calling the summarizer; summarizer faults become `Summary::Failed`.
    pub async fn summarize_today(&self, summarizer: &dyn Summarizer) -> Summary {
        let log = match self.store.read_today().await {
            Ok(log) => log,
            Err(err) => {
                warn!(session = %self.id, error = %err, "Failed to read today's notes");
                return Summary::Failed(err.to_string());
            }
        };

        if log.is_empty() {
            return Summary::NoNotes;
        }

        match summarizer.summarize(&summary_prompt(&log.content)).await {
            Ok(reply) => {
                info!(session = %self.id, adapter = summarizer.name(), date = %log.date_key, "Summarized notes");
                Summary::Summarized(reply)
            }
            Err(err) => {
                warn!(session = %self.id, adapter = summarizer.name(), error = %err, "Summarization failed");
                Summary::Failed(format!("{:#}", err))
            }
        }
    }

    /// Speak `text` in the background; failures are logged and dropped.
    ///
    /// Returns the playback task so short-lived callers can wait for it.
    pub fn announce(&self, text: impl Into<String>) -> Option<JoinHandle<()>> {
        let speaker = self.speaker.clone()?;
        let text = text.into();
        let id = self.id;
        Some(tokio::spawn(async move {
            if let Err(err) = speaker.speak(&text).await {
                warn!(session = %id, adapter = speaker.name(), error = %err, "Speech failed");
            }
        }))
    }
}

/// Prompt sent to the summarizer for a day's notes
pub fn summary_prompt(notes: &str) -> String {
    format!(
        "Please summarize the following notes in a concise, natural way that can be read aloud.\n\
         Focus on the key points and action items. Keep it brief and conversational.\n\
         \n\
         Notes:\n\
         {}\n\
         \n\
         Summary:",
        notes
    )
}
