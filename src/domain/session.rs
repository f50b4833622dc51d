//! Session mode, listen lifecycle and the outcomes handed to front-ends.
//!
//! The lifecycle is a small state machine:
//!
//! ```text
//! Idle → Listening → Processing → Noted | Error → Idle
//! ```
//!
//! A new listen cycle may begin from `Idle` or from either display state
//! (`Noted`, `Error`). Everything else is rejected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::note::NoteEntry;

/// How raw utterances are interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Every non-empty utterance is a note, taken verbatim
    #[default]
    Note,

    /// Only utterances containing a trigger phrase become notes
    Assistant,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Note => write!(f, "note"),
            Mode::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "note" | "notes" => Ok(Mode::Note),
            "assistant" => Ok(Mode::Assistant),
            other => Err(format!("unknown mode '{}' (expected note or assistant)", other)),
        }
    }
}

/// Phase of the listen/process/result cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Idle,
    Listening,
    Processing,
    Noted,
    Error,
}

impl Lifecycle {
    /// Whether a new listen cycle may begin from this state
    pub fn can_start_listening(self) -> bool {
        matches!(self, Lifecycle::Idle | Lifecycle::Noted | Lifecycle::Error)
    }

    /// Terminal display states shown until the cool-down returns to `Idle`
    pub fn is_display(self) -> bool {
        matches!(self, Lifecycle::Noted | Lifecycle::Error)
    }

    /// Validate a transition against the state machine
    pub fn transition(self, to: Lifecycle) -> Result<Lifecycle, TransitionError> {
        let allowed = match (self, to) {
            (from, Lifecycle::Listening) => from.can_start_listening(),
            (Lifecycle::Listening, Lifecycle::Processing) => true,
            (Lifecycle::Processing, Lifecycle::Noted | Lifecycle::Error) => true,
            // capture failures end the cycle without a processing phase
            (Lifecycle::Listening, Lifecycle::Error) => true,
            (Lifecycle::Noted | Lifecycle::Error | Lifecycle::Idle, Lifecycle::Idle) => true,
            _ => false,
        };

        if allowed {
            Ok(to)
        } else {
            Err(TransitionError { from: self, to })
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Lifecycle::Idle => "idle",
            Lifecycle::Listening => "listening",
            Lifecycle::Processing => "processing",
            Lifecycle::Noted => "noted",
            Lifecycle::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Rejected lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid lifecycle transition: {from} → {to}")]
pub struct TransitionError {
    pub from: Lifecycle,
    pub to: Lifecycle,
}

/// Why a listen cycle ended without a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FailureReason {
    /// No speech within the capture window
    CaptureTimeout,

    /// Audio captured but not transcribable
    CaptureUnrecognized,

    /// Speech-to-text backend fault
    CaptureFailed { message: String },

    /// Blank utterance or payload
    EmptyContent,

    /// Assistant Mode utterance without a trigger phrase
    NotANoteCommand,

    /// Daily log could not be written
    Storage { message: String },
}

/// Tagged result of one listen cycle, rendered by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum Outcome {
    Noted {
        entry: NoteEntry,
        heard: String,
    },
    Error {
        reason: FailureReason,
        heard: Option<String>,
    },
}

impl Outcome {
    pub fn is_noted(&self) -> bool {
        matches!(self, Outcome::Noted { .. })
    }

    /// The text the recognizer produced, if any
    pub fn heard(&self) -> Option<&str> {
        match self {
            Outcome::Noted { heard, .. } => Some(heard),
            Outcome::Error { heard, .. } => heard.as_deref(),
        }
    }

    /// Short display message for the outcome
    pub fn message(&self) -> String {
        match self {
            Outcome::Noted { .. } => "NOTED!".to_string(),
            Outcome::Error { reason, heard } => match reason {
                FailureReason::CaptureTimeout => "Timeout - try again".to_string(),
                FailureReason::CaptureUnrecognized => "Couldn't understand audio".to_string(),
                FailureReason::CaptureFailed { message } => format!("Error: {}", message),
                FailureReason::EmptyContent => "Empty note".to_string(),
                FailureReason::NotANoteCommand => format!(
                    "Heard: '{}' (not a note command)",
                    heard.as_deref().unwrap_or_default()
                ),
                FailureReason::Storage { message } => format!("Error: {}", message),
            },
        }
    }

    /// Reply read aloud when speech output is on
    pub fn spoken_reply(&self) -> String {
        match self {
            Outcome::Noted { .. } => NOTED_REPLY.to_string(),
            Outcome::Error { .. } => self.message(),
        }
    }
}

/// Spoken confirmation after a note is stored
pub const NOTED_REPLY: &str = "Got it, I've noted that down for you.";

/// Result of a mode switch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    /// Mode is now the requested one (or already was)
    Applied(Mode),

    /// A listen cycle is in flight; the switch lands when it ends
    Deferred(Mode),
}

/// Result of summarizing today's notes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// Nothing persisted today; the summarizer was not consulted
    NoNotes,

    /// The summarizer's reply, verbatim
    Summarized(String),

    /// The summarizer failed; carries the fault for logs
    Failed(String),
}

/// Canned reply when there is nothing to summarize
pub const NO_NOTES_MESSAGE: &str = "You haven't taken any notes today yet.";

/// Canned reply when the summarizer fails
pub const SUMMARY_FAILED_MESSAGE: &str = "Sorry, I couldn't summarize your notes right now.";

impl Summary {
    /// Text safe to show or speak
    pub fn text(&self) -> &str {
        match self {
            Summary::NoNotes => NO_NOTES_MESSAGE,
            Summary::Summarized(text) => text,
            Summary::Failed(_) => SUMMARY_FAILED_MESSAGE,
        }
    }
}
