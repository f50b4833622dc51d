//! listeny - hands-free note taking into daily Markdown logs
//!
//! Utterances come in as text (typed, or transcribed by a speech-to-text
//! adapter) and are routed by the session's mode:
//! - Note Mode: every non-empty utterance is a note, taken verbatim
//! - Assistant Mode: only utterances with a trigger phrase ("take a note",
//!   "remember", ...) are notes; the phrase and filler words are stripped
//!
//! Notes are appended to one file per calendar day, `YYYY-MM-DD.md`, with
//! a fixed header and `- **HH:MM**: text` entries.
//!
//! # Modules
//!
//! - `adapters`: Speech-to-text, text-to-speech and summarizer collaborators
//! - `core`: Classifier, NoteStore and the Session controller
//! - `domain`: Notes, modes, lifecycle and outcomes
//! - `config`: Layered configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Append a note as-is
//! listeny note pick up the dry cleaning
//!
//! # Route an utterance through Assistant Mode
//! listeny dictate --mode assistant "take a note that the meeting moved"
//!
//! # Read today's log back, or summarize it
//! listeny today
//! listeny summarize
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use core::{classify, is_note_command, NoteStore, Session};
pub use domain::{DailyLog, Lifecycle, Mode, NoteEntry, Outcome, Summary};
