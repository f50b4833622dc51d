//! Core note-taking logic.
//!
//! This module contains:
//! - Classifier: Trigger-phrase detection and payload extraction
//! - Clock: Fixed-timezone wall clock for timestamps
//! - NoteStore: Append-only daily logs
//! - Session: Mode-gated dispatch and the listen lifecycle

pub mod classifier;
pub mod clock;
pub mod note_store;
pub mod session;

// Re-export commonly used types
pub use classifier::{classify, extract_note, is_note_command, Classification, TRIGGER_PHRASES};
pub use clock::{Clock, FixedClock, SystemClock};
pub use note_store::{NoteStore, NoteStoreError};
pub use session::{summary_prompt, Session, SessionError, SessionSnapshot, DEFAULT_COOLDOWN};
