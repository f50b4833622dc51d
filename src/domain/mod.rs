//! Domain types for listeny.
//!
//! This module contains the core data structures:
//! - Note: Entries and the daily log they are persisted into
//! - Session: Mode, listen lifecycle and cycle outcomes

pub mod note;
pub mod session;

// Re-export commonly used types
pub use note::{DailyLog, NoteEntry};
pub use session::{
    FailureReason, Lifecycle, Mode, ModeChange, Outcome, Summary, TransitionError,
    NOTED_REPLY, NO_NOTES_MESSAGE, SUMMARY_FAILED_MESSAGE,
};
