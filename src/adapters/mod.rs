//! Adapter interfaces for external collaborators.
//!
//! The note logic never talks to a recognizer, a speech engine or an LLM
//! directly. Front-ends hand the session one of these adapters instead.

pub mod ollama;
pub mod speech;
pub mod whisper;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

// Re-export the concrete adapters
pub use ollama::OllamaSummarizer;
pub use speech::SystemSpeaker;
pub use whisper::WhisperCapture;

/// Errors from a speech-to-text capture
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("No speech within the capture window")]
    Timeout,

    #[error("Audio could not be transcribed")]
    Unrecognized,

    #[error("Speech-to-text failed: {0}")]
    Failed(String),
}

/// Speech-to-text: produces the text of one utterance
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Capture and transcribe a single utterance
    async fn capture(&self) -> Result<String, CaptureError>;
}

/// Text-to-speech: fire-and-forget playback
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    fn name(&self) -> &str;

    async fn speak(&self, text: &str) -> Result<()>;
}

/// LLM summarization of a prompt
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    /// Return the model's reply to `prompt`
    async fn summarize(&self, prompt: &str) -> Result<String>;
}
