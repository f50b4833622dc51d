//! Whisper speech-to-text backend.
//!
//! Shells out to a local whisper binary for one recorded utterance.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::{CaptureError, SpeechToText};

/// Whisper output JSON structure
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    text: String,
    #[serde(default)]
    language: String,
}

/// Transcribes a recorded audio file with the whisper CLI
#[derive(Debug, Clone)]
pub struct WhisperCapture {
    /// Recorded utterance
    audio_path: PathBuf,

    /// Path to the whisper binary
    binary: String,

    /// Whisper model name (tiny, base, small, ...)
    model: String,

    /// Upper bound for one transcription
    limit: Duration,
}

impl WhisperCapture {
    pub fn new(
        audio_path: impl Into<PathBuf>,
        binary: impl Into<String>,
        model: impl Into<String>,
        limit: Duration,
    ) -> Self {
        Self {
            audio_path: audio_path.into(),
            binary: binary.into(),
            model: model.into(),
            limit,
        }
    }

    /// Create from the resolved configuration for one audio file
    pub fn from_config(audio_path: &Path) -> Result<Self> {
        let cfg = crate::config::config()?;
        Ok(Self::new(
            audio_path,
            cfg.whisper.binary.clone(),
            cfg.whisper.model.clone(),
            Duration::from_secs(cfg.whisper.timeout_seconds),
        ))
    }

    pub fn audio_path(&self) -> &Path {
        &self.audio_path
    }

    async fn transcribe(&self) -> Result<String, CaptureError> {
        if !self.audio_path.exists() {
            return Err(CaptureError::Failed(format!(
                "audio file not found: {}",
                self.audio_path.display()
            )));
        }

        let temp_dir = tempfile::tempdir()
            .map_err(|e| CaptureError::Failed(format!("failed to create temp dir: {}", e)))?;

        let run = Command::new(&self.binary)
            .arg(&self.audio_path)
            .arg("--model")
            .arg(&self.model)
            .arg("--output_dir")
            .arg(temp_dir.path())
            .arg("--output_format")
            .arg("json")
            .arg("--language")
            .arg("en")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = timeout(self.limit, run)
            .await
            .map_err(|_| CaptureError::Timeout)?
            .map_err(|e| CaptureError::Failed(format!("failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptureError::Failed(format!("whisper failed: {}", stderr.trim())));
        }

        let stem = self
            .audio_path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy();
        let json_path = temp_dir.path().join(format!("{}.json", stem));

        let json_content = tokio::fs::read_to_string(&json_path)
            .await
            .map_err(|e| CaptureError::Failed(format!("failed to read whisper output: {}", e)))?;

        parse_output(&json_content)
    }
}

/// Extract the transcript from whisper's JSON, rejecting empty results
fn parse_output(json: &str) -> Result<String, CaptureError> {
    let whisper: WhisperOutput = serde_json::from_str(json)
        .map_err(|e| CaptureError::Failed(format!("failed to parse whisper JSON: {}", e)))?;

    let text = whisper.text.trim();
    if text.is_empty() {
        return Err(CaptureError::Unrecognized);
    }

    debug!(language = %whisper.language, chars = text.len(), "Transcribed utterance");
    Ok(text.to_string())
}

#[async_trait]
impl SpeechToText for WhisperCapture {
    fn name(&self) -> &str {
        "whisper"
    }

    async fn capture(&self) -> Result<String, CaptureError> {
        self.transcribe().await
    }
}
