//! Text-to-speech through the platform's speech command (`say`, `espeak`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use super::TextToSpeech;

/// Speaks text by invoking a command-line speech program
#[derive(Debug, Clone)]
pub struct SystemSpeaker {
    program: String,
}

impl Default for SystemSpeaker {
    fn default() -> Self {
        Self::new(default_program())
    }
}

impl SystemSpeaker {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Create from the resolved configuration
    pub fn from_config() -> Result<Self> {
        let cfg = crate::config::config()?;
        Ok(Self::new(cfg.speech.command.clone()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

/// Platform default speech program
pub fn default_program() -> &'static str {
    if cfg!(target_os = "macos") {
        "say"
    } else {
        "espeak"
    }
}

#[async_trait]
impl TextToSpeech for SystemSpeaker {
    fn name(&self) -> &str {
        &self.program
    }

    async fn speak(&self, text: &str) -> Result<()> {
        let output = Command::new(&self.program)
            .arg(text)
            .output()
            .await
            .with_context(|| format!("Failed to run speech program '{}'", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Speech program '{}' failed: {}", self.program, stderr.trim());
        }

        Ok(())
    }
}
