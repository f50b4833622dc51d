//! Ollama chat client used to summarize the day's notes.
//!
//! Endpoint: POST {host}/api/chat (non-streaming)

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Summarizer;

/// Default Ollama host when neither config nor OLLAMA_HOST say otherwise
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Default model for summaries
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Ollama chat client
pub struct OllamaSummarizer {
    host: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

impl OllamaSummarizer {
    /// Create a new client
    pub fn new(host: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            model: model.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// Create from the resolved configuration
    pub fn from_config() -> Result<Self> {
        let cfg = crate::config::config()?;
        Ok(Self::new(
            cfg.ollama.host.clone(),
            cfg.ollama.model.clone(),
            Duration::from_secs(cfg.ollama.timeout_seconds),
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.host.trim_end_matches('/'))
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn summarize(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response = self
            .client
            .post(self.chat_url())
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach Ollama at {}", self.host))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama error ({}): {}", status, text.trim());
        }

        let reply: ChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama chat response")?;

        Ok(reply.message.content)
    }
}
