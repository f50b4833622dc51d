//! Command-line interface for listeny.
//!
//! A thin front-end over the session controller: each command builds the
//! store and session from the resolved configuration and translates its
//! arguments into session operations.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::adapters::{OllamaSummarizer, SystemSpeaker, WhisperCapture};
use crate::core::{NoteStore, Session};
use crate::domain::{Mode, Outcome};

pub mod session;

/// listeny - dictate short notes into a daily log
#[derive(Parser, Debug)]
#[command(name = "listeny")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Append a note to today's log, verbatim
    Note {
        /// Note text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Handle one utterance as if it had been spoken
    Dictate {
        /// Utterance text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Interpretation mode (defaults to the configured mode)
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Speak the reply
        #[arg(long)]
        speak: bool,
    },

    /// Transcribe a recorded utterance with whisper and handle it
    Listen {
        /// Audio file with one utterance
        audio: PathBuf,

        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        #[arg(long)]
        speak: bool,
    },

    /// Print today's notes
    Today,

    /// Summarize today's notes with Ollama
    Summarize {
        #[arg(long)]
        speak: bool,
    },

    /// Interactive session reading utterances from stdin
    Session {
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        #[arg(long)]
        speak: bool,
    },

    /// Show today's note count and where notes are written
    Status,

    /// Show resolved configuration (debug)
    Config,
}

/// Mode for CLI (maps to Mode)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Every utterance is a note
    Note,

    /// Only "take a note"-style utterances are notes
    Assistant,
}

impl From<ModeArg> for Mode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Note => Mode::Note,
            ModeArg::Assistant => Mode::Assistant,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Note { text } => add_note(&text.join(" ")).await,
            Commands::Dictate { text, mode, speak } => {
                dictate(&text.join(" "), mode, speak).await
            }
            Commands::Listen { audio, mode, speak } => listen(&audio, mode, speak).await,
            Commands::Today => show_today().await,
            Commands::Summarize { speak } => summarize(speak).await,
            Commands::Session { mode, speak } => {
                let session = build_session(mode, speak)?;
                session::run(&session, std::io::stdin().is_terminal()).await
            }
            Commands::Status => show_status().await,
            Commands::Config => show_config().await,
        }
    }
}

/// Build the process session from configuration
pub fn build_session(mode: Option<ModeArg>, speak: bool) -> Result<Session> {
    let cfg = crate::config::config()?;
    let store = NoteStore::open_default()?;

    let mode = mode.map(Mode::from).unwrap_or(cfg.session.mode);
    let mut session = Session::new(Arc::new(store))
        .with_mode(mode)
        .with_cooldown(cfg.session.cooldown());

    if speak || cfg.speech.enabled {
        session = session.with_speaker(Arc::new(SystemSpeaker::from_config()?));
    }

    Ok(session)
}

/// Print an outcome the way the status banner shows it
pub fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Noted { entry, .. } => {
            println!("✅ {}", outcome.message());
            println!("   {}", entry.render());
        }
        Outcome::Error { .. } => {
            println!("⚠️  {}", outcome.message());
        }
    }
}

/// Wait for a background announcement so short-lived commands are heard
async fn announce_and_wait(session: &Session, text: impl Into<String>) {
    if let Some(handle) = session.announce(text) {
        let _ = handle.await;
    }
}

/// Append a manual note
async fn add_note(text: &str) -> Result<()> {
    let store = NoteStore::open_default()?;
    let entry = store
        .append(text)
        .await
        .context("Failed to save note")?;

    println!("✅ Note saved manually");
    println!("   {}", entry.render());
    Ok(())
}

/// Handle one typed utterance
async fn dictate(text: &str, mode: Option<ModeArg>, speak: bool) -> Result<()> {
    let session = build_session(mode, speak)?;
    let outcome = session.handle_utterance(text).await?;

    print_outcome(&outcome);
    announce_and_wait(&session, outcome.spoken_reply()).await;
    Ok(())
}

/// Transcribe a recorded utterance and handle it
async fn listen(audio: &std::path::Path, mode: Option<ModeArg>, speak: bool) -> Result<()> {
    let session = build_session(mode, speak)?;
    let capture = WhisperCapture::from_config(audio)?;

    eprintln!("🎙️  Transcribing {}...", audio.display());
    let outcome = session.capture_and_handle(&capture).await?;

    if let Some(heard) = outcome.heard() {
        eprintln!("   Heard: {}", heard);
    }
    print_outcome(&outcome);
    announce_and_wait(&session, outcome.spoken_reply()).await;
    Ok(())
}

/// Print today's log as persisted
async fn show_today() -> Result<()> {
    let store = NoteStore::open_default()?;
    let log = store.read_today().await?;

    if log.is_empty() {
        println!("No notes for {} yet.", log.date_key);
        return Ok(());
    }

    println!("{}", log.content);
    Ok(())
}

/// Summarize today's log
async fn summarize(speak: bool) -> Result<()> {
    let session = build_session(None, speak)?;
    let summarizer = OllamaSummarizer::from_config()?;

    eprintln!("🧠 Summarizing today's notes with {}...", summarizer.model());
    let summary = session.summarize_today(&summarizer).await;

    println!("{}", summary.text());
    announce_and_wait(&session, summary.text()).await;
    Ok(())
}

/// Show where notes go and how many were taken today
async fn show_status() -> Result<()> {
    let cfg = crate::config::config()?;
    let store = NoteStore::open_default()?;
    let log = store.read_today().await?;

    println!();
    println!("Listeny Status");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!("Default mode:  {}", cfg.session.mode);
    println!("Notes dir:     {}", store.notes_dir().display());
    println!("Today:         {}", log.date_key);
    println!("Notes today:   {}", log.entry_count());
    println!();

    Ok(())
}

/// Show the resolved configuration (for debugging)
async fn show_config() -> Result<()> {
    let cfg = crate::config::config()?;

    println!();
    println!("Listeny Configuration");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:   {}", cfg.home.display());
    println!("  Notes:  {}", cfg.notes_dir.display());
    println!();
    println!("Timezone:  {}", cfg.timezone.name());
    println!();
    println!("Session:");
    println!("  Mode:      {}", cfg.session.mode);
    println!("  Cool-down: {} ms", cfg.session.cooldown_ms);
    println!();
    println!("Ollama:");
    println!("  Host:    {}", cfg.ollama.host);
    println!("  Model:   {}", cfg.ollama.model);
    println!("  Timeout: {}s", cfg.ollama.timeout_seconds);
    println!();
    println!("Whisper:");
    println!("  Binary:  {}", cfg.whisper.binary);
    println!("  Model:   {}", cfg.whisper.model);
    println!("  Timeout: {}s", cfg.whisper.timeout_seconds);
    println!();
    println!("Speech:");
    println!("  Command: {}", cfg.speech.command);
    println!("  Enabled: {}", cfg.speech.enabled);

    Ok(())
}
