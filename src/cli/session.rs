//! Interactive dictation session over stdin.
//!
//! Each line is one utterance. Lines starting with `:` are session
//! commands (`:mode assistant`, `:today`, `:summarize`, `:status`, `:quit`).

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::warn;

use super::print_outcome;
use crate::adapters::OllamaSummarizer;
use crate::core::Session;
use crate::domain::{Mode, ModeChange};

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Utterance(String),
    Mode(Mode),
    Today,
    Summarize,
    Status,
    Help,
    Quit,
}

/// Parse a line of session input
pub fn parse_line(line: &str) -> Result<ReplCommand, String> {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return Ok(ReplCommand::Utterance(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        "mode" => match parts.next() {
            Some(mode) => mode.parse().map(ReplCommand::Mode),
            None => Err("usage: :mode <note|assistant>".to_string()),
        },
        "today" => Ok(ReplCommand::Today),
        "summarize" | "summary" => Ok(ReplCommand::Summarize),
        "status" => Ok(ReplCommand::Status),
        "help" | "?" => Ok(ReplCommand::Help),
        "quit" | "exit" | "q" => Ok(ReplCommand::Quit),
        other => Err(format!("unknown command ':{}' (try :help)", other)),
    }
}

const HELP: &str = "\
Type an utterance and press enter, or:
  :mode <note|assistant>  switch interpretation mode
  :today                  print today's notes
  :summarize              summarize today's notes
  :status                 show session state
  :quit                   leave the session";

/// Run the session loop on stdin until EOF or `:quit`
pub async fn run(session: &Session, interactive: bool) -> Result<()> {
    run_with(session, BufReader::new(tokio::io::stdin()), interactive).await
}

/// Run the session loop over any line source
pub async fn run_with<R>(session: &Session, input: R, interactive: bool) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut speaking: Option<JoinHandle<()>> = None;

    if interactive {
        println!("🎙️  listeny session ({} mode). :help for commands.", session.mode().await);
    }

    loop {
        if interactive {
            print!("{}> ", session.mode().await);
            std::io::stdout().flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(msg) => {
                println!("{}", msg);
                continue;
            }
        };

        match command {
            ReplCommand::Utterance(text) => match session.handle_utterance(&text).await {
                Ok(outcome) => {
                    print_outcome(&outcome);
                    speaking = session.announce(outcome.spoken_reply()).or(speaking);
                }
                Err(err) => {
                    warn!(error = %err, "Utterance failed");
                    println!("❌ {}", err);
                }
            },
            ReplCommand::Mode(mode) => match session.set_mode(mode).await {
                ModeChange::Applied(mode) => println!("Mode: {}", mode),
                ModeChange::Deferred(mode) => println!("Mode will switch to {} after this note", mode),
            },
            ReplCommand::Today => match session.store().read_today().await {
                Ok(log) if log.is_empty() => println!("No notes for {} yet.", log.date_key),
                Ok(log) => println!("{}", log.content),
                Err(err) => {
                    warn!(error = %err, "Failed to read today's notes");
                    println!("❌ {}", err);
                }
            },
            ReplCommand::Summarize => match OllamaSummarizer::from_config() {
                Ok(summarizer) => {
                    let summary = session.summarize_today(&summarizer).await;
                    println!("{}", summary.text());
                    speaking = session.announce(summary.text()).or(speaking);
                }
                Err(err) => println!("❌ {:#}", err),
            },
            ReplCommand::Status => {
                let snapshot = session.snapshot().await;
                println!("Session:   {}", snapshot.id);
                println!("Mode:      {}", snapshot.mode);
                if let Some(pending) = snapshot.pending_mode {
                    println!("Pending:   {}", pending);
                }
                println!("State:     {}", snapshot.lifecycle);
                println!("Noted:     {}", snapshot.notes_taken);
            }
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Quit => break,
        }
    }

    // let the last reply finish before the runtime shuts down
    if let Some(handle) = speaking {
        let _ = handle.await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use crate::adapters::TextToSpeech;
    use crate::core::{FixedClock, NoteStore};
    use crate::domain::NOTED_REPLY;

    /// Speaker that takes a while and records what it finished saying
    #[derive(Default)]
    struct SlowSpeaker {
        finished: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextToSpeech for SlowSpeaker {
        fn name(&self) -> &str {
            "slow"
        }

        async fn speak(&self, text: &str) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.finished.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn create_test_session(notes_dir: std::path::PathBuf) -> Session {
        let at = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let store = NoteStore::new(notes_dir, Arc::new(FixedClock::new(at)));
        Session::new(Arc::new(store)).with_cooldown(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_last_reply_is_spoken_before_quit() {
        let temp = TempDir::new().unwrap();
        let speaker = Arc::new(SlowSpeaker::default());
        let session = create_test_session(temp.path().to_path_buf()).with_speaker(speaker.clone());

        run_with(&session, &b"buy milk\n:quit\n"[..], false).await.unwrap();

        assert_eq!(*speaker.finished.lock().unwrap(), vec![NOTED_REPLY.to_string()]);
    }

    #[tokio::test]
    async fn test_read_failure_keeps_session_running() {
        let temp = TempDir::new().unwrap();
        // a file where the notes directory should be makes reads fail
        let blocker = temp.path().join("notes");
        std::fs::write(&blocker, "not a directory").unwrap();
        let session = create_test_session(blocker);

        run_with(&session, &b":today\n:mode assistant\n"[..], false)
            .await
            .unwrap();

        assert_eq!(session.mode().await, Mode::Assistant);
    }

    #[test]
    fn test_plain_line_is_utterance() {
        assert_eq!(
            parse_line("  take a note buy milk \n").unwrap(),
            ReplCommand::Utterance("take a note buy milk".to_string())
        );
    }

    #[test]
    fn test_mode_command() {
        assert_eq!(
            parse_line(":mode assistant").unwrap(),
            ReplCommand::Mode(Mode::Assistant)
        );
        assert!(parse_line(":mode").is_err());
        assert!(parse_line(":mode shell").is_err());
    }

    #[test]
    fn test_session_commands() {
        assert_eq!(parse_line(":today").unwrap(), ReplCommand::Today);
        assert_eq!(parse_line(":summarize").unwrap(), ReplCommand::Summarize);
        assert_eq!(parse_line(":status").unwrap(), ReplCommand::Status);
        assert_eq!(parse_line(":q").unwrap(), ReplCommand::Quit);
        assert!(parse_line(":dance").is_err());
    }
}
