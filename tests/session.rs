//! Session Controller Integration Tests
//!
//! Mode-gated dispatch, capture failures, summaries and the cool-down,
//! driven through test doubles for the speech and LLM collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use listeny::adapters::{CaptureError, SpeechToText, Summarizer, TextToSpeech};
use listeny::core::{FixedClock, NoteStore, Session, SessionError};
use listeny::domain::{
    FailureReason, Lifecycle, Mode, ModeChange, Outcome, Summary, NOTED_REPLY, NO_NOTES_MESSAGE,
    SUMMARY_FAILED_MESSAGE,
};
use tempfile::TempDir;

/// Summarizer double that counts calls
struct CountingSummarizer {
    calls: AtomicUsize,
    reply: Result<String, String>,
}

impl CountingSummarizer {
    fn replying(text: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reply: Ok(text.to_string()),
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reply: Err("connection refused".to_string()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for CountingSummarizer {
    fn name(&self) -> &str {
        "counting"
    }

    async fn summarize(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(prompt.contains("Notes:\n"));
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(msg) => Err(anyhow::anyhow!(msg.clone())),
        }
    }
}

/// Speech-to-text double returning a canned result
struct ScriptedCapture(Result<String, CaptureError>);

#[async_trait]
impl SpeechToText for ScriptedCapture {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn capture(&self) -> Result<String, CaptureError> {
        self.0.clone()
    }
}

/// Text-to-speech double recording what was spoken
#[derive(Default)]
struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl TextToSpeech for RecordingSpeaker {
    fn name(&self) -> &str {
        "recording"
    }

    async fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.fail {
            anyhow::bail!("no audio device");
        }
        Ok(())
    }
}

fn create_test_session(mode: Mode) -> (Session, TempDir) {
    let temp = TempDir::new().unwrap();
    let at = NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap();
    let store = NoteStore::new(temp.path().to_path_buf(), Arc::new(FixedClock::new(at)));
    let session = Session::new(Arc::new(store))
        .with_mode(mode)
        .with_cooldown(Duration::ZERO);
    (session, temp)
}

fn read_log(temp: &TempDir) -> Option<String> {
    std::fs::read_to_string(temp.path().join("2026-10-19.md")).ok()
}

#[tokio::test]
async fn test_note_mode_stores_verbatim() {
    let (session, temp) = create_test_session(Mode::Note);

    let outcome = session.handle_utterance("buy milk").await.unwrap();

    match &outcome {
        Outcome::Noted { entry, heard } => {
            assert_eq!(entry.content, "buy milk");
            assert_eq!(heard, "buy milk");
        }
        other => panic!("Expected Noted, got {:?}", other),
    }
    assert_eq!(outcome.spoken_reply(), NOTED_REPLY);
    assert!(read_log(&temp).unwrap().ends_with("- **09:15**: buy milk"));
}

#[tokio::test]
async fn test_note_mode_does_not_strip_triggers() {
    let (session, _temp) = create_test_session(Mode::Note);

    let outcome = session.handle_utterance("take a note that the cat is fed").await.unwrap();
    match outcome {
        Outcome::Noted { entry, .. } => assert_eq!(entry.content, "take a note that the cat is fed"),
        other => panic!("Expected Noted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_assistant_mode_ignores_non_commands() {
    let (session, temp) = create_test_session(Mode::Assistant);

    let outcome = session.handle_utterance("what time is it").await.unwrap();

    assert_eq!(
        outcome,
        Outcome::Error {
            reason: FailureReason::NotANoteCommand,
            heard: Some("what time is it".to_string()),
        }
    );
    assert!(read_log(&temp).is_none());
    assert_eq!(session.lifecycle().await, Lifecycle::Error);
}

#[tokio::test]
async fn test_assistant_mode_stores_payload() {
    let (session, temp) = create_test_session(Mode::Assistant);

    let outcome = session
        .handle_utterance("Take a note that the meeting moved to Thursday")
        .await
        .unwrap();

    match outcome {
        Outcome::Noted { entry, heard } => {
            assert_eq!(entry.content, "the meeting moved to Thursday");
            assert_eq!(heard, "Take a note that the meeting moved to Thursday");
        }
        other => panic!("Expected Noted, got {:?}", other),
    }
    assert!(read_log(&temp)
        .unwrap()
        .ends_with("- **09:15**: the meeting moved to Thursday"));
}

#[tokio::test]
async fn test_assistant_mode_bare_trigger_is_noted_verbatim() {
    let (session, _temp) = create_test_session(Mode::Assistant);

    let outcome = session.handle_utterance("take a note").await.unwrap();
    match outcome {
        Outcome::Noted { entry, .. } => assert_eq!(entry.content, "take a note"),
        other => panic!("Expected Noted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_summarize_empty_log_skips_summarizer() {
    let (session, _temp) = create_test_session(Mode::Note);
    let summarizer = CountingSummarizer::replying("unused");

    let summary = session.summarize_today(&summarizer).await;

    assert_eq!(summary, Summary::NoNotes);
    assert_eq!(summary.text(), NO_NOTES_MESSAGE);
    assert_eq!(summarizer.calls(), 0);
}

#[tokio::test]
async fn test_summarize_returns_reply() {
    let (session, _temp) = create_test_session(Mode::Note);
    session.handle_utterance("call the bank").await.unwrap();
    let summarizer = CountingSummarizer::replying("You need to call the bank.");

    let summary = session.summarize_today(&summarizer).await;

    assert_eq!(summary, Summary::Summarized("You need to call the bank.".to_string()));
    assert_eq!(summarizer.calls(), 1);
}

#[tokio::test]
async fn test_summarizer_failure_maps_to_canned_reply() {
    let (session, _temp) = create_test_session(Mode::Note);
    session.handle_utterance("call the bank").await.unwrap();
    let summarizer = CountingSummarizer::failing();

    let summary = session.summarize_today(&summarizer).await;

    assert!(matches!(summary, Summary::Failed(ref msg) if msg.contains("connection refused")));
    assert_eq!(summary.text(), SUMMARY_FAILED_MESSAGE);
    assert_eq!(summarizer.calls(), 1);
}

#[tokio::test]
async fn test_capture_failures_end_cycle() {
    let cases = [
        (CaptureError::Timeout, FailureReason::CaptureTimeout),
        (CaptureError::Unrecognized, FailureReason::CaptureUnrecognized),
        (
            CaptureError::Failed("mic unplugged".to_string()),
            FailureReason::CaptureFailed {
                message: "mic unplugged".to_string(),
            },
        ),
    ];

    for (error, reason) in cases {
        let (session, temp) = create_test_session(Mode::Note);
        let capture = ScriptedCapture(Err(error));

        let outcome = session.capture_and_handle(&capture).await.unwrap();

        assert_eq!(outcome, Outcome::Error { reason, heard: None });
        assert_eq!(session.lifecycle().await, Lifecycle::Error);
        assert!(read_log(&temp).is_none());
    }
}

#[tokio::test]
async fn test_capture_success_is_handled() {
    let (session, _temp) = create_test_session(Mode::Assistant);
    let capture = ScriptedCapture(Ok("jot down renew passport".to_string()));

    let outcome = session.capture_and_handle(&capture).await.unwrap();

    match outcome {
        Outcome::Noted { entry, .. } => assert_eq!(entry.content, "renew passport"),
        other => panic!("Expected Noted, got {:?}", other),
    }
    assert_eq!(session.lifecycle().await, Lifecycle::Noted);
}

#[tokio::test]
async fn test_busy_session_rejects_new_cycle() {
    let (session, _temp) = create_test_session(Mode::Note);

    session.start_listening().await.unwrap();
    let err = session.start_listening().await.unwrap_err();
    assert_eq!(err.from, Lifecycle::Listening);

    // a cycle can start again once the previous one ended
    session.handle_utterance("done").await.unwrap();
    assert!(session.start_listening().await.is_ok());
}

#[tokio::test]
async fn test_mode_switch_is_idempotent_when_idle() {
    let (session, _temp) = create_test_session(Mode::Note);

    assert_eq!(session.set_mode(Mode::Assistant).await, ModeChange::Applied(Mode::Assistant));
    assert_eq!(session.set_mode(Mode::Assistant).await, ModeChange::Applied(Mode::Assistant));
    assert_eq!(session.mode().await, Mode::Assistant);
}

#[tokio::test]
async fn test_cooldown_returns_to_idle() {
    let (session, _temp) = create_test_session(Mode::Note);
    let session = session.with_cooldown(Duration::from_millis(50));

    session.handle_utterance("water the plants").await.unwrap();
    assert_eq!(session.lifecycle().await, Lifecycle::Noted);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(session.lifecycle().await, Lifecycle::Idle);
}

#[tokio::test]
async fn test_new_listen_cancels_cooldown() {
    let (session, _temp) = create_test_session(Mode::Note);
    let session = session.with_cooldown(Duration::from_millis(100));

    session.handle_utterance("first").await.unwrap();
    session.start_listening().await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    // the stale cool-down must not yank the live cycle back to idle
    assert_eq!(session.lifecycle().await, Lifecycle::Listening);
}

#[tokio::test]
async fn test_speech_failure_is_swallowed() {
    let (session, _temp) = create_test_session(Mode::Note);
    let speaker = Arc::new(RecordingSpeaker {
        fail: true,
        ..Default::default()
    });
    let session = session.with_speaker(speaker.clone());

    let outcome = session.handle_utterance("buy stamps").await.unwrap();
    let handle = session.announce(outcome.spoken_reply()).unwrap();
    handle.await.unwrap();

    assert_eq!(*speaker.spoken.lock().unwrap(), vec![NOTED_REPLY.to_string()]);
}

#[tokio::test]
async fn test_announce_without_speaker_is_noop() {
    let (session, _temp) = create_test_session(Mode::Note);
    assert!(session.announce("hello").is_none());
}

#[tokio::test]
async fn test_storage_failure_surfaces_as_error() {
    let temp = TempDir::new().unwrap();
    // a file where the notes directory should be
    let blocker = temp.path().join("notes");
    std::fs::write(&blocker, "not a directory").unwrap();

    let at = NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap();
    let store = NoteStore::new(blocker, Arc::new(FixedClock::new(at)));
    let session = Session::new(Arc::new(store)).with_cooldown(Duration::ZERO);

    let err = session.handle_utterance("buy milk").await.unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
    assert_eq!(session.lifecycle().await, Lifecycle::Error);
}

#[tokio::test]
async fn test_utterance_while_processing_is_rejected() {
    let (session, temp) = create_test_session(Mode::Note);
    let session = Arc::new(session);

    // hold the log's file lock so the first append stays in Processing
    let path = temp.path().join("2026-10-19.md");
    std::fs::write(&path, "").unwrap();
    let holder = std::fs::File::open(&path).unwrap();
    fs2::FileExt::lock_exclusive(&holder).unwrap();

    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.handle_utterance("first").await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(session.lifecycle().await, Lifecycle::Processing);

    let err = session.handle_utterance("second").await.unwrap_err();
    match err {
        SessionError::Transition(e) => {
            assert_eq!(e.from, Lifecycle::Processing);
            assert_eq!(e.to, Lifecycle::Processing);
        }
        other => panic!("Expected Transition, got {:?}", other),
    }

    fs2::FileExt::unlock(&holder).unwrap();
    drop(holder);

    assert!(first.await.unwrap().unwrap().is_noted());
    let log = read_log(&temp).unwrap();
    assert!(log.ends_with("- **09:15**: first"));
    assert!(!log.contains("second"));
}
