//! Append-only daily note store with file-based persistence.
//!
//! Each calendar date gets one markdown file (`YYYY-MM-DD.md`) holding a
//! header and one bullet line per note. The file is the source of truth;
//! the store also mirrors the entries appended by this process so a session
//! can report what it has taken.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use fs2::FileExt;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::clock::{Clock, SystemClock};
use crate::domain::note::{daily_header, date_key, DailyLog, NoteEntry};

/// Errors that can occur with the note store
#[derive(Debug, Error)]
pub enum NoteStoreError {
    #[error("Note content is empty")]
    EmptyContent,

    #[error("Storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl NoteStoreError {
    fn storage(path: &Path, source: io::Error) -> Self {
        Self::Storage {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// File-based daily note store
pub struct NoteStore {
    /// Directory holding one file per date
    notes_dir: PathBuf,

    /// Source of the local date and time
    clock: Arc<dyn Clock>,

    /// One writer per date key at a time
    date_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,

    /// Entries appended by this process, in order
    history: Mutex<Vec<NoteEntry>>,
}

impl NoteStore {
    /// Create a store rooted at `notes_dir`
    pub fn new(notes_dir: PathBuf, clock: Arc<dyn Clock>) -> Self {
        Self {
            notes_dir,
            clock,
            date_locks: Mutex::new(HashMap::new()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Open the store in the configured notes directory and timezone
    pub fn open_default() -> Result<Self> {
        let cfg = crate::config::config()?;
        let clock = SystemClock::new(cfg.timezone);
        Ok(Self::new(cfg.notes_dir.clone(), Arc::new(clock)))
    }

    /// Directory holding the daily logs
    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    /// Path of the log for a date key
    pub fn log_path(&self, date_key: &str) -> PathBuf {
        self.notes_dir.join(format!("{}.md", date_key))
    }

    /// Today's date key in the store's timezone
    pub fn today_key(&self) -> String {
        date_key(self.clock.now())
    }

    async fn date_lock(&self, date_key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.date_locks.lock().await;
        // earlier days are never written again by a running process
        locks.retain(|key, lock| key == date_key || Arc::strong_count(lock) > 1);
        locks
            .entry(date_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Append a note to today's log.
    ///
    /// Creates the log with its header on the first note of the day. Fails
    /// with `EmptyContent` (and touches nothing) when the content is blank.
    pub async fn append(&self, content: &str) -> Result<NoteEntry, NoteStoreError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(NoteStoreError::EmptyContent);
        }

        let now = self.clock.now();
        let entry = NoteEntry::new(now, content);

        let lock = self.date_lock(&entry.date_key).await;
        let _guard = lock.lock().await;

        let path = self.log_path(&entry.date_key);
        let header = daily_header(now);
        let line = entry.render();
        let target = path.clone();
        let created = tokio::task::spawn_blocking(move || write_entry(&target, &header, &line))
            .await
            .map_err(|e| NoteStoreError::storage(&path, io::Error::new(io::ErrorKind::Other, e)))?
            .map_err(|e| NoteStoreError::storage(&path, e))?;

        if created {
            info!(date = %entry.date_key, path = %path.display(), "Started daily log");
        }
        debug!(date = %entry.date_key, time = %entry.timestamp, "Appended note");

        self.history.lock().await.push(entry.clone());

        Ok(entry)
    }

    /// Read today's log verbatim (empty content if nothing was noted yet)
    pub async fn read_today(&self) -> Result<DailyLog, NoteStoreError> {
        let date_key = self.today_key();
        self.read_day(&date_key).await
    }

    /// Read the log for a specific date key
    pub async fn read_day(&self, date_key: &str) -> Result<DailyLog, NoteStoreError> {
        let path = self.log_path(date_key);

        let lock = self.date_lock(date_key).await;
        let _guard = lock.lock().await;

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(NoteStoreError::storage(&path, e)),
        };

        Ok(DailyLog {
            date_key: date_key.to_string(),
            content,
            path,
        })
    }

    /// Entries appended by this process, oldest first
    pub async fn history(&self) -> Vec<NoteEntry> {
        self.history.lock().await.clone()
    }

    /// Number of entries appended by this process
    pub async fn len(&self) -> usize {
        self.history.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Write one entry line, prefixing the header when the log is new.
///
/// Holds an exclusive advisory lock for the duration so writers in other
/// processes cannot interleave. Blocks while another process holds the lock,
/// so async callers run it on the blocking pool. Returns true when the header
/// was written.
fn write_entry(path: &Path, header: &str, line: &str) -> io::Result<bool> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;

    let is_new = file.metadata()?.len() == 0;
    let mut buf = String::with_capacity(header.len() + line.len() + 1);
    if is_new {
        buf.push_str(header);
    } else {
        buf.push('\n');
    }
    buf.push_str(line);

    file.write_all(buf.as_bytes())?;
    file.flush()?;

    // Lock is released when file is dropped
    Ok(is_new)
}
