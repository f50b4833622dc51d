//! Note entries and the daily log they are persisted into.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Format of the date key and of the daily log file stem
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Format of an entry's time-of-day stamp
pub const TIME_FORMAT: &str = "%H:%M";

/// Format of the date in the daily log header ("Monday, October 19, 2026")
pub const HEADER_DATE_FORMAT: &str = "%A, %B %d, %Y";

/// A single note appended to a daily log.
///
/// Entries are immutable once created; the daily log file is the
/// authoritative record and the store only keeps copies for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEntry {
    /// Date key of the log this entry belongs to (YYYY-MM-DD)
    pub date_key: String,

    /// Time of day the note was taken (HH:MM)
    pub timestamp: String,

    /// Note content (never empty)
    pub content: String,
}

impl NoteEntry {
    /// Build an entry stamped with the given local wall-clock time
    pub fn new(at: NaiveDateTime, content: impl Into<String>) -> Self {
        Self {
            date_key: date_key(at),
            timestamp: at.format(TIME_FORMAT).to_string(),
            content: content.into(),
        }
    }

    /// Render the entry as it appears in the daily log
    pub fn render(&self) -> String {
        format!("- **{}**: {}", self.timestamp, self.content)
    }
}

/// Today's persisted log as read back from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyLog {
    /// Date key (YYYY-MM-DD)
    pub date_key: String,

    /// Verbatim file content (empty if the file does not exist yet)
    pub content: String,

    /// Where the log lives (may not exist)
    pub path: PathBuf,
}

impl DailyLog {
    /// True when no note has been persisted for the day
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Number of entry lines in the log
    pub fn entry_count(&self) -> usize {
        self.content
            .lines()
            .filter(|line| line.starts_with("- **"))
            .count()
    }
}

/// Date key for a local wall-clock time
pub fn date_key(at: NaiveDateTime) -> String {
    at.format(DATE_KEY_FORMAT).to_string()
}

/// File header written once, on the first append of the day
pub fn daily_header(at: NaiveDateTime) -> String {
    format!(
        "# Notes for {}\n\n## Daily Notes\n\n",
        at.format(HEADER_DATE_FORMAT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_entry_render() {
        let entry = NoteEntry::new(at(9, 5), "buy milk");
        assert_eq!(entry.date_key, "2026-10-19");
        assert_eq!(entry.timestamp, "09:05");
        assert_eq!(entry.render(), "- **09:05**: buy milk");
    }

    #[test]
    fn test_header_format() {
        assert_eq!(
            daily_header(at(8, 0)),
            "# Notes for Monday, October 19, 2026\n\n## Daily Notes\n\n"
        );
    }

    #[test]
    fn test_entry_count() {
        let log = DailyLog {
            date_key: "2026-10-19".to_string(),
            content: format!("{}- **08:00**: a\n- **08:01**: b", daily_header(at(8, 0))),
            path: PathBuf::from("2026-10-19.md"),
        };
        assert_eq!(log.entry_count(), 2);
        assert!(!log.is_empty());
    }
}
