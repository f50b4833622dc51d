//! Wall-clock source for note timestamps.
//!
//! Notes are stamped in a single fixed timezone regardless of where the
//! process runs, so the date key never depends on the host's locale.

use std::sync::Mutex;

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Source of the current local date and time
pub trait Clock: Send + Sync {
    /// Current wall-clock time in the notes timezone
    fn now(&self) -> NaiveDateTime;
}

/// Real time, converted into a fixed IANA timezone
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(chrono_tz::America::Chicago)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }
}

/// Manually driven clock for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    at: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self { at: Mutex::new(at) }
    }

    /// Move the clock to a new instant
    pub fn set(&self, at: NaiveDateTime) {
        let mut guard = self.at.lock().unwrap_or_else(|e| e.into_inner());
        *guard = at;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.at.lock().unwrap_or_else(|e| e.into_inner())
    }
}
