//! Time source and record id generation.
//!
//! # Responsibility
//! - Provide the current instant through an injectable [`Clock`].
//! - Format timestamps exactly like the persisted data expects
//!   (`YYYY-MM-DDTHH:MM:SS.sssZ`).
//! - Issue timestamp-derived record ids.
//!
//! # Invariants
//! - Ids issued by one [`IdGenerator`] are strictly increasing, even when the
//!   clock does not advance between calls.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

/// Source of "now" for every write path.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Builds a clock from epoch milliseconds; out-of-range values clamp to epoch.
    pub fn at_millis(epoch_ms: i64) -> Self {
        Self::new(Utc.timestamp_millis_opt(epoch_ms).single().unwrap_or_default())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Formats an instant the way stored timestamps are written.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored timestamp or plain `YYYY-MM-DD` date.
///
/// Plain dates resolve to midnight UTC. Returns `None` for blank or
/// unparseable input.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Issues opaque, timestamp-derived record ids.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last_issued: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the decimal millisecond timestamp of `now`, bumped past the
    /// last issued value when needed.
    pub fn next_id(&self, now: DateTime<Utc>) -> String {
        let candidate = now.timestamp_millis();
        let mut previous = self.last_issued.load(Ordering::Relaxed);
        loop {
            let next = candidate.max(previous + 1);
            match self.last_issued.compare_exchange_weak(
                previous,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next.to_string(),
                Err(actual) => previous = actual,
            }
        }
    }
}
