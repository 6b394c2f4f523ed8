//! Conversions between stored epoch-millisecond timestamps and view dates.
//!
//! Storage keeps every instant as `INTEGER` epoch milliseconds. Views only
//! ever see `NaiveDate` (publish day) or `DateTime<Utc>` (audit stamps);
//! nothing outside `repo` handles raw millis.
//!
//! Day boundaries follow the local timezone of the running process.

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Inclusive `[start, end]` millisecond range covering one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl DayRange {
    pub fn for_date(date: NaiveDate) -> Self {
        let start_ms = date_to_millis(date);
        let end_ms = match date.succ_opt() {
            Some(next) => date_to_millis(next) - 1,
            None => i64::MAX,
        };
        Self { start_ms, end_ms }
    }

    pub fn contains(&self, millis: i64) -> bool {
        self.start_ms <= millis && millis <= self.end_ms
    }
}

/// Stored representation of a publish date: local start-of-day in millis.
pub fn date_to_millis(date: NaiveDate) -> i64 {
    local_millis(date.and_time(NaiveTime::MIN))
}

/// Publish day of a stored timestamp, in the local timezone.
pub fn millis_to_date(millis: i64) -> NaiveDate {
    match Local.timestamp_millis_opt(millis) {
        LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => at.date_naive(),
        LocalResult::None => millis_to_utc(millis).date_naive(),
    }
}

pub fn millis_to_utc(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Today's date in the local timezone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

fn local_millis(naive: NaiveDateTime) -> i64 {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(at) => at.timestamp_millis(),
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
        // Midnight skipped by a DST jump; the first valid instant is an hour later.
        LocalResult::None => Local
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
            .map(|at| at.timestamp_millis())
            .unwrap_or_else(|| naive.and_utc().timestamp_millis()),
    }
}
