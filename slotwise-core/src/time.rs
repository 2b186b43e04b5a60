//! Time utilities: injectable clocks, timezone-aware parsing, hour-of-day math.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use regex::Regex;
use thiserror::Error;

static TIME_OF_DAY: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\s*([01]?\d|2[0-3]):([0-5]\d)\s*$"));

/// Source of "now" for deadline factors and violation counts.
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

/// A frozen instant, for tests and replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum TimeParseError {
    #[error("invalid timezone: {0}")]
    Timezone(String),
    #[error("invalid local datetime '{input}': {reason}")]
    LocalDateTime { input: String, reason: String },
    #[error("ambiguous or invalid local time (DST?): {0}")]
    Ambiguous(String),
    #[error("invalid time of day '{0}' (expected HH:MM)")]
    TimeOfDay(String),
    #[error("time-of-day pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub fn parse_timezone(tz: &str) -> Result<Tz, TimeParseError> {
    tz.parse()
        .map_err(|_| TimeParseError::Timezone(tz.to_string()))
}

/// Parse a deadline like "2026-02-20 23:59" in an IANA tz like "America/Chicago",
/// returning UTC.
pub fn parse_local_deadline_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let tz = parse_timezone(tz)?;

    let ndt = NaiveDateTime::parse_from_str(local.trim(), "%Y-%m-%d %H:%M").map_err(|e| {
        TimeParseError::LocalDateTime {
            input: local.to_string(),
            reason: e.to_string(),
        }
    })?;

    local_to_utc(ndt, tz).ok_or_else(|| TimeParseError::Ambiguous(format!("{local} {tz}")))
}

/// Resolve a naive local time in `tz`. `None` inside DST gaps or folds.
pub fn local_to_utc(ndt: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&ndt)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse "HH:MM" into a `NaiveTime`.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, TimeParseError> {
    let re = TIME_OF_DAY.as_ref().map_err(Clone::clone)?;
    let caps = re
        .captures(s)
        .ok_or_else(|| TimeParseError::TimeOfDay(s.to_string()))?;
    let hour: u32 = caps[1]
        .parse()
        .map_err(|_| TimeParseError::TimeOfDay(s.to_string()))?;
    let minute: u32 = caps[2]
        .parse()
        .map_err(|_| TimeParseError::TimeOfDay(s.to_string()))?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| TimeParseError::TimeOfDay(s.to_string()))
}

/// Hour component of an "HH:MM" string. Minutes are dropped.
pub fn parse_hour_of_day(s: &str) -> Result<u32, TimeParseError> {
    parse_time_of_day(s).map(|t| t.hour())
}

/// Hour of day of `dt` as seen in `tz`.
pub fn local_hour(dt: DateTime<Utc>, tz: Tz) -> u32 {
    dt.with_timezone(&tz).hour()
}
