//! Timestamp handling for the CSV feeds.
//!
//! Rows carry a wall-clock `(date, time)` pair such as `2025/9/1`, `9:00`.
//! Everything inside the pipeline works on the canonical zero-padded form
//! `YYYY/MM/DD HH:mm`; only the final time axes are turned into UTC instants.

use std::sync::OnceLock;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use derive_more::Display;
use regex::Regex;

/// Canonical timestamp format used as the key of every series.
pub const CANONICAL_FORMAT: &str = "%Y/%m/%d %H:%M";

/// UTC with millisecond precision, e.g. `2025-09-04T08:00:00.000Z`.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Result of normalizing a `(date, time)` pair.
///
/// Both variants display as the plain string, so callers that only want the
/// text can use `to_string()`; the variant tells which path was taken.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum NormalizedTime {
    #[display(fmt = "{}", _0)]
    Normalized(String),
    #[display(fmt = "{}", _0)]
    Fallback(String),
}

impl NormalizedTime {
    pub fn as_str(&self) -> &str {
        match self {
            NormalizedTime::Normalized(s) => s,
            NormalizedTime::Fallback(s) => s,
        }
    }

    pub fn is_normalized(&self) -> bool {
        matches!(self, NormalizedTime::Normalized(_))
    }

    pub fn into_string(self) -> String {
        match self {
            NormalizedTime::Normalized(s) => s,
            NormalizedTime::Fallback(s) => s,
        }
    }
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4})[/-](\d{1,2})[/-](\d{1,2})$").expect("date pattern compiles")
    })
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$").expect("time pattern compiles")
    })
}

/// Parses `YYYY/M/D`, `YYYY/MM/DD` or the dash separated equivalents.
///
/// Days past the end of the month roll over the way calendar arithmetic does:
/// `2025/2/30` is March 2nd. Day must still be 1 to 31 and month 1 to 12.
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    let caps = date_pattern().captures(date.trim())?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    if !(1..=31).contains(&day) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(u64::from(day - 1)))
}

/// Parses `H:mm`, `HH:mm` and `HH:mm:ss` into an offset from midnight.
///
/// Hours are not capped at 23: the actuals feed writes midnight as `24:00`
/// of the previous day, so `24:00` is one day and `25:30` one day plus 1.5h.
pub fn parse_time(time: &str) -> Option<TimeDelta> {
    let caps = time_pattern().captures(time.trim())?;
    let hour: i64 = caps[1].parse().ok()?;
    let minute: i64 = caps[2].parse().ok()?;
    let second: i64 = match caps.get(3) {
        Some(s) => s.as_str().parse().ok()?,
        None => 0,
    };
    if minute > 59 || second > 59 {
        return None;
    }
    Some(TimeDelta::hours(hour) + TimeDelta::minutes(minute) + TimeDelta::seconds(second))
}

/// Normalizes a `(date, time)` pair, keeping the raw concatenation when the
/// pair cannot be parsed. Never fails.
pub fn normalize_checked(date: &str, time: &str) -> NormalizedTime {
    let parsed = parse_date(date)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .zip(parse_time(time))
        .and_then(|(midnight, offset)| midnight.checked_add_signed(offset));

    match parsed {
        Some(dt) => NormalizedTime::Normalized(dt.format(CANONICAL_FORMAT).to_string()),
        None => NormalizedTime::Fallback(format!("{date} {time}")),
    }
}

/// `normalize("2025/9/1", "9:00") == "2025/09/01 09:00"`
pub fn normalize(date: &str, time: &str) -> String {
    normalize_checked(date, time).into_string()
}

pub fn parse_canonical(canonical: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(canonical, CANONICAL_FORMAT).ok()
}

/// First space-delimited token of a timestamp.
pub fn date_portion(timestamp: &str) -> &str {
    timestamp.split(' ').next().unwrap_or("")
}

/// Minutes since midnight of the `HH:mm` part of a timestamp.
pub fn minutes_of_day(timestamp: &str) -> Option<u32> {
    let time = timestamp.split(' ').nth(1)?;
    let (h, m) = time.split_once(':')?;
    let h: u32 = h.trim().parse().ok()?;
    let m: u32 = m.trim().parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

/// Resolves a wall-clock time in `tz` to UTC. Nonexistent local times give `None`.
pub fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn to_iso(dt: DateTime<Utc>) -> String {
    dt.format(ISO_FORMAT).to_string()
}

/// `"2025/09/04 17:00"` read as Tokyo time becomes `"2025-09-04T08:00:00.000Z"`.
pub fn canonical_to_iso(canonical: &str, tz: Tz) -> Option<String> {
    let naive = parse_canonical(canonical)?;
    local_to_utc(naive, tz).map(to_iso)
}

/// Midnight of a `YYYY/MM/DD` date in `tz`, as an ISO instant.
pub fn date_to_iso(date: &str, tz: Tz) -> Option<String> {
    let naive = parse_date(date)?.and_hms_opt(0, 0, 0)?;
    local_to_utc(naive, tz).map(to_iso)
}

pub fn parse_iso(iso: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(iso)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
