//! Conversions between microsecond timestamps, dates and client date strings.
//!
//! Items carry both a wall-clock date and a microsecond integer. Dates sent
//! by older clients only have millisecond precision, so string dates are
//! truncated to whole milliseconds before being widened to microseconds.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use mockable::Clock;

const MICROS_PER_MILLI: i64 = 1_000;
const MICROS_PER_SECOND: i64 = 1_000_000;

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Current time as a microsecond Unix timestamp.
pub fn now_micros(clock: &dyn Clock) -> i64 {
    clock.utc().timestamp_micros()
}

/// Convert a microsecond timestamp into a UTC date.
///
/// Out-of-range values clamp to the Unix epoch.
pub fn date_from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

/// Parse a client-supplied date string.
///
/// Accepts RFC 3339, RFC 2822 and naive ISO-like forms, the latter read as
/// UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
}

/// Convert a client date string into microseconds at millisecond precision.
///
/// # Examples
/// ```
/// use syncing_server::domain::timer::micros_from_date_string;
///
/// assert_eq!(
///     micros_from_date_string("2021-03-15T09:00:00.123456Z"),
///     Some(1_615_798_800_123_000),
/// );
/// ```
pub fn micros_from_date_string(raw: &str) -> Option<i64> {
    parse_date(raw).map(|date| date.timestamp_millis() * MICROS_PER_MILLI)
}

/// Floor a microsecond timestamp to whole milliseconds.
pub fn micros_to_millis(micros: i64) -> i64 {
    micros.div_euclid(MICROS_PER_MILLI)
}

/// Whole seconds elapsed between two microsecond timestamps.
pub fn seconds_between(earlier_micros: i64, later_micros: i64) -> i64 {
    (later_micros - earlier_micros).div_euclid(MICROS_PER_SECOND)
}

/// Render a date the way clients expect: RFC 3339, milliseconds, `Z`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}
