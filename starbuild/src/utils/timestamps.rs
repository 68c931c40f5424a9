//! Report timestamps.

use chrono::{DateTime, SecondsFormat, Utc};

/// A UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Formats `ts` as RFC 3339 with microseconds, e.g.
/// `2026-10-19T08:15:02.123456+00:00`.
#[must_use]
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Returns the current UTC time as an RFC 3339 string.
///
/// # Examples
///
/// ```
/// use starbuild::utils::iso_timestamp;
///
/// let ts = iso_timestamp();
/// assert!(ts.contains('T'));
/// assert!(ts.ends_with("+00:00"));
/// ```
#[must_use]
pub fn iso_timestamp() -> String {
    format_timestamp(&now_utc())
}
