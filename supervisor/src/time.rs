//! ISO-8601 parsing/formatting and the typing-duration calculation shared by C8.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Parses a timestamp into a UTC instant. Accepts full ISO-8601 (millisecond or
/// second precision, `Z` or offset suffix), and also the space-separated,
/// second-precision form models tend to return (`"2025-11-26 08:36:07"`), which is
/// assumed UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(rfc3339_err) => {
            let with_t = s.replacen(' ', "T", 1);
            match NaiveDateTime::parse_from_str(&with_t, "%Y-%m-%dT%H:%M:%S") {
                Ok(naive) => Ok(naive.and_utc()),
                Err(_) => Err(rfc3339_err),
            }
        }
    }
}

/// Formats an instant as millisecond-precision ISO-8601 with a trailing `Z`,
/// matching the reaction-timestamp format used by the transport's wire shape.
pub fn format_timestamp_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `clamp(len(content) * 100ms, 2000ms, 8000ms)` — how long to show a typing
/// indicator before sending a message, per the executor's pacing model.
pub fn typing_duration(content: &str) -> Duration {
    let estimate_ms = (content.chars().count() as u64).saturating_mul(100);
    Duration::from_millis(estimate_ms.clamp(2000, 8000))
}
