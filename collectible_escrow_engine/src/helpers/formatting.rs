//! Clock and formatting utilities shared by the aggregation engine and the audit log.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

pub const PENDING_DISPLAY: &str = "Pending";

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g. `2024-05-01T10:15:00.000Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Returns `now`, or `earlier` if the clock has somehow gone backwards since `earlier` was recorded. Used to keep
/// lifecycle timestamps monotonic.
pub fn not_before(now: DateTime<Utc>, earlier: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match earlier {
        Some(e) if e > now => e,
        _ => now,
    }
}

/// Drops sub-millisecond precision, matching what survives a round trip through a millisecond unix timestamp.
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ts.timestamp_millis()).single().unwrap_or(ts)
}

/// Converts elapsed milliseconds to whole seconds after applying the display scale factor.
pub fn scaled_seconds(elapsed_ms: f64, scale: u32) -> i64 {
    ((elapsed_ms / 1000.0) * f64::from(scale)).round() as i64
}

/// Renders an elapsed duration for humans, after multiplying the elapsed seconds by `scale`.
///
/// `None`, zero and negative durations render as [`PENDING_DISPLAY`]. Durations of an hour or more render as
/// `"{h}h {m}m"`, shorter ones as `"{m}m"`, and anything under a minute as `"<1m"`.
pub fn format_scaled_duration(elapsed_ms: Option<f64>, scale: u32) -> String {
    let secs = match elapsed_ms {
        Some(ms) if ms > 0.0 && scale > 0 => scaled_seconds(ms, scale),
        _ => return PENDING_DISPLAY.to_string(),
    };
    if secs <= 0 {
        return PENDING_DISPLAY.to_string();
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    match (hours, minutes) {
        (0, 0) => "<1m".to_string(),
        (0, m) => format!("{m}m"),
        (h, m) => format!("{h}h {m}m"),
    }
}
