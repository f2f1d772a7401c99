//! Time sources and reset-time formatting.

use std::fmt::Debug;

use chrono::{DateTime, Datelike, Duration, Month, NaiveDateTime, Timelike, Utc};

/// Label used when a reset time is not available.
pub const UNKNOWN_RESET: &str = "Unknown";

const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Source of "now" for everything that compares against wall-clock time.
///
/// The monitor, cooldown pruning and the computed z.ai reset labels all read
/// time through this trait so tests can pin it.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Parse a provider timestamp.
///
/// Accepts RFC 3339 and zone-less ISO timestamps (read as UTC).
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format the time remaining until `timestamp`.
///
/// - missing or empty ⇒ `"Unknown"`
/// - under 24h away (either direction) ⇒ `"{h}h {m}m"`, negative for the past
/// - otherwise ⇒ `"{d}d {h}h"`
///
/// An unparsable timestamp is not mapped to `"Unknown"`: the arithmetic runs
/// on NaN and yields `"NaNd NaNh"`. Callers display it verbatim.
#[must_use]
pub fn format_reset_time(timestamp: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(raw) = timestamp.filter(|s| !s.is_empty()) else {
        return UNKNOWN_RESET.to_string();
    };

    #[allow(clippy::cast_precision_loss)]
    let diff_ms = parse_timestamp(raw).map_or(f64::NAN, |target| {
        (target - now).num_milliseconds() as f64
    });

    if diff_ms.is_nan() {
        tracing::warn!(timestamp = raw, "unparsable reset timestamp");
    }

    if diff_ms.abs() < MS_PER_DAY {
        let hours = floor(diff_ms / MS_PER_HOUR);
        let minutes = floor((diff_ms % MS_PER_HOUR) / MS_PER_MINUTE);
        format!("{hours}h {minutes}m")
    } else {
        let days = floor(diff_ms / MS_PER_DAY);
        let hours = floor((diff_ms % MS_PER_DAY) / MS_PER_HOUR);
        format!("{days}d {hours}h")
    }
}

/// Label for a window that resets at the top of the next clock hour.
#[must_use]
pub fn next_hour_reset_label(now: DateTime<Utc>) -> String {
    let top_of_hour = now
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);
    let next_hour = top_of_hour + Duration::hours(1);

    #[allow(clippy::cast_precision_loss)]
    let diff_ms = (next_hour - now).num_milliseconds() as f64;
    let hours = floor(diff_ms / MS_PER_HOUR);
    let minutes = floor((diff_ms % MS_PER_HOUR) / MS_PER_MINUTE);
    format!("Resets in {hours}h {minutes}m")
}

/// Label for a window that resets on the first day of the next month.
#[must_use]
pub fn next_month_reset_label(now: DateTime<Utc>) -> String {
    // `month()` is 1-based, so it is already the 0-based index of next month.
    let next = u8::try_from(now.month() % 12 + 1).unwrap_or(1);
    let name = Month::try_from(next).map_or("January", |m| m.name());
    format!("1st of {name}")
}

/// Floor that never renders as `-0`.
fn floor(value: f64) -> f64 {
    value.floor() + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn missing_timestamp_is_unknown() {
        let now = at(2026, 3, 1, 12, 0, 0);
        assert_eq!(format_reset_time(None, now), "Unknown");
        assert_eq!(format_reset_time(Some(""), now), "Unknown");
    }

    #[test]
    fn under_a_day_formats_hours_and_minutes() {
        let now = at(2026, 3, 1, 12, 0, 0);
        assert_eq!(
            format_reset_time(Some("2026-03-01T15:30:00Z"), now),
            "3h 30m"
        );
    }

    #[test]
    fn past_timestamp_goes_negative() {
        let now = at(2026, 3, 1, 12, 0, 0);
        assert_eq!(
            format_reset_time(Some("2026-03-01T10:00:00Z"), now),
            "-2h 0m"
        );
    }

    #[test]
    fn over_a_day_formats_days_and_hours() {
        let now = at(2026, 3, 1, 12, 0, 0);
        assert_eq!(
            format_reset_time(Some("2026-03-04T17:00:00+00:00"), now),
            "3d 5h"
        );
    }

    #[test]
    fn zone_less_timestamp_is_utc() {
        let now = at(2026, 3, 1, 12, 0, 0);
        assert_eq!(format_reset_time(Some("2026-03-01T13:15:00"), now), "1h 15m");
    }

    #[test]
    fn unparsable_timestamp_keeps_nan_output() {
        let now = at(2026, 3, 1, 12, 0, 0);
        assert_eq!(format_reset_time(Some("not-a-date"), now), "NaNd NaNh");
    }

    #[test]
    fn next_hour_label_counts_down_to_top_of_hour() {
        assert_eq!(
            next_hour_reset_label(at(2026, 3, 1, 12, 20, 0)),
            "Resets in 0h 40m"
        );
        assert_eq!(
            next_hour_reset_label(at(2026, 3, 1, 12, 0, 0)),
            "Resets in 1h 0m"
        );
    }

    #[test]
    fn next_month_label_wraps_december() {
        assert_eq!(next_month_reset_label(at(2026, 3, 15, 0, 0, 0)), "1st of April");
        assert_eq!(
            next_month_reset_label(at(2026, 12, 31, 23, 0, 0)),
            "1st of January"
        );
    }
}
