//! Anthropic OAuth usage normalizer.
//!
//! The usage endpoint reports both windows as fractions in `0.0..=1.0`.

use serde::Deserialize;

use super::{SnapshotContext, lenient_number, lenient_string};
use crate::core::models::{LimitType, UsageSnapshot, UsageWindows, round_percent};
use crate::util::time::format_reset_time;

/// Body of `GET /api/oauth/usage`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnthropicUsage {
    #[serde(default, deserialize_with = "lenient_number")]
    pub five_hour_utilization: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub seven_day_utilization: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub five_hour_reset_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub seven_day_reset_at: Option<String>,
}

impl AnthropicUsage {
    #[must_use]
    pub fn normalize(&self, ctx: &SnapshotContext) -> UsageSnapshot {
        let session = self.five_hour_utilization.unwrap_or(0.0);
        let weekly = self.seven_day_utilization.unwrap_or(0.0);

        // Compare the raw fractions, not the rounded percents.
        let limit_type = if weekly > session {
            LimitType::Weekly
        } else {
            LimitType::Session
        };

        UsageSnapshot {
            session_percent: round_percent(session * 100.0),
            weekly_percent: round_percent(weekly * 100.0),
            session_reset_time: format_reset_time(self.five_hour_reset_at.as_deref(), ctx.now),
            weekly_reset_time: format_reset_time(self.seven_day_reset_at.as_deref(), ctx.now),
            profile_id: ctx.profile_id.clone(),
            profile_name: ctx.profile_name.clone(),
            fetched_at: ctx.now,
            limit_type,
            usage_windows: Some(UsageWindows::new("5-hour", "7-day")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::provider::Provider;
    use crate::providers::UsagePayload;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn ctx() -> SnapshotContext {
        SnapshotContext {
            profile_id: "oauth-1".to_string(),
            profile_name: "Personal".to_string(),
            now: Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap(),
        }
    }

    fn normalize(body: serde_json::Value) -> UsageSnapshot {
        UsagePayload::parse(Provider::Anthropic, body)
            .unwrap()
            .normalize(&ctx())
    }

    #[test]
    fn fractions_become_rounded_percents() {
        let snapshot = normalize(json!({
            "five_hour_utilization": 0.72,
            "seven_day_utilization": 0.45
        }));
        assert_eq!(snapshot.session_percent, 72);
        assert_eq!(snapshot.weekly_percent, 45);
        assert_eq!(snapshot.limit_type, LimitType::Session);
        assert_eq!(snapshot.profile_id, "oauth-1");
        assert_eq!(snapshot.profile_name, "Personal");
    }

    #[test]
    fn weekly_wins_only_when_strictly_larger() {
        let snapshot = normalize(json!({
            "five_hour_utilization": 0.2,
            "seven_day_utilization": 0.9
        }));
        assert_eq!(snapshot.limit_type, LimitType::Weekly);

        let tie = normalize(json!({
            "five_hour_utilization": 0.5,
            "seven_day_utilization": 0.5
        }));
        assert_eq!(tie.limit_type, LimitType::Session);
    }

    #[test]
    fn missing_and_non_numeric_fields_default_to_zero() {
        let snapshot = normalize(json!({
            "five_hour_utilization": {"nested": true},
            "seven_day_reset_at": 42
        }));
        assert_eq!(snapshot.session_percent, 0);
        assert_eq!(snapshot.weekly_percent, 0);
        assert_eq!(snapshot.session_reset_time, "Unknown");
        assert_eq!(snapshot.weekly_reset_time, "Unknown");
    }

    #[test]
    fn reset_times_are_formatted() {
        let snapshot = normalize(json!({
            "five_hour_utilization": 0.1,
            "seven_day_utilization": 0.1,
            "five_hour_reset_at": "2026-05-04T12:45:00Z",
            "seven_day_reset_at": "2026-05-08T16:00:00Z"
        }));
        assert_eq!(snapshot.session_reset_time, "2h 45m");
        assert_eq!(snapshot.weekly_reset_time, "4d 6h");
        assert_eq!(
            snapshot.usage_windows,
            Some(UsageWindows::new("5-hour", "7-day"))
        );
    }
}
