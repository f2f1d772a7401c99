//! z.ai / ZHIPU quota normalizer.
//!
//! Both providers answer `GET /api/monitor/usage/quota/limit` with a list of
//! limits. The token limit drives the session window and the time limit the
//! monthly window. Neither reports a usable reset time, so both are computed.

use serde::Deserialize;

use super::{SnapshotContext, lenient_number, lenient_string};
use crate::core::models::{LimitType, UsageSnapshot, UsageWindows, round_percent};
use crate::util::time::{next_hour_reset_label, next_month_reset_label};

/// Limit entry type for the rolling token window.
pub const TOKENS_LIMIT: &str = "TOKENS_LIMIT";
/// Limit entry type for the monthly window.
pub const TIME_LIMIT: &str = "TIME_LIMIT";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuotaLimit {
    #[serde(
        rename = "type",
        alias = "limitType",
        default,
        deserialize_with = "lenient_string"
    )]
    pub limit_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub percentage: Option<f64>,
}

/// Quota body after the optional `data` envelope is removed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuotaResponse {
    pub limits: Vec<QuotaLimit>,
}

impl QuotaResponse {
    fn percent_for(&self, limit_type: &str) -> u32 {
        self.limits
            .iter()
            .find(|l| l.limit_type.as_deref() == Some(limit_type))
            .and_then(|l| l.percentage)
            .map_or(0, round_percent)
    }

    #[must_use]
    pub fn normalize(&self, ctx: &SnapshotContext) -> UsageSnapshot {
        let session_percent = self.percent_for(TOKENS_LIMIT);
        let weekly_percent = self.percent_for(TIME_LIMIT);

        UsageSnapshot {
            session_percent,
            weekly_percent,
            session_reset_time: next_hour_reset_label(ctx.now),
            weekly_reset_time: next_month_reset_label(ctx.now),
            profile_id: ctx.profile_id.clone(),
            profile_name: ctx.profile_name.clone(),
            fetched_at: ctx.now,
            limit_type: LimitType::from_percents(session_percent, weekly_percent),
            usage_windows: Some(UsageWindows::new("5-hour", "Monthly")),
        }
    }
}
