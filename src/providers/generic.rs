//! Fallback normalizer for providers with undocumented usage shapes.
//!
//! Field names are looked up from [`FIELD_CANDIDATES`], in order. For usage
//! and limit quantities the first candidate holding a positive number wins;
//! for reset quantities the first non-empty string wins. Anything missing
//! counts as zero, so a reachable but unrecognized provider still yields a
//! (zero-valued) snapshot.

use serde_json::{Map, Value};

use super::SnapshotContext;
use crate::core::models::{LimitType, UsageSnapshot, round_percent};
use crate::util::time::format_reset_time;

/// Logical quantities the generic normalizer extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    SessionUsage,
    SessionLimit,
    WeeklyUsage,
    WeeklyLimit,
    SessionReset,
    WeeklyReset,
}

/// Ordered candidate keys per quantity.
pub const FIELD_CANDIDATES: &[(Quantity, &[&str])] = &[
    (
        Quantity::SessionUsage,
        &[
            "session_usage",
            "sessionUsage",
            "current_usage",
            "currentUsage",
            "used",
            "usage",
            "tokens_used",
        ],
    ),
    (
        Quantity::SessionLimit,
        &[
            "session_limit",
            "sessionLimit",
            "usage_limit",
            "usageLimit",
            "limit",
            "quota",
            "tokens_limit",
        ],
    ),
    (
        Quantity::WeeklyUsage,
        &[
            "weekly_usage",
            "weeklyUsage",
            "week_usage",
            "monthly_usage",
            "monthlyUsage",
        ],
    ),
    (
        Quantity::WeeklyLimit,
        &[
            "weekly_limit",
            "weeklyLimit",
            "week_limit",
            "monthly_limit",
            "monthlyLimit",
        ],
    ),
    (
        Quantity::SessionReset,
        &[
            "session_reset_at",
            "sessionResetAt",
            "reset_at",
            "resetAt",
            "reset_time",
            "resetTime",
        ],
    ),
    (
        Quantity::WeeklyReset,
        &[
            "weekly_reset_at",
            "weeklyResetAt",
            "monthly_reset_at",
            "monthlyResetAt",
        ],
    ),
];

/// Candidate keys for one quantity.
#[must_use]
pub fn candidates(quantity: Quantity) -> &'static [&'static str] {
    FIELD_CANDIDATES
        .iter()
        .find_map(|(q, keys)| (*q == quantity).then_some(*keys))
        .unwrap_or_default()
}

/// An arbitrary JSON object from an unknown provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericUsage {
    fields: Map<String, Value>,
}

impl GenericUsage {
    /// Wrap a body; non-objects become an empty field set.
    #[must_use]
    pub fn from_value(body: Value) -> Self {
        match body {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    /// First positive number among the quantity's candidates, else 0.
    ///
    /// Only JSON numbers count; numeric strings are skipped.
    #[must_use]
    pub fn number(&self, quantity: Quantity) -> f64 {
        candidates(quantity)
            .iter()
            .filter_map(|key| self.fields.get(*key))
            .filter_map(Value::as_f64)
            .find(|n| *n > 0.0)
            .unwrap_or(0.0)
    }

    /// First non-empty string among the quantity's candidates.
    #[must_use]
    pub fn text(&self, quantity: Quantity) -> Option<&str> {
        candidates(quantity)
            .iter()
            .filter_map(|key| self.fields.get(*key))
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
    }

    #[must_use]
    pub fn normalize(&self, ctx: &SnapshotContext) -> UsageSnapshot {
        let session_usage = self.number(Quantity::SessionUsage);
        let session_limit = self.number(Quantity::SessionLimit);
        let weekly_usage = self.number(Quantity::WeeklyUsage);
        let weekly_limit = self.number(Quantity::WeeklyLimit);

        let session_percent = percent(session_usage, session_limit);
        let weekly_percent = percent(weekly_usage, weekly_limit);

        UsageSnapshot {
            session_percent,
            weekly_percent,
            session_reset_time: format_reset_time(self.text(Quantity::SessionReset), ctx.now),
            weekly_reset_time: format_reset_time(self.text(Quantity::WeeklyReset), ctx.now),
            profile_id: ctx.profile_id.clone(),
            profile_name: ctx.profile_name.clone(),
            fetched_at: ctx.now,
            limit_type: LimitType::from_percents(session_percent, weekly_percent),
            usage_windows: None,
        }
    }
}

/// `round(usage / limit * 100)`, or 0 when the limit is not positive.
#[must_use]
pub fn percent(usage: f64, limit: f64) -> u32 {
    if limit <= 0.0 {
        return 0;
    }
    round_percent(usage / limit * 100.0)
}
