//! Core data models.
//!
//! These types are the canonical, provider-independent shapes the monitor
//! works with. Serialized field names are camelCase so UI consumers see the
//! same keys regardless of provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Limit Type
// =============================================================================

/// Which usage window is currently more constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitType {
    Session,
    Weekly,
}

impl LimitType {
    /// Larger percentage wins; ties go to the session window.
    #[must_use]
    pub fn from_percents(session: u32, weekly: u32) -> Self {
        if weekly > session {
            Self::Weekly
        } else {
            Self::Session
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Weekly => "weekly",
        }
    }
}

impl std::fmt::Display for LimitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Usage Snapshot
// =============================================================================

/// Display labels for the two usage windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageWindows {
    pub session_label: String,
    pub weekly_label: String,
}

impl UsageWindows {
    #[must_use]
    pub fn new(session_label: &str, weekly_label: &str) -> Self {
        Self {
            session_label: session_label.to_string(),
            weekly_label: weekly_label.to_string(),
        }
    }
}

/// Result of one successful poll.
///
/// Replaced wholesale on every successful poll; no history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    /// Session window usage, 0-100 for documented providers.
    pub session_percent: u32,
    /// Weekly (or monthly) window usage.
    pub weekly_percent: u32,
    /// Human-readable reset label, `"Unknown"` when unavailable.
    pub session_reset_time: String,
    pub weekly_reset_time: String,
    pub profile_id: String,
    pub profile_name: String,
    pub fetched_at: DateTime<Utc>,
    pub limit_type: LimitType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_windows: Option<UsageWindows>,
}

/// Round a percentage-like value to an integer.
///
/// Negative and NaN values land on 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_percent(value: f64) -> u32 {
    value.round() as u32
}

// =============================================================================
// Profiles
// =============================================================================

/// An OAuth-backed profile owned by the profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    /// Base URL the agent talks to. Anthropic when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Whether the store holds an OAuth token for this profile.
    #[serde(default)]
    pub has_oauth_token: bool,
    /// Explicit usage endpoint, bypassing endpoint resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_endpoint: Option<String>,
}

impl Profile {
    #[must_use]
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            base_url: None,
            has_oauth_token: true,
            usage_endpoint: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    #[must_use]
    pub fn with_usage_endpoint(mut self, endpoint: &str) -> Self {
        self.usage_endpoint = Some(endpoint.to_string());
        self
    }

    #[must_use]
    pub const fn without_token(mut self) -> Self {
        self.has_oauth_token = false;
        self
    }
}

/// A profile carrying a directly usable API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProfile {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_endpoint: Option<String>,
}

/// Contents of the API profiles file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProfilesFile {
    #[serde(default)]
    pub profiles: Vec<ApiProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_profile_id: Option<String>,
}

impl ApiProfilesFile {
    /// The active API profile, if it exists and has a non-empty key.
    #[must_use]
    pub fn active(&self) -> Option<&ApiProfile> {
        let id = self.active_profile_id.as_deref()?;
        self.profiles
            .iter()
            .find(|p| p.id == id && !p.api_key.trim().is_empty())
    }
}

// =============================================================================
// Auto-Switch Settings
// =============================================================================

/// Default poll interval in milliseconds.
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 30_000;

/// Auto-switch configuration, read-only to the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoSwitchSettings {
    pub enabled: bool,
    pub proactive_swap_enabled: bool,
    /// Poll interval in milliseconds.
    pub usage_check_interval: u64,
    /// Session percent at or above which a proactive swap fires.
    pub session_threshold: u32,
    /// Weekly percent at or above which a proactive swap fires.
    pub weekly_threshold: u32,
}

impl Default for AutoSwitchSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            proactive_swap_enabled: false,
            usage_check_interval: DEFAULT_CHECK_INTERVAL_MS,
            session_threshold: 95,
            weekly_threshold: 99,
        }
    }
}

impl AutoSwitchSettings {
    /// Both switches on.
    #[must_use]
    pub const fn swapping_enabled(&self) -> bool {
        self.enabled && self.proactive_swap_enabled
    }

    /// Poll interval, falling back to the default when unset.
    #[must_use]
    pub const fn check_interval(&self) -> std::time::Duration {
        let ms = if self.usage_check_interval == 0 {
            DEFAULT_CHECK_INTERVAL_MS
        } else {
            self.usage_check_interval
        };
        std::time::Duration::from_millis(ms)
    }
}
