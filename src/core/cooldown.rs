//! Auth-failure cooldown.
//!
//! Tracks the most recent authentication failure per profile. A profile is
//! excluded from swap candidacy for [`AUTH_FAILURE_COOLDOWN`] after it fails,
//! which keeps the engine from bouncing between profiles that all reject
//! their credentials.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// How long a failed profile stays ineligible.
pub const AUTH_FAILURE_COOLDOWN: Duration = Duration::from_secs(300);

/// Profile id → time of its most recent auth failure.
#[derive(Debug, Clone)]
pub struct AuthFailureCooldown {
    ttl: TimeDelta,
    failures: HashMap<String, DateTime<Utc>>,
}

impl Default for AuthFailureCooldown {
    fn default() -> Self {
        Self::new(AUTH_FAILURE_COOLDOWN)
    }
}

impl AuthFailureCooldown {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            failures: HashMap::new(),
        }
    }

    /// Record a failure for `profile_id` at `now`, replacing any older entry.
    pub fn insert(&mut self, profile_id: &str, now: DateTime<Utc>) {
        self.failures.insert(profile_id.to_string(), now);
    }

    /// Whether `profile_id` failed within the TTL before `now`.
    #[must_use]
    pub fn is_excluded(&self, profile_id: &str, now: DateTime<Utc>) -> bool {
        self.failures
            .get(profile_id)
            .is_some_and(|failed_at| now - *failed_at < self.ttl)
    }

    /// Drop entries whose TTL has elapsed. Returns how many were removed.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.failures.len();
        let ttl = self.ttl;
        self.failures.retain(|_, failed_at| now - *failed_at < ttl);
        before - self.failures.len()
    }

    /// Ids currently in the map, sorted for stable event payloads.
    #[must_use]
    pub fn excluded_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.failures.keys().cloned().collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}
