//! Test utilities for swapwatch.
//!
//! In-memory collaborators, a pinned clock, snapshot factories and provider
//! response bodies shared by unit and integration tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use swapwatch::test_utils::*;
//!
//! let store = InMemoryProfileStore::new()
//!     .with_profile(Profile::new("work", "Work"), Some("tok-work"))
//!     .with_active("work");
//! let clock = ManualClock::default();
//! clock.advance(chrono::TimeDelta::minutes(5));
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde_json::{Value, json};

use crate::core::models::{
    ApiProfile, ApiProfilesFile, AutoSwitchSettings, LimitType, Profile, UsageSnapshot,
};
use crate::core::store::{ApiProfileSource, ProfileStore};
use crate::error::{Result, SwapwatchError};
use crate::util::Clock;

// =============================================================================
// Time
// =============================================================================

/// The instant every [`ManualClock`] starts at: 2026-05-04 10:00:00 UTC.
///
/// # Panics
///
/// Never; the date is valid.
#[must_use]
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0)
        .single()
        .expect("valid fixed test date")
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(test_now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Test Data Factories
// =============================================================================

/// A snapshot for `profile_id` with the given percents, captured at
/// [`test_now`].
#[must_use]
pub fn make_snapshot(profile_id: &str, session: u32, weekly: u32) -> UsageSnapshot {
    UsageSnapshot {
        session_percent: session,
        weekly_percent: weekly,
        session_reset_time: "2h 45m".to_string(),
        weekly_reset_time: "4d 6h".to_string(),
        profile_id: profile_id.to_string(),
        profile_name: profile_id.to_string(),
        fetched_at: test_now(),
        limit_type: LimitType::from_percents(session, weekly),
        usage_windows: None,
    }
}

/// An API-key profile pointing at `base_url`.
#[must_use]
pub fn make_api_profile(id: &str, base_url: &str, api_key: &str) -> ApiProfile {
    ApiProfile {
        id: id.to_string(),
        name: id.to_string(),
        base_url: base_url.to_string(),
        api_key: api_key.to_string(),
        usage_endpoint: None,
    }
}

/// Auto-switch settings with both switches on.
#[must_use]
pub fn swapping_settings() -> AutoSwitchSettings {
    AutoSwitchSettings {
        enabled: true,
        proactive_swap_enabled: true,
        ..AutoSwitchSettings::default()
    }
}

/// Anthropic OAuth usage body. Utilizations are fractions.
#[must_use]
pub fn anthropic_usage_body(five_hour: f64, seven_day: f64) -> Value {
    json!({
        "five_hour_utilization": five_hour,
        "seven_day_utilization": seven_day,
        "five_hour_reset_at": "2026-05-04T12:45:00Z",
        "seven_day_reset_at": "2026-05-08T16:00:00Z"
    })
}

/// z.ai / ZHIPU quota body, wrapped in the `data` envelope those APIs use.
#[must_use]
pub fn quota_usage_body(tokens_percent: f64, time_percent: f64) -> Value {
    json!({
        "code": 200,
        "success": true,
        "data": {
            "limits": [
                {"type": "TOKENS_LIMIT", "percentage": tokens_percent},
                {"type": "TIME_LIMIT", "percentage": time_percent}
            ]
        }
    })
}

// =============================================================================
// In-Memory Collaborators
// =============================================================================

#[derive(Debug, Default)]
struct StoreState {
    profiles: Vec<Profile>,
    tokens: HashMap<String, String>,
    active: Option<String>,
    settings: AutoSwitchSettings,
    api_profiles: ApiProfilesFile,
}

/// Profile store and API profile source backed by memory.
///
/// Profiles rank in insertion order. Counts calls so tests can assert how
/// often the engine touched it.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    state: Mutex<StoreState>,
    fail_set_active: bool,
    fail_api_profiles: bool,
    set_active_calls: AtomicUsize,
    api_load_calls: AtomicUsize,
}

impl InMemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut StoreState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a profile; `token` is its OAuth token, if any.
    #[must_use]
    pub fn with_profile(mut self, mut profile: Profile, token: Option<&str>) -> Self {
        profile.has_oauth_token = token.is_some();
        let state = self.state_mut();
        if let Some(token) = token {
            state.tokens.insert(profile.id.clone(), token.to_string());
        }
        state.profiles.push(profile);
        self
    }

    #[must_use]
    pub fn with_active(mut self, id: &str) -> Self {
        self.state_mut().active = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: AutoSwitchSettings) -> Self {
        self.state_mut().settings = settings;
        self
    }

    #[must_use]
    pub fn with_api_profiles(mut self, file: ApiProfilesFile) -> Self {
        self.state_mut().api_profiles = file;
        self
    }

    /// Make `load_profiles` return an error.
    #[must_use]
    pub fn failing_api_profiles(mut self) -> Self {
        self.fail_api_profiles = true;
        self
    }

    /// Make `set_active_profile` return an error.
    #[must_use]
    pub fn failing_set_active(mut self) -> Self {
        self.fail_set_active = true;
        self
    }

    #[must_use]
    pub fn active_id(&self) -> Option<String> {
        self.state().active.clone()
    }

    pub fn set_settings(&self, settings: AutoSwitchSettings) {
        self.state().settings = settings;
    }

    #[must_use]
    pub fn set_active_calls(&self) -> usize {
        self.set_active_calls.load(Ordering::SeqCst)
    }

    /// How many times the API profiles were loaded (one per cycle).
    #[must_use]
    pub fn api_load_calls(&self) -> usize {
        self.api_load_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn active_profile(&self) -> Result<Option<Profile>> {
        let state = self.state();
        Ok(state
            .active
            .as_deref()
            .and_then(|id| state.profiles.iter().find(|p| p.id == id))
            .cloned())
    }

    async fn profile(&self, id: &str) -> Result<Option<Profile>> {
        Ok(self.state().profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn profiles_by_availability(&self) -> Result<Vec<Profile>> {
        Ok(self.state().profiles.clone())
    }

    async fn set_active_profile(&self, id: &str) -> Result<()> {
        self.set_active_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_set_active {
            return Err(SwapwatchError::ProfileStore(format!(
                "refusing to activate {id}"
            )));
        }
        let mut state = self.state();
        if !state.profiles.iter().any(|p| p.id == id) {
            return Err(SwapwatchError::ProfileNotFound(id.to_string()));
        }
        state.active = Some(id.to_string());
        Ok(())
    }

    async fn resolve_credential(&self, id: &str) -> Result<Option<String>> {
        Ok(self.state().tokens.get(id).cloned())
    }

    fn auto_switch_settings(&self) -> AutoSwitchSettings {
        self.state().settings
    }
}

#[async_trait]
impl ApiProfileSource for InMemoryProfileStore {
    async fn load_profiles(&self) -> Result<ApiProfilesFile> {
        self.api_load_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_api_profiles {
            return Err(SwapwatchError::ProfileStore(
                "api profiles unavailable".to_string(),
            ));
        }
        Ok(self.state().api_profiles.clone())
    }
}

// =============================================================================
// Temp Directory Utilities
// =============================================================================

/// A temporary directory for tests with automatic cleanup.
///
/// Uses the `tempfile` crate; the directory is deleted on drop.
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file with the given content, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.inner.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}
