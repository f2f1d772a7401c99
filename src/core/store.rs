//! Collaborator interfaces consumed by the monitor.
//!
//! The monitor never owns profiles or settings. It reads them through these
//! traits, which the host application implements (see
//! [`crate::storage::profiles`] for the file-backed versions).

use async_trait::async_trait;

use crate::core::models::{ApiProfilesFile, AutoSwitchSettings, Profile};
use crate::error::Result;

/// Owner of OAuth profiles, their availability ranking, and which is active.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// The currently active OAuth profile, if any.
    async fn active_profile(&self) -> Result<Option<Profile>>;

    /// Look up a profile by id.
    async fn profile(&self, id: &str) -> Result<Option<Profile>>;

    /// All profiles, best candidate first.
    async fn profiles_by_availability(&self) -> Result<Vec<Profile>>;

    /// Make `id` the active profile.
    async fn set_active_profile(&self, id: &str) -> Result<()>;

    /// Resolve (decrypt, unlock) the OAuth token for a profile.
    async fn resolve_credential(&self, id: &str) -> Result<Option<String>>;

    /// Current auto-switch settings. Synchronous so a cycle never observes a
    /// half-updated settings object.
    fn auto_switch_settings(&self) -> AutoSwitchSettings;
}

/// Source of API-key profiles.
#[async_trait]
pub trait ApiProfileSource: Send + Sync {
    /// Load the API profiles file.
    async fn load_profiles(&self) -> Result<ApiProfilesFile>;
}
