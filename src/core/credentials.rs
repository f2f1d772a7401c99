//! Active credential resolution.
//!
//! Priority, evaluated every cycle:
//! 1. an active API profile with a non-empty key;
//! 2. the active OAuth profile's token from the profile store;
//! 3. nothing, in which case the cycle falls back to [`cli_usage_fallback`].
//!
//! A profile file that cannot be loaded counts as "no API profile".

use std::fmt;

use crate::core::models::UsageSnapshot;
use crate::core::provider::ANTHROPIC_BASE_URL;
use crate::core::store::{ApiProfileSource, ProfileStore};
use crate::util::credential_fingerprint;

/// How the active credential authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// API key from the API profiles file.
    ApiKey,
    /// OAuth token from the profile store.
    OAuth,
}

impl CredentialKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::OAuth => "oauth",
        }
    }
}

/// The credential a cycle polls with.
#[derive(Clone, PartialEq, Eq)]
pub struct ActiveCredential {
    pub profile_id: String,
    pub profile_name: String,
    pub kind: CredentialKind,
    pub base_url: String,
    /// Explicit endpoint from the profile, bypassing endpoint resolution.
    pub usage_endpoint: Option<String>,
    secret: String,
}

impl ActiveCredential {
    #[must_use]
    pub fn new(
        profile_id: &str,
        profile_name: &str,
        kind: CredentialKind,
        base_url: &str,
        secret: &str,
    ) -> Self {
        Self {
            profile_id: profile_id.to_string(),
            profile_name: profile_name.to_string(),
            kind,
            base_url: base_url.to_string(),
            usage_endpoint: None,
            secret: secret.to_string(),
        }
    }

    #[must_use]
    pub fn with_usage_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.usage_endpoint = endpoint;
        self
    }

    /// The raw key or token.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Whether usage thresholds may trigger a proactive swap for this
    /// credential. API-key profiles only take the auth-failure path.
    #[must_use]
    pub const fn allows_proactive_swap(&self) -> bool {
        matches!(self.kind, CredentialKind::OAuth)
    }
}

impl fmt::Debug for ActiveCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveCredential")
            .field("profile_id", &self.profile_id)
            .field("profile_name", &self.profile_name)
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("usage_endpoint", &self.usage_endpoint)
            .field("secret", &credential_fingerprint(&self.secret))
            .finish()
    }
}

/// Determine which credential is active.
pub async fn resolve_credential(
    api_profiles: &dyn ApiProfileSource,
    store: &dyn ProfileStore,
) -> Option<ActiveCredential> {
    match api_profiles.load_profiles().await {
        Ok(file) => {
            if let Some(profile) = file.active() {
                tracing::debug!(profile_id = %profile.id, "using active API profile");
                return Some(
                    ActiveCredential::new(
                        &profile.id,
                        &profile.name,
                        CredentialKind::ApiKey,
                        &profile.base_url,
                        &profile.api_key,
                    )
                    .with_usage_endpoint(profile.usage_endpoint.clone()),
                );
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "API profiles unavailable, trying OAuth profile");
        }
    }

    let profile = match store.active_profile().await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            tracing::debug!("no active OAuth profile");
            return None;
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to read active profile");
            return None;
        }
    };

    if !profile.has_oauth_token {
        tracing::debug!(profile_id = %profile.id, "active profile has no OAuth token");
        return None;
    }

    match store.resolve_credential(&profile.id).await {
        Ok(Some(token)) if !token.is_empty() => {
            let base_url = profile.base_url.as_deref().unwrap_or(ANTHROPIC_BASE_URL);
            Some(
                ActiveCredential::new(
                    &profile.id,
                    &profile.name,
                    CredentialKind::OAuth,
                    base_url,
                    &token,
                )
                .with_usage_endpoint(profile.usage_endpoint),
            )
        }
        Ok(_) => {
            tracing::debug!(profile_id = %profile.id, "OAuth token could not be resolved");
            None
        }
        Err(e) => {
            tracing::warn!(profile_id = %profile.id, error = %e, "failed to resolve OAuth token");
            None
        }
    }
}

/// Usage from the agent CLI when no credential is available.
///
/// Extension point: parsing the CLI's usage output is not implemented, so
/// this always reports no data.
pub async fn cli_usage_fallback() -> Option<UsageSnapshot> {
    tracing::debug!("no credential available, CLI usage fallback returns no data");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_secret() {
        let credential = ActiveCredential::new(
            "p1",
            "Work",
            CredentialKind::OAuth,
            ANTHROPIC_BASE_URL,
            "sk-ant-oat01-very-secret",
        );
        let debug = format!("{credential:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains(&credential_fingerprint("sk-ant-oat01-very-secret")));
    }

    #[test]
    fn only_oauth_allows_proactive_swap() {
        let oauth = ActiveCredential::new("a", "A", CredentialKind::OAuth, "https://x", "t");
        let api = ActiveCredential::new("b", "B", CredentialKind::ApiKey, "https://x", "k");
        assert!(oauth.allows_proactive_swap());
        assert!(!api.allows_proactive_swap());
    }

    #[tokio::test]
    async fn cli_fallback_returns_nothing() {
        assert!(cli_usage_fallback().await.is_none());
    }

    // ===== Resolution order =====

    use crate::core::models::{ApiProfilesFile, Profile};
    use crate::test_utils::{InMemoryProfileStore, make_api_profile};

    fn oauth_store() -> InMemoryProfileStore {
        InMemoryProfileStore::new()
            .with_profile(Profile::new("work", "Work"), Some("tok-work"))
            .with_active("work")
    }

    #[tokio::test]
    async fn active_api_profile_wins_over_oauth() {
        let store = oauth_store().with_api_profiles(ApiProfilesFile {
            profiles: vec![make_api_profile("glm", "https://api.z.ai/api/anthropic", "k-1")],
            active_profile_id: Some("glm".to_string()),
        });

        let credential = resolve_credential(&store, &store).await.unwrap();
        assert_eq!(credential.profile_id, "glm");
        assert_eq!(credential.kind, CredentialKind::ApiKey);
        assert_eq!(credential.secret(), "k-1");
    }

    #[tokio::test]
    async fn blank_api_key_falls_through_to_oauth() {
        let store = oauth_store().with_api_profiles(ApiProfilesFile {
            profiles: vec![make_api_profile("glm", "https://api.z.ai", "  ")],
            active_profile_id: Some("glm".to_string()),
        });

        let credential = resolve_credential(&store, &store).await.unwrap();
        assert_eq!(credential.profile_id, "work");
        assert_eq!(credential.kind, CredentialKind::OAuth);
        assert_eq!(credential.base_url, ANTHROPIC_BASE_URL);
    }

    #[tokio::test]
    async fn api_source_error_falls_through_to_oauth() {
        let store = oauth_store().failing_api_profiles();
        let credential = resolve_credential(&store, &store).await.unwrap();
        assert_eq!(credential.secret(), "tok-work");
    }

    #[tokio::test]
    async fn profile_without_token_resolves_nothing() {
        let store = InMemoryProfileStore::new()
            .with_profile(Profile::new("bare", "Bare"), None)
            .with_active("bare");
        assert!(resolve_credential(&store, &store).await.is_none());
    }

    #[tokio::test]
    async fn oauth_profile_keeps_custom_base_url_and_endpoint() {
        let store = InMemoryProfileStore::new()
            .with_profile(
                Profile::new("proxy", "Proxy")
                    .with_base_url("https://llm.example.com")
                    .with_usage_endpoint("https://llm.example.com/usage"),
                Some("tok"),
            )
            .with_active("proxy");

        let credential = resolve_credential(&store, &store).await.unwrap();
        assert_eq!(credential.base_url, "https://llm.example.com");
        assert_eq!(
            credential.usage_endpoint.as_deref(),
            Some("https://llm.example.com/usage")
        );
    }
}
