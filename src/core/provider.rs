//! Provider detection and usage endpoint resolution.
//!
//! A profile only knows its base URL. The provider is recovered from the
//! URL's hostname, and the usage endpoint is built by swapping the base URL's
//! path for the provider's fixed usage path.

use serde::{Deserialize, Serialize};
use url::Url;

// =============================================================================
// Provider Enum
// =============================================================================

/// Backend provider families the monitor knows how to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    Zai,
    Zhipu,
    Unknown,
}

impl Provider {
    /// All providers, known ones first.
    pub const ALL: &'static [Self] = &[Self::Anthropic, Self::Zai, Self::Zhipu, Self::Unknown];

    /// Stable identifier used in logs, events and errors.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Zai => "zai",
            Self::Zhipu => "zhipu",
            Self::Unknown => "unknown",
        }
    }

    /// Display name for human output.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Anthropic => "Anthropic",
            Self::Zai => "z.ai",
            Self::Zhipu => "ZHIPU AI",
            Self::Unknown => "Unknown",
        }
    }

    /// Fixed path of the usage endpoint, if the provider has one.
    #[must_use]
    pub const fn usage_path(self) -> Option<&'static str> {
        match self {
            Self::Anthropic => Some(ANTHROPIC_USAGE_PATH),
            Self::Zai | Self::Zhipu => Some(QUOTA_LIMIT_PATH),
            Self::Unknown => None,
        }
    }

    /// Value of the `Authorization` header for a credential.
    ///
    /// Anthropic takes a bearer token; the others take the raw key.
    #[must_use]
    pub fn authorization_value(self, credential: &str) -> String {
        match self {
            Self::Anthropic => format!("Bearer {credential}"),
            Self::Zai | Self::Zhipu | Self::Unknown => credential.to_string(),
        }
    }

    /// Whether success bodies may wrap the payload in a `data` object.
    #[must_use]
    pub const fn wraps_payload_in_data(self) -> bool {
        matches!(self, Self::Zai | Self::Zhipu)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

// =============================================================================
// Detection
// =============================================================================

/// Usage path for Anthropic OAuth accounts.
pub const ANTHROPIC_USAGE_PATH: &str = "/api/oauth/usage";

/// Quota path shared by z.ai and ZHIPU.
pub const QUOTA_LIMIT_PATH: &str = "/api/monitor/usage/quota/limit";

/// Default Anthropic base URL for OAuth profiles without an explicit one.
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Ordered hostname patterns per provider. First match wins.
///
/// A pattern matches a hostname equal to it or ending in `"." + pattern`.
pub const PROVIDER_DOMAINS: &[(Provider, &[&str])] = &[
    (Provider::Anthropic, &["api.anthropic.com", "anthropic.com"]),
    (Provider::Zai, &["api.z.ai", "z.ai"]),
    (
        Provider::Zhipu,
        &["open.bigmodel.cn", "dev.bigmodel.cn", "bigmodel.cn"],
    ),
];

/// Detect the provider behind a base URL.
///
/// Never fails: unparsable URLs and unmatched hosts are [`Provider::Unknown`].
#[must_use]
pub fn detect_provider(base_url: &str) -> Provider {
    let Ok(url) = Url::parse(base_url) else {
        return Provider::Unknown;
    };
    let Some(host) = url.host_str() else {
        return Provider::Unknown;
    };
    let host = host.to_ascii_lowercase();

    PROVIDER_DOMAINS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| host_matches(&host, p)))
        .map_or(Provider::Unknown, |(provider, _)| *provider)
}

fn host_matches(host: &str, pattern: &str) -> bool {
    host == pattern
        || host
            .strip_suffix(pattern)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Build the usage endpoint for a provider from a profile's base URL.
///
/// The base URL's path, query and fragment are replaced by the provider's
/// usage path. Returns `None` for providers without an endpoint and for
/// invalid base URLs.
#[must_use]
pub fn usage_endpoint(provider: Provider, base_url: &str) -> Option<String> {
    let path = provider.usage_path()?;
    let mut url = Url::parse(base_url).ok()?;
    if url.cannot_be_a_base() {
        return None;
    }
    url.set_path(path);
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}
