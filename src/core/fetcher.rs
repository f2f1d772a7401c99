//! Usage fetcher.
//!
//! Performs the single network call of a poll cycle and classifies the result:
//! - 2xx with a valid body ⇒ [`FetchOutcome::Fetched`]
//! - 401/403, or another error status whose body mentions authentication
//!   ⇒ [`FetchOutcome::AuthFailure`]
//! - everything else (network, JSON, shape, unknown provider, other statuses)
//!   ⇒ [`FetchOutcome::Skipped`]

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::core::credentials::ActiveCredential;
use crate::core::http::{DEFAULT_TIMEOUT, build_client, classify_transport_error};
use crate::core::models::UsageSnapshot;
use crate::core::provider::{Provider, detect_provider, usage_endpoint};
use crate::error::{Result, SwapwatchError};
use crate::providers::{SnapshotContext, UsagePayload};
use crate::util::credential_fingerprint;

/// `anthropic-version` header sent with Anthropic requests.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Substrings that mark an error body as an authentication failure.
/// Matched case-insensitively against the serialized body.
pub const AUTH_ERROR_PATTERNS: &[&str] = &[
    "unauthorized",
    "authentication",
    "invalid token",
    "invalid api key",
    "expired token",
    "forbidden",
    "access denied",
    "credentials",
    "auth failed",
];

/// Classified result of one fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A normalized snapshot.
    Fetched(UsageSnapshot),
    /// The provider rejected the credential.
    AuthFailure(SwapwatchError),
    /// Soft failure; no snapshot this cycle.
    Skipped(SwapwatchError),
}

impl FetchOutcome {
    #[must_use]
    pub const fn snapshot(&self) -> Option<&UsageSnapshot> {
        match self {
            Self::Fetched(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// HTTP fetcher for provider usage endpoints.
#[derive(Debug, Clone)]
pub struct UsageFetcher {
    client: Client,
    timeout: Duration,
}

impl UsageFetcher {
    /// Create a fetcher with its own client.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            timeout,
        })
    }

    /// Create a fetcher around an existing client.
    ///
    /// `timeout` is applied to every request, whatever the client's own
    /// configuration.
    #[must_use]
    pub const fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetch and normalize usage for a credential.
    pub async fn fetch(&self, credential: &ActiveCredential, now: DateTime<Utc>) -> FetchOutcome {
        tracing::debug!(
            profile_id = %credential.profile_id,
            kind = credential.kind.as_str(),
            credential = %credential_fingerprint(credential.secret()),
            "fetching usage"
        );

        match self.try_fetch(credential, now).await {
            Ok(snapshot) => FetchOutcome::Fetched(snapshot),
            Err(e) if e.is_auth_failure() => {
                tracing::warn!(
                    profile_id = %credential.profile_id,
                    status = e.status_code(),
                    provider = e.provider(),
                    "authentication failure"
                );
                FetchOutcome::AuthFailure(e)
            }
            Err(e) => {
                tracing::warn!(
                    profile_id = %credential.profile_id,
                    error = %e,
                    code = e.error_code(),
                    "usage fetch failed"
                );
                FetchOutcome::Skipped(e)
            }
        }
    }

    async fn try_fetch(
        &self,
        credential: &ActiveCredential,
        now: DateTime<Utc>,
    ) -> Result<UsageSnapshot> {
        let provider = detect_provider(&credential.base_url);
        let endpoint = credential
            .usage_endpoint
            .clone()
            .or_else(|| usage_endpoint(provider, &credential.base_url))
            .ok_or_else(|| SwapwatchError::UnknownProvider {
                base_url: credential.base_url.clone(),
            })?;

        let mut request = self
            .client
            .get(&endpoint)
            .timeout(self.timeout)
            .header(AUTHORIZATION, provider.authorization_value(credential.secret()))
            .header(CONTENT_TYPE, "application/json");
        if provider == Provider::Anthropic {
            request = request.header("anthropic-version", ANTHROPIC_VERSION);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(&e, self.timeout))?;
        let status = response.status();

        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| classify_transport_error(&e, self.timeout))?;
            let mut value: Value = serde_json::from_str(&body)
                .map_err(|e| SwapwatchError::ParseResponse(e.to_string()))?;
            if provider.wraps_payload_in_data() {
                value = unwrap_data(value);
            }

            let ctx = SnapshotContext {
                profile_id: credential.profile_id.clone(),
                profile_name: credential.profile_name.clone(),
                now,
            };
            return UsagePayload::parse(provider, value).map(|payload| payload.normalize(&ctx));
        }

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(SwapwatchError::auth_failed(provider.id(), status.as_u16()));
        }

        let body = response.text().await.unwrap_or_default();
        if error_body_indicates_auth(&body) {
            return Err(SwapwatchError::auth_failed(provider.id(), status.as_u16()));
        }

        Err(SwapwatchError::HttpStatus {
            provider: provider.id().to_string(),
            status: status.as_u16(),
        })
    }
}

/// Uses a plain client; requests are still bounded by [`DEFAULT_TIMEOUT`].
impl Default for UsageFetcher {
    fn default() -> Self {
        Self::with_client(Client::new(), DEFAULT_TIMEOUT)
    }
}

/// Replace a body by its nested `data` object when there is one.
#[must_use]
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Whether a non-2xx body looks like an authentication complaint.
///
/// Bodies that are not JSON never match.
#[must_use]
pub fn error_body_indicates_auth(body: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return false;
    };
    let text = value.to_string().to_lowercase();
    AUTH_ERROR_PATTERNS.iter().any(|pattern| text.contains(pattern))
}
