//! Provider response normalizers.
//!
//! A raw JSON body is validated once at the boundary into a [`UsagePayload`]
//! variant keyed by provider, then normalized into a [`UsageSnapshot`]. Each
//! normalizer tolerates missing or non-numeric fields (they count as zero) but
//! rejects bodies whose overall shape is wrong.

pub mod anthropic;
pub mod generic;
pub mod zai;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::core::models::UsageSnapshot;
use crate::core::provider::Provider;
use crate::error::{Result, SwapwatchError};

pub use anthropic::AnthropicUsage;
pub use generic::{FIELD_CANDIDATES, GenericUsage, Quantity};
pub use zai::{QuotaLimit, QuotaResponse};

/// Identity and capture time stamped onto every snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotContext {
    pub profile_id: String,
    pub profile_name: String,
    pub now: DateTime<Utc>,
}

/// A provider body that passed shape validation.
#[derive(Debug, Clone, PartialEq)]
pub enum UsagePayload {
    Anthropic(AnthropicUsage),
    /// z.ai and ZHIPU share one quota shape.
    Quota(Provider, QuotaResponse),
    Generic(GenericUsage),
}

impl UsagePayload {
    /// Validate a (possibly `data`-unwrapped) body for a provider.
    ///
    /// # Errors
    /// Returns [`SwapwatchError::MalformedResponse`] when the body does not
    /// have the provider's shape, e.g. a quota body without a `limits` array.
    pub fn parse(provider: Provider, body: Value) -> Result<Self> {
        let malformed = |reason: String| SwapwatchError::MalformedResponse {
            provider: provider.id().to_string(),
            reason,
        };

        if !body.is_object() {
            return Err(malformed("body is not a JSON object".to_string()));
        }

        match provider {
            Provider::Anthropic => serde_json::from_value(body)
                .map(Self::Anthropic)
                .map_err(|e| malformed(e.to_string())),
            Provider::Zai | Provider::Zhipu => {
                if !body.get("limits").is_some_and(Value::is_array) {
                    return Err(malformed("missing limits array".to_string()));
                }
                serde_json::from_value(body)
                    .map(|quota| Self::Quota(provider, quota))
                    .map_err(|e| malformed(e.to_string()))
            }
            Provider::Unknown => Ok(Self::Generic(GenericUsage::from_value(body))),
        }
    }

    /// Convert into the canonical snapshot.
    #[must_use]
    pub fn normalize(&self, ctx: &SnapshotContext) -> UsageSnapshot {
        match self {
            Self::Anthropic(usage) => usage.normalize(ctx),
            Self::Quota(_, quota) => quota.normalize(ctx),
            Self::Generic(usage) => usage.normalize(ctx),
        }
    }
}

// =============================================================================
// Lenient field deserializers
// =============================================================================

/// Read a number, accepting numeric strings; anything else is `None`.
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// Read a string; anything else is `None`.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

pub(crate) fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}
