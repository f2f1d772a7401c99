//! Formatting helpers for logs and CLI output.

use sha2::{Digest, Sha256};

/// Format an integer percentage.
#[must_use]
pub fn format_percent(value: u32) -> String {
    format!("{value}%")
}

/// Short, stable fingerprint of a secret for log correlation.
///
/// Credentials are never logged; this lets two log lines be matched to the
/// same token without revealing it.
#[must_use]
pub fn credential_fingerprint(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..6])
}
