//! HTTP client utilities.
//!
//! Provides the shared HTTP client used by the usage fetcher.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::error::{Result, SwapwatchError};

/// Default timeout for HTTP requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(format!("swapwatch/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SwapwatchError::Network(e.to_string()))
}

/// Map a transport error onto the error taxonomy.
#[must_use]
pub fn classify_transport_error(err: &reqwest::Error, timeout: Duration) -> SwapwatchError {
    if err.is_timeout() {
        SwapwatchError::Timeout(timeout.as_secs())
    } else if err.is_decode() {
        SwapwatchError::ParseResponse(err.to_string())
    } else {
        SwapwatchError::Network(err.to_string())
    }
}
