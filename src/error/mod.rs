//! Error types for swapwatch.
//!
//! Uses `thiserror` for structured error types.
//!
//! ## Error Taxonomy
//!
//! Errors are grouped into categories that drive how the monitor reacts:
//! - **Authentication**: the provider rejected the credential (401/403 or an
//!   auth-looking error body). The only category that triggers a reactive swap.
//! - **Network**: connection, timeout, or DNS issues. Soft failure.
//! - **Provider**: unexpected status codes, unparsable or malformed payloads,
//!   and unknown providers. Soft failure.
//! - **Configuration**: config file parsing or invalid values.
//! - **Storage**: the profile store or API profile file could not be used.
//! - **Internal**: I/O, JSON, and unclassified errors.
//!
//! Each error has a stable error code (e.g., `SW-A001`) for programmatic handling.

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The provider rejected the credential.
    Authentication,
    /// Network issues (timeout, DNS, connection refused).
    Network,
    /// Configuration issues (parse errors, invalid values).
    Configuration,
    /// Provider-side issues (bad status, bad payload, unknown provider).
    Provider,
    /// Profile store or profile file issues.
    Storage,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Authentication => "Authentication error",
            Self::Network => "Network error",
            Self::Configuration => "Configuration error",
            Self::Provider => "Provider error",
            Self::Storage => "Storage error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Authentication => "A",
            Self::Network => "N",
            Self::Configuration => "C",
            Self::Provider => "P",
            Self::Storage => "S",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Process exit codes for the `swapwatch` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// The provider rejected the credential
    AuthFailure = 2,
    /// Invalid config, profiles file or response shape
    ConfigError = 3,
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for swapwatch operations.
#[derive(Error, Debug)]
pub enum SwapwatchError {
    // ==========================================================================
    // Authentication errors (Category: Authentication)
    // ==========================================================================
    /// The provider rejected the credential.
    ///
    /// Raised for 401/403 and for other error statuses whose body looks like
    /// an authentication complaint. `status` is the original HTTP status.
    #[error("authentication failed for {provider} (HTTP {status})")]
    AuthFailed { provider: String, status: u16 },

    // ==========================================================================
    // Network errors (Category: Network)
    // ==========================================================================
    /// Request timeout.
    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    /// Generic network error.
    #[error("network error: {0}")]
    Network(String),

    // ==========================================================================
    // Provider errors (Category: Provider)
    // ==========================================================================
    /// Non-success status that does not look like an auth failure.
    #[error("{provider} returned HTTP {status}")]
    HttpStatus { provider: String, status: u16 },

    /// Failed to parse provider response as JSON.
    #[error("failed to parse response: {0}")]
    ParseResponse(String),

    /// Response parsed but its shape is not what the provider promises.
    #[error("malformed {provider} response: {reason}")]
    MalformedResponse { provider: String, reason: String },

    /// No usage endpoint can be resolved for the base URL.
    #[error("no usage endpoint for base URL {base_url}")]
    UnknownProvider { base_url: String },

    // ==========================================================================
    // Storage errors (Category: Storage)
    // ==========================================================================
    /// The profile store failed.
    #[error("profile store error: {0}")]
    ProfileStore(String),

    /// Referenced profile does not exist.
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error parsing a configuration or profiles file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    // ==========================================================================
    // Internal errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SwapwatchError {
    /// Build an authentication failure for a provider and status code.
    #[must_use]
    pub fn auth_failed(provider: impl Into<String>, status: u16) -> Self {
        Self::AuthFailed {
            provider: provider.into(),
            status,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthFailed { .. } => ErrorCategory::Authentication,

            Self::Timeout(_) | Self::Network(_) => ErrorCategory::Network,

            Self::HttpStatus { .. }
            | Self::ParseResponse(_)
            | Self::MalformedResponse { .. }
            | Self::UnknownProvider { .. } => ErrorCategory::Provider,

            Self::ProfileStore(_) | Self::ProfileNotFound(_) => ErrorCategory::Storage,

            Self::Config(_) | Self::ConfigParse { .. } | Self::ConfigInvalid { .. } => {
                ErrorCategory::Configuration
            }

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `SW-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AuthFailed { .. } => "SW-A001",

            Self::Timeout(_) => "SW-N001",
            Self::Network(_) => "SW-N099",

            Self::HttpStatus { .. } => "SW-P001",
            Self::ParseResponse(_) => "SW-P002",
            Self::MalformedResponse { .. } => "SW-P003",
            Self::UnknownProvider { .. } => "SW-P004",

            Self::ProfileStore(_) => "SW-S001",
            Self::ProfileNotFound(_) => "SW-S002",

            Self::ConfigParse { .. } => "SW-C001",
            Self::ConfigInvalid { .. } => "SW-C002",
            Self::Config(_) => "SW-C003",

            Self::Io(_) => "SW-X001",
            Self::Json(_) => "SW-X002",
            Self::Other(_) => "SW-X099",
        }
    }

    /// Whether this error should trigger the reactive swap path.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthFailed { .. })
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::AuthFailed { status, .. } | Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns whether the error is potentially recoverable by retrying on
    /// the next poll.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Network(_) | Self::HttpStatus { .. }
        )
    }

    /// Returns the provider name if this error is provider-specific.
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::AuthFailed { provider, .. }
            | Self::HttpStatus { provider, .. }
            | Self::MalformedResponse { provider, .. } => Some(provider),
            _ => None,
        }
    }
}

impl SwapwatchError {
    /// Exit code the binary reports for this error.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::AuthFailed { .. } => ExitCode::AuthFailure,
            Self::Config(_)
            | Self::ConfigParse { .. }
            | Self::ConfigInvalid { .. }
            | Self::ProfileNotFound(_)
            | Self::MalformedResponse { .. } => ExitCode::ConfigError,
            Self::Timeout(_) => ExitCode::Timeout,
            _ => ExitCode::GeneralError,
        }
    }
}

/// Result type alias for swapwatch operations.
pub type Result<T> = std::result::Result<T, SwapwatchError>;
