//! Configuration file loading.
//!
//! Loads `config.toml` from the platform config directory (or the path in
//! `SWAPWATCH_CONFIG`, or `--config`).
//!
//! ## Precedence
//!
//! Highest first:
//! 1. Environment variables
//! 2. Config file
//! 3. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `SWAPWATCH_CONFIG`: Override config file path
//! - `SWAPWATCH_AUTO_SWITCH`: Master auto-switch switch (1, true, yes, on)
//! - `SWAPWATCH_PROACTIVE_SWAP`: Proactive swapping (1, true, yes, on)
//! - `SWAPWATCH_CHECK_INTERVAL_MS`: Poll interval in milliseconds
//! - `SWAPWATCH_SESSION_THRESHOLD`: Session threshold percent
//! - `SWAPWATCH_WEEKLY_THRESHOLD`: Weekly threshold percent

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::core::models::{AutoSwitchSettings, DEFAULT_CHECK_INTERVAL_MS};
use crate::error::{Result, SwapwatchError};

// =============================================================================
// Environment Variable Names
// =============================================================================

pub const ENV_CONFIG: &str = "SWAPWATCH_CONFIG";
pub const ENV_AUTO_SWITCH: &str = "SWAPWATCH_AUTO_SWITCH";
pub const ENV_PROACTIVE_SWAP: &str = "SWAPWATCH_PROACTIVE_SWAP";
pub const ENV_CHECK_INTERVAL_MS: &str = "SWAPWATCH_CHECK_INTERVAL_MS";
pub const ENV_SESSION_THRESHOLD: &str = "SWAPWATCH_SESSION_THRESHOLD";
pub const ENV_WEEKLY_THRESHOLD: &str = "SWAPWATCH_WEEKLY_THRESHOLD";

// =============================================================================
// Config File
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auto_switch: AutoSwitchConfig,
    pub http: HttpConfig,
}

/// `[auto_switch]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSwitchConfig {
    pub enabled: bool,
    pub proactive_swap_enabled: bool,
    pub usage_check_interval_ms: u64,
    pub session_threshold: u32,
    pub weekly_threshold: u32,
}

impl Default for AutoSwitchConfig {
    fn default() -> Self {
        let defaults = AutoSwitchSettings::default();
        Self {
            enabled: defaults.enabled,
            proactive_swap_enabled: defaults.proactive_swap_enabled,
            usage_check_interval_ms: DEFAULT_CHECK_INTERVAL_MS,
            session_threshold: defaults.session_threshold,
            weekly_threshold: defaults.weekly_threshold,
        }
    }
}

impl AutoSwitchConfig {
    #[must_use]
    pub const fn settings(&self) -> AutoSwitchSettings {
        AutoSwitchSettings {
            enabled: self.enabled,
            proactive_swap_enabled: self.proactive_swap_enabled,
            usage_check_interval: self.usage_check_interval_ms,
            session_threshold: self.session_threshold,
            weekly_threshold: self.weekly_threshold,
        }
    }
}

/// `[http]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

impl Config {
    /// Load, apply environment overrides and validate.
    ///
    /// `explicit` (from `--config`) beats `SWAPWATCH_CONFIG`, which beats the
    /// platform default.
    ///
    /// # Errors
    /// Returns error if the file exists but is invalid, or a value is out of
    /// range.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(ENV_CONFIG).ok().map(PathBuf::from))
            .unwrap_or_else(Self::config_path);

        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    /// Returns error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "loading config file");
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SwapwatchError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    /// Returns error if serialization or writing fails.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| SwapwatchError::Config(format!("failed to serialize config: {e}")))?;
        fs::write(path, content)?;
        tracing::debug!(?path, "config file saved");
        Ok(())
    }

    /// Default config file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        AppPaths::new().config_file()
    }

    /// Apply `SWAPWATCH_*` overrides read through `lookup`.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` if a variable is set but unparsable.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(value) = get(ENV_AUTO_SWITCH) {
            self.auto_switch.enabled = parse_bool(ENV_AUTO_SWITCH, &value)?;
        }
        if let Some(value) = get(ENV_PROACTIVE_SWAP) {
            self.auto_switch.proactive_swap_enabled = parse_bool(ENV_PROACTIVE_SWAP, &value)?;
        }
        if let Some(value) = get(ENV_CHECK_INTERVAL_MS) {
            self.auto_switch.usage_check_interval_ms = parse_number(ENV_CHECK_INTERVAL_MS, &value)?;
        }
        if let Some(value) = get(ENV_SESSION_THRESHOLD) {
            self.auto_switch.session_threshold = parse_number(ENV_SESSION_THRESHOLD, &value)?;
        }
        if let Some(value) = get(ENV_WEEKLY_THRESHOLD) {
            self.auto_switch.weekly_threshold = parse_number(ENV_WEEKLY_THRESHOLD, &value)?;
        }
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Checks that:
    /// - Thresholds are percentages (0-100)
    /// - Timeout is within reasonable bounds (1-300 seconds)
    ///
    /// # Errors
    /// Returns `ConfigInvalid` naming the offending key.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("auto_switch.session_threshold", self.auto_switch.session_threshold),
            ("auto_switch.weekly_threshold", self.auto_switch.weekly_threshold),
        ] {
            if value > 100 {
                return Err(SwapwatchError::ConfigInvalid {
                    key: key.to_string(),
                    value: value.to_string(),
                    message: "threshold must be between 0 and 100".to_string(),
                });
            }
        }

        let timeout = self.http.timeout_seconds;
        if timeout == 0 || timeout > 300 {
            return Err(SwapwatchError::ConfigInvalid {
                key: "http.timeout_seconds".to_string(),
                value: timeout.to_string(),
                message: "timeout must be between 1 and 300 seconds".to_string(),
            });
        }

        Ok(())
    }

    #[must_use]
    pub const fn settings(&self) -> AutoSwitchSettings {
        self.auto_switch.settings()
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SwapwatchError::ConfigInvalid {
            key: key.to_string(),
            value: value.to_string(),
            message: "expected a boolean (true/false, 1/0, yes/no, on/off)".to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| SwapwatchError::ConfigInvalid {
        key: key.to_string(),
        value: value.to_string(),
        message: "expected a non-negative integer".to_string(),
    })
}
