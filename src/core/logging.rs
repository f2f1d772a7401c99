//! Structured logging setup.
//!
//! Everything in the crate logs through `tracing`. The binary installs one
//! `tracing-subscriber` fmt subscriber here; library users install their own.
//!
//! Precedence for each setting: explicit CLI flag, then `SWAPWATCH_LOG*`
//! environment variables, then defaults.

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_LEVEL_ENV: &str = "SWAPWATCH_LOG";
pub const LOG_FORMAT_ENV: &str = "SWAPWATCH_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "SWAPWATCH_LOG_FILE";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable logs.
    #[default]
    Human,
    /// JSON logs (one event per line).
    Json,
    /// Compact logs (single line, terse).
    Compact,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" | "pretty" => Some(Self::Human),
            "json" | "jsonl" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "verbose" | "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Fully resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Level from `SWAPWATCH_LOG`.
#[must_use]
pub fn parse_log_level_from_env() -> Option<LogLevel> {
    non_empty_env(LOG_LEVEL_ENV).and_then(|value| LogLevel::from_arg(&value))
}

/// Format from `SWAPWATCH_LOG_FORMAT`.
#[must_use]
pub fn parse_log_format_from_env() -> Option<LogFormat> {
    non_empty_env(LOG_FORMAT_ENV).and_then(|value| LogFormat::from_arg(&value))
}

/// File from `SWAPWATCH_LOG_FILE`.
#[must_use]
pub fn parse_log_file_from_env() -> Option<PathBuf> {
    non_empty_env(LOG_FILE_ENV).map(PathBuf::from)
}

/// Merge CLI flags with the environment.
///
/// `verbose` raises the default level to `debug` but never overrides an
/// explicit level.
#[must_use]
pub fn resolve_settings(
    level: Option<LogLevel>,
    format: Option<LogFormat>,
    file: Option<PathBuf>,
    verbose: bool,
) -> LogSettings {
    let level = level
        .or_else(parse_log_level_from_env)
        .unwrap_or(if verbose { LogLevel::Debug } else { LogLevel::Warn });
    LogSettings {
        level,
        format: format.or_else(parse_log_format_from_env).unwrap_or_default(),
        file: file.or_else(parse_log_file_from_env),
    }
}

/// Filter directive scoping the level to this crate.
#[must_use]
pub fn filter_directive(level: LogLevel) -> String {
    format!("swapwatch={}", level.as_filter())
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(level: Option<LogLevel>, format: Option<LogFormat>, file: Option<PathBuf>, verbose: bool) {
    let settings = resolve_settings(level, format, file, verbose);

    let file = settings.file.as_ref().and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| eprintln!("warning: cannot open log file {}: {e}", path.display()))
            .ok()
    });
    let writer = match file {
        Some(file) => BoxMakeWriter::new(file),
        None => BoxMakeWriter::new(std::io::stderr),
    };
    let filter = EnvFilter::new(filter_directive(settings.level));

    let installed = match settings.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(writer)
            .with_span_events(FmtSpan::CLOSE)
            .try_init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_writer(writer)
            .with_target(true)
            .try_init(),
        LogFormat::Human => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(false)
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(
            level = settings.level.as_filter(),
            format = ?settings.format,
            "logging initialized"
        );
    }
}
