//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::logging::{LogFormat, LogLevel};

/// Watch AI provider usage and fail over between credentials.
#[derive(Parser, Debug)]
#[command(name = "swapwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// Emit JSON instead of human-readable lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Log level
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Log format
    #[arg(long, value_enum, value_name = "FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(long, value_name = "PATH", global = true, env = "SWAPWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding profiles.toml and api-profiles.json
    #[arg(long, value_name = "DIR", global = true, env = "SWAPWATCH_PROFILES_DIR")]
    pub profiles_dir: Option<PathBuf>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll usage until interrupted, swapping profiles as configured
    Watch(WatchArgs),

    /// Run a single usage check and print the result
    Check,

    /// Show the provider and usage endpoint for a base URL
    Detect(DetectArgs),
}

/// Arguments for the `watch` command.
#[derive(Args, Debug, Default)]
pub struct WatchArgs {
    /// Poll interval in milliseconds (overrides config)
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,
}

/// Arguments for the `detect` command.
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Provider base URL, e.g. <https://api.z.ai/api/anthropic>
    pub base_url: String,
}
