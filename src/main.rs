//! swapwatch - usage monitor and credential failover
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use std::process::ExitCode;

use clap::Parser;

use swapwatch::cli::{self, Cli};
use swapwatch::core::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(cli.log_level, cli.log_format, None, cli.verbose);

    match cli::execute(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), category = %e.category(), "{e}");
            if cli.json {
                let body = serde_json::json!({
                    "error": e.to_string(),
                    "code": e.error_code(),
                    "retryable": e.is_retryable(),
                });
                eprintln!("{body}");
            } else {
                eprintln!("error [{}]: {e}", e.error_code());
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
