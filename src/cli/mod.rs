//! CLI argument parsing and command dispatch.

pub mod args;
pub mod check;
pub mod detect;
pub mod render;
pub mod watch;

use std::sync::Arc;

pub use args::{Cli, Commands};

use crate::core::fetcher::UsageFetcher;
use crate::core::monitor::UsageMonitor;
use crate::error::Result;
use crate::storage::{AppPaths, Config, FileProfileStore, JsonApiProfileSource};
use crate::util::SystemClock;

/// Run the parsed command.
///
/// # Errors
/// Returns the command's error.
pub async fn execute(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Detect(args) => detect::execute(args, cli.json),
        Commands::Check => {
            let monitor = build_monitor(cli, None)?;
            check::execute(&monitor, cli.json).await
        }
        Commands::Watch(args) => {
            let monitor = build_monitor(cli, args.interval)?;
            watch::run_watch(&monitor, cli.json).await.map(|_| ())
        }
    }
}

/// Wire the monitor to the file-backed collaborators.
///
/// # Errors
/// Returns error if the config is invalid or the HTTP client cannot be built.
pub fn build_monitor(cli: &Cli, interval_ms: Option<u64>) -> Result<UsageMonitor> {
    let config = Config::resolve(cli.config.as_deref())?;
    let paths = cli
        .profiles_dir
        .as_deref()
        .map_or_else(AppPaths::new, AppPaths::in_dir);

    let mut settings = config.settings();
    if let Some(ms) = interval_ms {
        settings.usage_check_interval = ms;
    }
    tracing::debug!(
        profiles = ?paths.profiles_file(),
        api_profiles = ?paths.api_profiles_file(),
        swapping = settings.swapping_enabled(),
        "building usage monitor"
    );

    let store = Arc::new(FileProfileStore::new(&paths.profiles_file(), settings));
    let api_profiles = Arc::new(JsonApiProfileSource::new(&paths.api_profiles_file()));
    let fetcher = UsageFetcher::new(config.timeout())?;
    Ok(UsageMonitor::new(
        store,
        api_profiles,
        fetcher,
        Arc::new(SystemClock),
    ))
}
