//! `swapwatch watch`: run the monitor until Ctrl+C.
//!
//! Prints every engine event as it arrives.

use tokio::sync::broadcast::error::RecvError;

use crate::cli::render::render_event;
use crate::core::events::EngineEvent;
use crate::core::monitor::UsageMonitor;
use crate::error::Result;

/// Counters shown when watch mode exits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WatchStats {
    pub updates: u64,
    pub swaps: u64,
    pub swap_failures: u64,
    pub lagged: u64,
}

impl WatchStats {
    fn record(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::UsageUpdated(_) => self.updates += 1,
            EngineEvent::ProactiveSwapCompleted { .. } => self.swaps += 1,
            EngineEvent::ProactiveSwapFailed { .. } => self.swap_failures += 1,
            EngineEvent::ShowSwapNotification { .. } => {}
        }
    }
}

/// Start the monitor and print events until interrupted.
///
/// # Errors
/// Returns an error if an event cannot be rendered.
pub async fn run_watch(monitor: &UsageMonitor, json: bool) -> Result<WatchStats> {
    let mut events = monitor.subscribe();
    let mut stats = WatchStats::default();

    // Ctrl+C handler for clean shutdown.
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(());
    });

    monitor.start();

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    stats.record(&event);
                    println!("{}", render_event(&event, json)?);
                }
                Err(RecvError::Lagged(skipped)) => {
                    stats.lagged += skipped;
                    tracing::warn!(skipped, "event output fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut shutdown_rx => break,
        }
    }

    monitor.stop();
    tracing::info!(
        updates = stats.updates,
        swaps = stats.swaps,
        swap_failures = stats.swap_failures,
        "watch finished"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::SwapFailureReason;
    use crate::test_utils::make_snapshot;

    #[test]
    fn stats_count_event_kinds() {
        let mut stats = WatchStats::default();
        stats.record(&EngineEvent::UsageUpdated(make_snapshot("a", 1, 1)));
        stats.record(&EngineEvent::UsageUpdated(make_snapshot("a", 2, 1)));
        stats.record(&EngineEvent::ProactiveSwapFailed {
            reason: SwapFailureReason::NoAlternative,
            current_profile: "a".to_string(),
            excluded_profiles: vec![],
        });
        assert_eq!(
            stats,
            WatchStats {
                updates: 2,
                swaps: 0,
                swap_failures: 1,
                lagged: 0
            }
        );
    }
}
