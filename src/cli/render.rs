//! Plain-text and JSON rendering of snapshots and engine events.

use crate::core::events::EngineEvent;
use crate::core::models::UsageSnapshot;
use crate::error::Result;
use crate::util::format_percent;

/// One-line summary of a snapshot.
#[must_use]
pub fn render_snapshot(snapshot: &UsageSnapshot) -> String {
    let (session_label, weekly_label) = snapshot
        .usage_windows
        .as_ref()
        .map_or(("session", "weekly"), |w| {
            (w.session_label.as_str(), w.weekly_label.as_str())
        });
    format!(
        "[{}] {}: {session_label} {} (resets {}), {weekly_label} {} (resets {}), limit: {}",
        snapshot.fetched_at.format("%H:%M:%S"),
        snapshot.profile_name,
        format_percent(snapshot.session_percent),
        snapshot.session_reset_time,
        format_percent(snapshot.weekly_percent),
        snapshot.weekly_reset_time,
        snapshot.limit_type,
    )
}

/// Human-readable line for an event.
#[must_use]
pub fn render_event_human(event: &EngineEvent) -> String {
    match event {
        EngineEvent::UsageUpdated(snapshot) => render_snapshot(snapshot),
        EngineEvent::ProactiveSwapCompleted {
            from_profile,
            to_profile,
            limit_type,
            timestamp,
        } => format!(
            "[{}] swapped {from_profile} -> {to_profile} ({limit_type} limit)",
            timestamp.format("%H:%M:%S")
        ),
        EngineEvent::ProactiveSwapFailed {
            reason,
            current_profile,
            excluded_profiles,
        } => {
            let excluded = if excluded_profiles.is_empty() {
                "none".to_string()
            } else {
                excluded_profiles.join(", ")
            };
            format!(
                "swap failed: {} (current: {current_profile}, excluded: {excluded})",
                reason.as_str()
            )
        }
        EngineEvent::ShowSwapNotification {
            from_profile,
            to_profile,
            reason,
            limit_type,
        } => format!(
            "Switched from {from_profile} to {to_profile} ({}, {limit_type})",
            reason.as_str()
        ),
    }
}

/// Render an event as a human line or a JSON object.
///
/// # Errors
/// Returns error if JSON serialization fails.
pub fn render_event(event: &EngineEvent, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string(event)?)
    } else {
        Ok(render_event_human(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{SwapFailureReason, SwapTrigger};
    use crate::core::models::{LimitType, UsageWindows};
    use crate::test_utils::make_snapshot;

    #[test]
    fn snapshot_line_uses_window_labels() {
        let mut snapshot = make_snapshot("work", 72, 45);
        snapshot.usage_windows = Some(UsageWindows::new("5-hour", "7-day"));
        let line = render_snapshot(&snapshot);
        assert!(line.contains("5-hour 72%"));
        assert!(line.contains("7-day 45%"));
        assert!(line.ends_with("limit: session"));
    }

    #[test]
    fn failure_line_lists_exclusions() {
        let line = render_event_human(&EngineEvent::ProactiveSwapFailed {
            reason: SwapFailureReason::AllAlternativesFailedAuth,
            current_profile: "a".to_string(),
            excluded_profiles: vec!["a".to_string(), "b".to_string()],
        });
        assert_eq!(
            line,
            "swap failed: all_alternatives_failed_auth (current: a, excluded: a, b)"
        );
    }

    #[test]
    fn json_rendering_is_tagged() {
        let event = EngineEvent::ShowSwapNotification {
            from_profile: "Work".to_string(),
            to_profile: "Personal".to_string(),
            reason: SwapTrigger::Threshold,
            limit_type: LimitType::Weekly,
        };
        let line = render_event(&event, true).unwrap();
        assert!(line.starts_with(r#"{"event":"show-swap-notification""#));
        assert_eq!(
            render_event(&event, false).unwrap(),
            "Switched from Work to Personal (threshold, weekly)"
        );
    }
}
