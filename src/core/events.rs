//! Typed engine events.
//!
//! The UI layer subscribes to an [`EventBus`] and receives [`EngineEvent`]s.
//! There are exactly four variants; the serialized `event` tag matches the
//! kebab-case names UI consumers listen for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::core::models::{LimitType, UsageSnapshot};

/// Default channel capacity. Slow subscribers lag rather than block the engine.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Why a swap could not find a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapFailureReason {
    /// No other profile was eligible.
    NoAlternative,
    /// Every other profile is cooling down after an auth failure.
    AllAlternativesFailedAuth,
}

impl SwapFailureReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoAlternative => "no_alternative",
            Self::AllAlternativesFailedAuth => "all_alternatives_failed_auth",
        }
    }
}

/// Why a swap happened, for the user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapTrigger {
    /// A usage threshold was crossed.
    Threshold,
    /// The provider rejected the active credential.
    AuthFailure,
}

impl SwapTrigger {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::AuthFailure => "auth_failure",
        }
    }
}

/// Everything the engine tells the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum EngineEvent {
    /// Emitted on every successful poll.
    UsageUpdated(UsageSnapshot),
    #[serde(rename_all = "camelCase")]
    ProactiveSwapCompleted {
        from_profile: String,
        to_profile: String,
        limit_type: LimitType,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    ProactiveSwapFailed {
        reason: SwapFailureReason,
        current_profile: String,
        excluded_profiles: Vec<String>,
    },
    /// Carries display names rather than ids.
    #[serde(rename_all = "camelCase")]
    ShowSwapNotification {
        from_profile: String,
        to_profile: String,
        reason: SwapTrigger,
        limit_type: LimitType,
    },
}

impl EngineEvent {
    /// The wire name of this event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UsageUpdated(_) => "usage-updated",
            Self::ProactiveSwapCompleted { .. } => "proactive-swap-completed",
            Self::ProactiveSwapFailed { .. } => "proactive-swap-failed",
            Self::ShowSwapNotification { .. } => "show-swap-notification",
        }
    }
}

/// Broadcast channel for [`EngineEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Emit an event. Having no subscribers is not an error.
    pub fn emit(&self, event: EngineEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => tracing::trace!(event = name, receivers, "event emitted"),
            Err(_) => tracing::trace!(event = name, "event dropped, no subscribers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn serializes_with_kebab_case_tag() {
        let event = EngineEvent::ProactiveSwapFailed {
            reason: SwapFailureReason::NoAlternative,
            current_profile: "work".to_string(),
            excluded_profiles: vec![],
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "proactive-swap-failed",
                "payload": {
                    "reason": "no_alternative",
                    "currentProfile": "work",
                    "excludedProfiles": []
                }
            })
        );
    }

    #[test]
    fn swap_completed_payload_uses_camel_case() {
        let event = EngineEvent::ProactiveSwapCompleted {
            from_profile: "a".to_string(),
            to_profile: "b".to_string(),
            limit_type: LimitType::Weekly,
            timestamp: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "proactive-swap-completed");
        assert_eq!(value["payload"]["fromProfile"], "a");
        assert_eq!(value["payload"]["limitType"], "weekly");
        assert_eq!(event.name(), "proactive-swap-completed");
    }

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.emit(EngineEvent::ShowSwapNotification {
            from_profile: "Work".to_string(),
            to_profile: "Personal".to_string(),
            reason: SwapTrigger::AuthFailure,
            limit_type: LimitType::Session,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "show-swap-notification");
    }

    #[test]
    fn emit_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.emit(EngineEvent::ProactiveSwapFailed {
            reason: SwapFailureReason::AllAlternativesFailedAuth,
            current_profile: "x".to_string(),
            excluded_profiles: vec!["y".to_string()],
        });
        let mut late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }
}
