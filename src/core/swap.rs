//! Swap engine.
//!
//! Decides when to move off the active profile and which profile to move to.
//!
//! Two triggers:
//! - **proactive**: an OAuth profile's usage crosses a configured threshold;
//! - **reactive**: the provider rejects the active credential. The profile is
//!   put on cooldown first, so it cannot be chosen again for a while.
//!
//! Candidate selection walks the store's availability ranking and takes the
//! first profile that is neither current nor cooling down. A successful swap
//! never re-checks usage in the same cycle; the next tick evaluates the new
//! profile.

use std::sync::{Arc, Mutex, PoisonError};

use crate::core::cooldown::AuthFailureCooldown;
use crate::core::credentials::ActiveCredential;
use crate::core::events::{EngineEvent, EventBus, SwapFailureReason, SwapTrigger};
use crate::core::models::{AutoSwitchSettings, LimitType, UsageSnapshot};
use crate::core::store::ProfileStore;
use crate::error::Result;
use crate::util::Clock;

/// Which threshold, if any, the snapshot crosses. Session is checked first.
#[must_use]
pub fn evaluate_thresholds(
    snapshot: &UsageSnapshot,
    settings: &AutoSwitchSettings,
) -> Option<LimitType> {
    if snapshot.session_percent >= settings.session_threshold {
        Some(LimitType::Session)
    } else if snapshot.weekly_percent >= settings.weekly_threshold {
        Some(LimitType::Weekly)
    } else {
        None
    }
}

/// Result of one swap attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The target is now the active profile.
    Swapped { from: String, to: String },
    /// Nothing eligible; the active profile is unchanged.
    Exhausted {
        reason: SwapFailureReason,
        excluded: Vec<String>,
    },
}

impl SwapOutcome {
    #[must_use]
    pub const fn is_swapped(&self) -> bool {
        matches!(self, Self::Swapped { .. })
    }
}

/// Owns the cooldown map and performs swaps through the profile store.
pub struct SwapEngine {
    store: Arc<dyn ProfileStore>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    cooldown: Mutex<AuthFailureCooldown>,
}

impl std::fmt::Debug for SwapEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapEngine")
            .field("clock", &self.clock)
            .field("cooldown", &self.cooling_down())
            .finish_non_exhaustive()
    }
}

impl SwapEngine {
    #[must_use]
    pub fn new(store: Arc<dyn ProfileStore>, events: EventBus, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            events,
            clock,
            cooldown: Mutex::new(AuthFailureCooldown::default()),
        }
    }

    /// Whether `profile_id` is currently cooling down.
    #[must_use]
    pub fn is_cooling_down(&self, profile_id: &str) -> bool {
        let now = self.clock.now();
        self.with_cooldown_map(|cooldown| cooldown.is_excluded(profile_id, now))
    }

    /// Ids currently in the cooldown map.
    #[must_use]
    pub fn cooling_down(&self) -> Vec<String> {
        self.with_cooldown_map(|cooldown| cooldown.excluded_ids())
    }

    /// Proactive path: swap if the snapshot crosses a threshold.
    ///
    /// Returns `None` when swapping is disabled, the credential is an API key,
    /// or no threshold is crossed.
    ///
    /// # Errors
    /// Returns error if the profile store fails while swapping.
    pub async fn check_thresholds(
        &self,
        snapshot: &UsageSnapshot,
        credential: &ActiveCredential,
        settings: &AutoSwitchSettings,
    ) -> Result<Option<SwapOutcome>> {
        if !settings.swapping_enabled() || !credential.allows_proactive_swap() {
            return Ok(None);
        }
        let Some(limit_type) = evaluate_thresholds(snapshot, settings) else {
            return Ok(None);
        };

        tracing::info!(
            profile_id = %credential.profile_id,
            session_percent = snapshot.session_percent,
            weekly_percent = snapshot.weekly_percent,
            reason = %limit_type,
            "usage threshold reached, attempting proactive swap"
        );
        self.attempt_swap(&credential.profile_id, limit_type, SwapTrigger::Threshold)
            .await
            .map(Some)
    }

    /// Reactive path: put `profile_id` on cooldown and swap away from it.
    ///
    /// The cooldown entry is recorded even when swapping is disabled.
    ///
    /// # Errors
    /// Returns error if the profile store fails while swapping.
    pub async fn handle_auth_failure(
        &self,
        profile_id: &str,
        settings: &AutoSwitchSettings,
    ) -> Result<Option<SwapOutcome>> {
        let now = self.clock.now();
        self.with_cooldown_map(|cooldown| {
            cooldown.insert(profile_id, now);
            cooldown.prune_expired(now);
        });

        if !settings.swapping_enabled() {
            tracing::debug!(profile_id, "auth failure recorded, swapping disabled");
            return Ok(None);
        }

        tracing::warn!(profile_id, "authentication failed, attempting reactive swap");
        self.attempt_swap(profile_id, LimitType::Session, SwapTrigger::AuthFailure)
            .await
            .map(Some)
    }

    /// Select the best eligible alternative and make it active.
    ///
    /// # Errors
    /// Returns error if the ranking cannot be read or the target cannot be
    /// activated. No event is emitted in that case.
    pub async fn attempt_swap(
        &self,
        current_id: &str,
        limit_type: LimitType,
        trigger: SwapTrigger,
    ) -> Result<SwapOutcome> {
        let now = self.clock.now();
        let excluded = self.with_cooldown_map(|cooldown| {
            let pruned = cooldown.prune_expired(now);
            if pruned > 0 {
                tracing::debug!(pruned, "expired cooldown entries removed");
            }
            cooldown.excluded_ids()
        });

        // When an API profile is failing, the active OAuth profile is not an
        // alternative to itself.
        let active_id = self.active_profile_id().await;
        let ranked = self.store.profiles_by_availability().await?;
        let Some(target) = ranked.into_iter().find(|p| {
            p.has_oauth_token
                && p.id != current_id
                && active_id.as_deref() != Some(p.id.as_str())
                && !excluded.contains(&p.id)
        }) else {
            let reason = if excluded.is_empty() {
                SwapFailureReason::NoAlternative
            } else {
                SwapFailureReason::AllAlternativesFailedAuth
            };
            tracing::warn!(
                current_profile = current_id,
                reason = reason.as_str(),
                excluded = ?excluded,
                "no eligible profile to swap to"
            );
            self.events.emit(EngineEvent::ProactiveSwapFailed {
                reason,
                current_profile: current_id.to_string(),
                excluded_profiles: excluded.clone(),
            });
            return Ok(SwapOutcome::Exhausted { reason, excluded });
        };

        self.store.set_active_profile(&target.id).await?;
        tracing::info!(
            from = current_id,
            to = %target.id,
            reason = %limit_type,
            trigger = trigger.as_str(),
            "swapped active profile"
        );

        let from_name = self.display_name(current_id).await;
        self.events.emit(EngineEvent::ProactiveSwapCompleted {
            from_profile: current_id.to_string(),
            to_profile: target.id.clone(),
            limit_type,
            timestamp: now,
        });
        self.events.emit(EngineEvent::ShowSwapNotification {
            from_profile: from_name,
            to_profile: target.name.clone(),
            reason: trigger,
            limit_type,
        });

        Ok(SwapOutcome::Swapped {
            from: current_id.to_string(),
            to: target.id,
        })
    }

    async fn active_profile_id(&self) -> Option<String> {
        match self.store.active_profile().await {
            Ok(profile) => profile.map(|p| p.id),
            Err(e) => {
                tracing::debug!(error = %e, "active profile lookup failed");
                None
            }
        }
    }

    async fn display_name(&self, profile_id: &str) -> String {
        match self.store.profile(profile_id).await {
            Ok(Some(profile)) => profile.name,
            Ok(None) => profile_id.to_string(),
            Err(e) => {
                tracing::debug!(profile_id, error = %e, "profile lookup failed");
                profile_id.to_string()
            }
        }
    }

    fn with_cooldown_map<T>(&self, f: impl FnOnce(&mut AuthFailureCooldown) -> T) -> T {
        let mut guard = self.cooldown.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::CredentialKind;
    use crate::core::models::Profile;
    use crate::test_utils::{InMemoryProfileStore, ManualClock, make_snapshot};
    use chrono::TimeDelta;
    use tokio::sync::broadcast::error::TryRecvError;

    fn enabled() -> AutoSwitchSettings {
        AutoSwitchSettings {
            enabled: true,
            proactive_swap_enabled: true,
            ..AutoSwitchSettings::default()
        }
    }

    fn oauth(id: &str) -> ActiveCredential {
        ActiveCredential::new(id, id, CredentialKind::OAuth, "https://api.anthropic.com", "t")
    }

    fn engine(store: &Arc<InMemoryProfileStore>, clock: &Arc<ManualClock>) -> (SwapEngine, EventBus) {
        let events = EventBus::default();
        let engine = SwapEngine::new(store.clone(), events.clone(), clock.clone());
        (engine, events)
    }

    fn three_profiles() -> Arc<InMemoryProfileStore> {
        Arc::new(
            InMemoryProfileStore::new()
                .with_profile(Profile::new("work", "Work"), Some("tok-work"))
                .with_profile(Profile::new("personal", "Personal"), Some("tok-personal"))
                .with_profile(Profile::new("spare", "Spare"), Some("tok-spare"))
                .with_active("work"),
        )
    }

    #[test]
    fn thresholds_are_inclusive_and_session_wins() {
        let settings = enabled();
        assert_eq!(evaluate_thresholds(&make_snapshot("a", 94, 98), &settings), None);
        assert_eq!(
            evaluate_thresholds(&make_snapshot("a", 95, 10), &settings),
            Some(LimitType::Session)
        );
        assert_eq!(
            evaluate_thresholds(&make_snapshot("a", 10, 99), &settings),
            Some(LimitType::Weekly)
        );
        assert_eq!(
            evaluate_thresholds(&make_snapshot("a", 100, 100), &settings),
            Some(LimitType::Session)
        );
    }

    #[tokio::test]
    async fn proactive_swap_picks_highest_ranked_alternative() {
        let store = three_profiles();
        let clock = Arc::new(ManualClock::default());
        let (engine, events) = engine(&store, &clock);
        let mut rx = events.subscribe();

        let outcome = engine
            .check_thresholds(&make_snapshot("work", 96, 20), &oauth("work"), &enabled())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Some(SwapOutcome::Swapped {
                from: "work".to_string(),
                to: "personal".to_string()
            })
        );
        assert_eq!(store.active_id().as_deref(), Some("personal"));

        match rx.try_recv().unwrap() {
            EngineEvent::ProactiveSwapCompleted {
                from_profile,
                to_profile,
                limit_type,
                timestamp,
            } => {
                assert_eq!(from_profile, "work");
                assert_eq!(to_profile, "personal");
                assert_eq!(limit_type, LimitType::Session);
                assert_eq!(timestamp, clock.now());
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::ShowSwapNotification {
                from_profile: "Work".to_string(),
                to_profile: "Personal".to_string(),
                reason: SwapTrigger::Threshold,
                limit_type: LimitType::Session,
            }
        );
    }

    #[tokio::test]
    async fn no_alternative_leaves_active_unchanged_with_one_failure_event() {
        let store = Arc::new(
            InMemoryProfileStore::new()
                .with_profile(Profile::new("only", "Only"), Some("tok"))
                .with_active("only"),
        );
        let clock = Arc::new(ManualClock::default());
        let (engine, events) = engine(&store, &clock);
        let mut rx = events.subscribe();

        let outcome = engine
            .check_thresholds(&make_snapshot("only", 99, 99), &oauth("only"), &enabled())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Some(SwapOutcome::Exhausted {
                reason: SwapFailureReason::NoAlternative,
                excluded: vec![],
            })
        );
        assert_eq!(store.active_id().as_deref(), Some("only"));
        assert_eq!(store.set_active_calls(), 0);
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::ProactiveSwapFailed {
                reason: SwapFailureReason::NoAlternative,
                current_profile: "only".to_string(),
                excluded_profiles: vec![],
            }
        );
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn api_key_credentials_skip_proactive_swap() {
        let store = three_profiles();
        let clock = Arc::new(ManualClock::default());
        let (engine, _events) = engine(&store, &clock);
        let api = ActiveCredential::new("work", "Work", CredentialKind::ApiKey, "https://api.z.ai", "k");

        let outcome = engine
            .check_thresholds(&make_snapshot("work", 100, 100), &api, &enabled())
            .await
            .unwrap();
        assert_eq!(outcome, None);
        assert_eq!(store.active_id().as_deref(), Some("work"));
    }

    #[tokio::test]
    async fn disabled_settings_skip_proactive_swap() {
        let store = three_profiles();
        let clock = Arc::new(ManualClock::default());
        let (engine, _events) = engine(&store, &clock);
        let settings = AutoSwitchSettings {
            enabled: true,
            ..AutoSwitchSettings::default()
        };

        let outcome = engine
            .check_thresholds(&make_snapshot("work", 100, 100), &oauth("work"), &settings)
            .await
            .unwrap();
        assert_eq!(outcome, None);
    }

    #[tokio::test]
    async fn auth_failure_cools_down_and_swaps() {
        let store = three_profiles();
        let clock = Arc::new(ManualClock::default());
        let (engine, events) = engine(&store, &clock);
        let mut rx = events.subscribe();

        let outcome = engine.handle_auth_failure("work", &enabled()).await.unwrap();
        assert_eq!(
            outcome,
            Some(SwapOutcome::Swapped {
                from: "work".to_string(),
                to: "personal".to_string()
            })
        );
        assert!(engine.is_cooling_down("work"));

        let _completed = rx.try_recv().unwrap();
        match rx.try_recv().unwrap() {
            EngineEvent::ShowSwapNotification { reason, limit_type, .. } => {
                assert_eq!(reason, SwapTrigger::AuthFailure);
                assert_eq!(limit_type, LimitType::Session);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn failing_api_profile_never_targets_the_active_oauth_profile() {
        let store = three_profiles();
        let clock = Arc::new(ManualClock::default());
        let (engine, _events) = engine(&store, &clock);

        let outcome = engine.handle_auth_failure("glm", &enabled()).await.unwrap();
        assert_eq!(
            outcome,
            Some(SwapOutcome::Swapped {
                from: "glm".to_string(),
                to: "personal".to_string()
            })
        );
        assert_eq!(store.set_active_calls(), 1);
    }

    #[tokio::test]
    async fn profiles_without_a_token_are_not_swap_targets() {
        let store = Arc::new(
            InMemoryProfileStore::new()
                .with_profile(Profile::new("work", "Work"), Some("tok-work"))
                .with_profile(Profile::new("empty", "Empty"), None)
                .with_profile(Profile::new("spare", "Spare"), Some("tok-spare"))
                .with_active("work"),
        );
        let clock = Arc::new(ManualClock::default());
        let (engine, _events) = engine(&store, &clock);

        let outcome = engine.handle_auth_failure("work", &enabled()).await.unwrap();
        assert_eq!(
            outcome,
            Some(SwapOutcome::Swapped {
                from: "work".to_string(),
                to: "spare".to_string()
            })
        );
    }

    #[tokio::test]
    async fn cooled_down_profiles_are_skipped_until_expiry() {
        let store = three_profiles();
        let clock = Arc::new(ManualClock::default());
        let (engine, _events) = engine(&store, &clock);

        engine.handle_auth_failure("work", &enabled()).await.unwrap();
        assert_eq!(store.active_id().as_deref(), Some("personal"));

        clock.advance(TimeDelta::minutes(1));
        engine.handle_auth_failure("personal", &enabled()).await.unwrap();
        assert_eq!(store.active_id().as_deref(), Some("spare"));

        clock.advance(TimeDelta::minutes(1));
        let outcome = engine.handle_auth_failure("spare", &enabled()).await.unwrap();
        assert_eq!(
            outcome,
            Some(SwapOutcome::Exhausted {
                reason: SwapFailureReason::AllAlternativesFailedAuth,
                excluded: vec!["personal".to_string(), "spare".to_string(), "work".to_string()],
            })
        );
        assert_eq!(store.active_id().as_deref(), Some("spare"));

        // "work" failed at T; it is eligible again once T + 5min has passed.
        clock.advance(TimeDelta::minutes(3) + TimeDelta::seconds(1));
        let outcome = engine
            .attempt_swap("spare", LimitType::Session, SwapTrigger::Threshold)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SwapOutcome::Swapped {
                from: "spare".to_string(),
                to: "work".to_string()
            }
        );
    }

    #[tokio::test]
    async fn auth_failure_with_swapping_disabled_only_records_cooldown() {
        let store = three_profiles();
        let clock = Arc::new(ManualClock::default());
        let (engine, _events) = engine(&store, &clock);

        let outcome = engine
            .handle_auth_failure("work", &AutoSwitchSettings::default())
            .await
            .unwrap();
        assert_eq!(outcome, None);
        assert_eq!(engine.cooling_down(), vec!["work".to_string()]);
        assert_eq!(store.active_id().as_deref(), Some("work"));
    }

    #[tokio::test]
    async fn set_active_failure_emits_nothing() {
        let store = Arc::new(
            InMemoryProfileStore::new()
                .with_profile(Profile::new("work", "Work"), Some("a"))
                .with_profile(Profile::new("personal", "Personal"), Some("b"))
                .with_active("work")
                .failing_set_active(),
        );
        let clock = Arc::new(ManualClock::default());
        let (engine, events) = engine(&store, &clock);
        let mut rx = events.subscribe();

        let result = engine
            .attempt_swap("work", LimitType::Weekly, SwapTrigger::Threshold)
            .await;
        assert!(result.is_err());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(store.active_id().as_deref(), Some("work"));
    }
}
