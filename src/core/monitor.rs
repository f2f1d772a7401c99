//! Usage monitor: the engine's single entry point.
//!
//! One long-lived [`UsageMonitor`] per process. It owns the poll timer, the
//! last snapshot, the "checking" flag and (through [`SwapEngine`]) the
//! cooldown map. Handles are cheap clones of the same engine.
//!
//! A cycle is: resolve credential → fetch once → publish snapshot → maybe
//! swap. At most one cycle runs at a time; a tick or manual check that
//! arrives while another cycle is in flight returns immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::core::credentials::{cli_usage_fallback, resolve_credential};
use crate::core::events::{EngineEvent, EventBus};
use crate::core::fetcher::{FetchOutcome, UsageFetcher};
use crate::core::models::UsageSnapshot;
use crate::core::store::{ApiProfileSource, ProfileStore};
use crate::core::swap::{SwapEngine, SwapOutcome};
use crate::error::SwapwatchError;
use crate::util::Clock;

/// What one call to [`UsageMonitor::check_usage`] did.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Another cycle was in flight; nothing was done.
    AlreadyRunning,
    /// No credential and the CLI fallback had no data.
    NoCredential,
    /// A snapshot was captured, possibly followed by a proactive swap.
    Fetched {
        snapshot: UsageSnapshot,
        swap: Option<SwapOutcome>,
    },
    /// The provider rejected the credential.
    AuthFailure {
        profile_id: String,
        error: SwapwatchError,
        swap: Option<SwapOutcome>,
    },
    /// Soft failure; no snapshot this cycle.
    Unavailable(SwapwatchError),
}

impl CycleOutcome {
    #[must_use]
    pub const fn snapshot(&self) -> Option<&UsageSnapshot> {
        match self {
            Self::Fetched { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    #[must_use]
    pub const fn swap(&self) -> Option<&SwapOutcome> {
        match self {
            Self::Fetched { swap, .. } | Self::AuthFailure { swap, .. } => swap.as_ref(),
            _ => None,
        }
    }
}

struct MonitorInner {
    store: Arc<dyn ProfileStore>,
    api_profiles: Arc<dyn ApiProfileSource>,
    fetcher: UsageFetcher,
    clock: Arc<dyn Clock>,
    events: EventBus,
    swap: SwapEngine,
    current: RwLock<Option<UsageSnapshot>>,
    checking: AtomicBool,
    timer: Mutex<Option<JoinHandle<()>>>,
}

/// Polls usage for the active credential and swaps profiles when needed.
#[derive(Clone)]
pub struct UsageMonitor {
    inner: Arc<MonitorInner>,
}

impl std::fmt::Debug for UsageMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageMonitor")
            .field("running", &self.is_running())
            .field("checking", &self.inner.checking.load(Ordering::Acquire))
            .field("swap", &self.inner.swap)
            .finish_non_exhaustive()
    }
}

impl UsageMonitor {
    #[must_use]
    pub fn new(
        store: Arc<dyn ProfileStore>,
        api_profiles: Arc<dyn ApiProfileSource>,
        fetcher: UsageFetcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let events = EventBus::default();
        let swap = SwapEngine::new(Arc::clone(&store), events.clone(), Arc::clone(&clock));
        Self {
            inner: Arc::new(MonitorInner {
                store,
                api_profiles,
                fetcher,
                clock,
                events,
                swap,
                current: RwLock::new(None),
                checking: AtomicBool::new(false),
                timer: Mutex::new(None),
            }),
        }
    }

    // ===== Scheduling =====

    /// Run one check now, then one every `usage_check_interval`.
    ///
    /// Does nothing (beyond a warning) if already running. The interval is
    /// read once, here. Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut timer = self.inner.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            tracing::warn!("usage monitor already running");
            return;
        }

        let period = self.inner.store.auto_switch_settings().check_interval();
        let weak = Arc::downgrade(&self.inner);
        *timer = Some(tokio::spawn(run_timer(weak, period)));

        tracing::info!(
            interval_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            "usage monitor started"
        );
    }

    /// Cancel future ticks. A cycle already in flight runs to completion.
    pub fn stop(&self) {
        let handle = self
            .inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::info!("usage monitor stopped");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // ===== State =====

    /// The last successfully captured snapshot.
    #[must_use]
    pub fn current_usage(&self) -> Option<UsageSnapshot> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receive engine events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.events.subscribe()
    }

    #[must_use]
    pub fn swap_engine(&self) -> &SwapEngine {
        &self.inner.swap
    }

    /// Whether a cycle is in flight.
    #[must_use]
    pub fn is_checking(&self) -> bool {
        self.inner.checking.load(Ordering::Acquire)
    }

    // ===== Cycle =====

    /// Run one poll cycle unless one is already in flight.
    pub async fn check_usage(&self) -> CycleOutcome {
        let Some(_guard) = CheckingGuard::acquire(&self.inner.checking) else {
            tracing::debug!("usage check already in progress, skipping");
            return CycleOutcome::AlreadyRunning;
        };
        self.run_cycle().await
    }

    /// Manual trigger; same serialization as timer ticks.
    pub async fn check_now(&self) -> CycleOutcome {
        self.check_usage().await
    }

    async fn run_cycle(&self) -> CycleOutcome {
        let inner = &self.inner;
        let settings = inner.store.auto_switch_settings();

        let Some(credential) =
            resolve_credential(inner.api_profiles.as_ref(), inner.store.as_ref()).await
        else {
            return match cli_usage_fallback().await {
                Some(snapshot) => {
                    self.publish(&snapshot);
                    CycleOutcome::Fetched {
                        snapshot,
                        swap: None,
                    }
                }
                None => CycleOutcome::NoCredential,
            };
        };

        match inner.fetcher.fetch(&credential, inner.clock.now()).await {
            FetchOutcome::Fetched(snapshot) => {
                tracing::debug!(
                    profile_id = %snapshot.profile_id,
                    session_percent = snapshot.session_percent,
                    weekly_percent = snapshot.weekly_percent,
                    limit_type = %snapshot.limit_type,
                    "usage updated"
                );
                self.publish(&snapshot);

                let swap = inner
                    .swap
                    .check_thresholds(&snapshot, &credential, &settings)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, code = e.error_code(), "proactive swap failed");
                        None
                    });
                CycleOutcome::Fetched { snapshot, swap }
            }
            FetchOutcome::AuthFailure(error) => {
                let swap = inner
                    .swap
                    .handle_auth_failure(&credential.profile_id, &settings)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, code = e.error_code(), "reactive swap failed");
                        None
                    });
                CycleOutcome::AuthFailure {
                    profile_id: credential.profile_id,
                    error,
                    swap,
                }
            }
            FetchOutcome::Skipped(err) => CycleOutcome::Unavailable(err),
        }
    }

    fn publish(&self, snapshot: &UsageSnapshot) {
        *self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        self.inner
            .events
            .emit(EngineEvent::UsageUpdated(snapshot.clone()));
    }
}

/// Timer loop. Each tick spawns its cycle so aborting the loop never cancels
/// a cycle mid-flight. Exits once every monitor handle is gone.
async fn run_timer(weak: Weak<MonitorInner>, period: std::time::Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(inner) = weak.upgrade() else {
            tracing::debug!("usage monitor dropped, timer exiting");
            break;
        };
        let monitor = UsageMonitor { inner };
        tokio::spawn(async move {
            monitor.check_usage().await;
        });
    }
}

/// Holds the "checking" flag for the duration of a cycle.
struct CheckingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CheckingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for CheckingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
