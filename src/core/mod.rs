//! Usage monitoring and credential failover engine.

pub mod cooldown;
pub mod credentials;
pub mod events;
pub mod fetcher;
pub mod http;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod provider;
pub mod store;
pub mod swap;

pub use cooldown::{AUTH_FAILURE_COOLDOWN, AuthFailureCooldown};
pub use credentials::{ActiveCredential, CredentialKind, cli_usage_fallback, resolve_credential};
pub use events::{EngineEvent, EventBus, SwapFailureReason, SwapTrigger};
pub use fetcher::{AUTH_ERROR_PATTERNS, FetchOutcome, UsageFetcher};
pub use models::{
    ApiProfile, ApiProfilesFile, AutoSwitchSettings, LimitType, Profile, UsageSnapshot,
    UsageWindows,
};
pub use monitor::{CycleOutcome, UsageMonitor};
pub use provider::{Provider, detect_provider, usage_endpoint};
pub use store::{ApiProfileSource, ProfileStore};
pub use swap::{SwapEngine, SwapOutcome, evaluate_thresholds};
