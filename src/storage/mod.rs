//! Storage for configuration and file-backed profiles.

pub mod config;
pub mod paths;
pub mod profiles;

pub use config::{
    AutoSwitchConfig, Config, ENV_AUTO_SWITCH, ENV_CHECK_INTERVAL_MS, ENV_CONFIG,
    ENV_PROACTIVE_SWAP, ENV_SESSION_THRESHOLD, ENV_WEEKLY_THRESHOLD, HttpConfig,
};
pub use paths::AppPaths;
pub use profiles::{FileProfileStore, JsonApiProfileSource, ProfileEntry, ProfilesFile};
