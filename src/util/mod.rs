//! Utility functions.

pub mod format;
pub mod time;

pub use format::{credential_fingerprint, format_percent};
pub use time::{Clock, SystemClock, format_reset_time};
