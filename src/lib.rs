//! swapwatch - usage monitoring and credential failover for AI coding agents
//!
//! Polls the active credential's provider for rate-limit usage, normalizes
//! the response into a [`core::UsageSnapshot`], and swaps to another profile
//! before a limit is hit or as soon as the provider rejects the credential.
//!
//! The entry point is [`core::UsageMonitor`]; profiles and settings come from
//! the host through [`core::ProfileStore`] and [`core::ApiProfileSource`].

// Note: deny (not forbid) to allow #[allow(unsafe_code)] in test helpers for env var manipulation
#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod error;
pub mod providers;
pub mod storage;
pub mod util;

/// Test utilities module - included in test builds or when test-utils feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{ExitCode, Result, SwapwatchError};

// Re-export test utilities for external test crates
#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::*;
