//! `swapwatch check`: one poll cycle.

use serde::Serialize;

use crate::cli::render::render_snapshot;
use crate::core::events::SwapFailureReason;
use crate::core::models::UsageSnapshot;
use crate::core::monitor::{CycleOutcome, UsageMonitor};
use crate::core::swap::SwapOutcome;
use crate::error::{Result, SwapwatchError};

/// Serializable summary of one cycle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport<'a> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<&'a UsageSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swapped_to: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap_failure: Option<SwapFailureReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> CheckReport<'a> {
    #[must_use]
    pub fn from_outcome(outcome: &'a CycleOutcome) -> Self {
        let mut report = Self {
            status: "ok",
            snapshot: outcome.snapshot(),
            swapped_to: None,
            swap_failure: None,
            error_code: None,
            error: None,
        };
        match outcome.swap() {
            Some(SwapOutcome::Swapped { to, .. }) => report.swapped_to = Some(to.as_str()),
            Some(SwapOutcome::Exhausted { reason, .. }) => report.swap_failure = Some(*reason),
            None => {}
        }
        match outcome {
            CycleOutcome::Fetched { .. } => {}
            CycleOutcome::AlreadyRunning => report.status = "already_running",
            CycleOutcome::NoCredential => report.status = "no_credential",
            CycleOutcome::AuthFailure { error, .. } => {
                report.status = "auth_failure";
                report.error_code = Some(error.error_code());
                report.error = Some(error.to_string());
            }
            CycleOutcome::Unavailable(err) => {
                report.status = "unavailable";
                report.error_code = Some(err.error_code());
                report.error = Some(err.to_string());
            }
        }
        report
    }
}

/// Run one cycle and print it.
///
/// # Errors
/// Returns error when no usage could be captured and no swap recovered from
/// an auth failure.
pub async fn execute(monitor: &UsageMonitor, json: bool) -> Result<()> {
    let outcome = monitor.check_now().await;
    let report = CheckReport::from_outcome(&outcome);

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        if let Some(snapshot) = report.snapshot {
            println!("{}", render_snapshot(snapshot));
        }
        if let Some(to) = report.swapped_to {
            println!("switched active profile to {to}");
        }
        if let Some(reason) = report.swap_failure {
            println!("no profile to switch to ({})", reason.as_str());
        }
    }

    match outcome {
        CycleOutcome::Fetched { .. } | CycleOutcome::AlreadyRunning => Ok(()),
        CycleOutcome::NoCredential => Err(SwapwatchError::Config(
            "no active OAuth profile or API profile is configured".to_string(),
        )),
        CycleOutcome::AuthFailure { swap, error, .. } => {
            if swap.as_ref().is_some_and(SwapOutcome::is_swapped) {
                Ok(())
            } else {
                Err(error)
            }
        }
        CycleOutcome::Unavailable(err) => Err(err),
    }
}
