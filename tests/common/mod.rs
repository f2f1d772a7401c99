//! Shared setup for integration tests.
//!
//! - `logger`: per-test phase logging
//! - monitor wiring against a wiremock provider
#![allow(dead_code)]

pub mod logger;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use swapwatch::core::fetcher::UsageFetcher;
use swapwatch::core::models::Profile;
use swapwatch::core::monitor::UsageMonitor;
use swapwatch::test_utils::{InMemoryProfileStore, ManualClock};

/// Usage route each mocked profile is served on: `/usage/<profile id>`.
#[must_use]
pub fn usage_route(profile_id: &str) -> String {
    format!("/usage/{profile_id}")
}

/// An Anthropic OAuth profile whose usage endpoint points at `server`.
#[must_use]
pub fn mocked_profile(server: &MockServer, id: &str, name: &str) -> Profile {
    Profile::new(id, name).with_usage_endpoint(&format!("{}{}", server.uri(), usage_route(id)))
}

/// A monitor over `store` with a short fetch timeout.
pub fn monitor_for(store: &Arc<InMemoryProfileStore>, clock: &Arc<ManualClock>) -> UsageMonitor {
    let fetcher = UsageFetcher::new(Duration::from_secs(5)).expect("http client");
    UsageMonitor::new(store.clone(), store.clone(), fetcher, clock.clone())
}

/// Serve `body` with `status` on `route` for GET requests.
pub async fn mount_json(server: &MockServer, route: &str, status: u16, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}
