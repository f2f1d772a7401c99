//! Per-test phase logging.
#![allow(dead_code)]
//!
//! Writes one line per phase to stderr so a failing test shows how far it
//! got. Set `TEST_LOG_JSON=1` for JSON lines.

use std::env;
use std::sync::Mutex;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    timestamp: String,
    test: &'a str,
    phase: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<u64>,
}

pub struct TestLogger {
    test_name: String,
    start_time: Instant,
    current_phase: Mutex<String>,
    json: bool,
}

impl TestLogger {
    #[must_use]
    pub fn new(test_name: &str) -> Self {
        let logger = Self {
            test_name: test_name.to_string(),
            start_time: Instant::now(),
            current_phase: Mutex::new("init".to_string()),
            json: env::var("TEST_LOG_JSON").is_ok_and(|v| v == "1" || v == "true"),
        };
        logger.log("Test starting", None);
        logger
    }

    pub fn phase(&self, phase: &str) {
        if let Ok(mut current) = self.current_phase.lock() {
            *current = phase.to_string();
        }
        self.log(&format!("Phase: {phase}"), None);
    }

    pub fn info(&self, message: &str) {
        self.log(message, None);
    }

    pub fn http_request(&self, method: &str, url: &str) {
        self.log(&format!("HTTP {method} {url}"), None);
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn finish_ok(&self) {
        let duration_ms = self.start_time.elapsed().as_millis() as u64;
        self.log("Test passed", Some(duration_ms));
    }

    fn log(&self, message: &str, duration_ms: Option<u64>) {
        let phase = self
            .current_phase
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default();
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();

        if self.json {
            let entry = LogEntry {
                timestamp,
                test: &self.test_name,
                phase: &phase,
                message,
                duration_ms,
            };
            if let Ok(line) = serde_json::to_string(&entry) {
                eprintln!("{line}");
            }
        } else {
            let duration = duration_ms.map(|ms| format!(" ({ms}ms)")).unwrap_or_default();
            eprintln!(
                "{timestamp} [{}] [{phase}] {message}{duration}",
                self.test_name
            );
        }
    }
}
