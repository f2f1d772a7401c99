//! `swapwatch detect`: provider and endpoint for a base URL. No network.

use serde::Serialize;

use crate::cli::args::DetectArgs;
use crate::core::provider::{Provider, detect_provider, usage_endpoint};
use crate::error::Result;

/// Detection result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub base_url: String,
    pub provider: Provider,
    pub usage_endpoint: Option<String>,
}

impl Detection {
    #[must_use]
    pub fn for_url(base_url: &str) -> Self {
        let provider = detect_provider(base_url);
        Self {
            base_url: base_url.to_string(),
            provider,
            usage_endpoint: usage_endpoint(provider, base_url),
        }
    }

    #[must_use]
    pub fn render_human(&self) -> String {
        format!(
            "provider: {} ({})\nusage endpoint: {}",
            self.provider.id(),
            self.provider.display_name(),
            self.usage_endpoint.as_deref().unwrap_or("none")
        )
    }
}

/// Print the detection.
///
/// # Errors
/// Returns error if JSON serialization fails.
pub fn execute(args: &DetectArgs, json: bool) -> Result<()> {
    let detection = Detection::for_url(&args.base_url);
    if json {
        println!("{}", serde_json::to_string(&detection)?);
    } else {
        println!("{}", detection.render_human());
    }
    Ok(())
}
