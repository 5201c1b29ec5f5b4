use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api/cms";
pub const DEFAULT_REFERENCE_API_BASE_URL: &str = "http://localhost:3000/api/common/reference";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub reference_api_base_url: String,
    /// Bearer token for the management API. Reference endpoints are public.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            reference_api_base_url: DEFAULT_REFERENCE_API_BASE_URL.into(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Read `SHELF_API_BASE_URL`, `SHELF_REFERENCE_API_BASE_URL`,
    /// `SHELF_API_TOKEN` and `SHELF_HTTP_TIMEOUT_SECS`, falling back to the
    /// local development defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: lookup("SHELF_API_BASE_URL").unwrap_or(defaults.api_base_url),
            reference_api_base_url: lookup("SHELF_REFERENCE_API_BASE_URL")
                .unwrap_or(defaults.reference_api_base_url),
            token: lookup("SHELF_API_TOKEN").filter(|t| !t.trim().is_empty()),
            timeout_secs: lookup("SHELF_HTTP_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_url(&self, endpoint: &str) -> String {
        join_url(&self.api_base_url, endpoint)
    }

    pub fn reference_url(&self, endpoint: &str) -> String {
        join_url(&self.reference_api_base_url, endpoint)
    }
}

fn join_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
