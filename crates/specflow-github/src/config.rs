//! GitHub client configuration

use serde::{Deserialize, Serialize};

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL (GitHub Enterprise installs use `<host>/api/v3`)
    pub api_url: String,
    /// Access token with `repo` scope
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        GitHubConfig {
            api_url: std::env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            token: std::env::var("GITHUB_TOKEN")
                .or_else(|_| std::env::var("GH_TOKEN"))
                .ok()
                .filter(|t| !t.trim().is_empty()),
            timeout_secs: std::env::var("SPECFLOW_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
        }
    }
}

impl GitHubConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific API endpoint
    pub fn new(api_url: &str) -> Self {
        GitHubConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: None,
            timeout_secs: 15,
        }
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}
