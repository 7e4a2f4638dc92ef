//! Environment-driven configuration for the applier and discovery service.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_secs(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
}

/// Split a comma separated list (labels, repositories), dropping blanks
/// and duplicates.
pub fn parse_label_list(raw: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for label in raw.split(',').map(str::trim).filter(|l| !l.is_empty()) {
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }
    labels
}

/// Spec applier configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplierConfig {
    /// Branch pull requests target and old specs are read from
    pub base_branch: String,
    /// Prefix of generated branch names
    pub branch_prefix: String,
    /// Labels added to every pull request
    pub labels: Vec<String>,
    /// Color for labels created on the fly (hex, no `#`)
    pub label_color: String,
    /// Bound applied to every remote call
    pub call_timeout_secs: u64,
    /// `owner/name` repositories requests may target. Empty allows any.
    #[serde(default)]
    pub allowed_repos: Vec<String>,
}

impl Default for ApplierConfig {
    fn default() -> Self {
        ApplierConfig {
            base_branch: env_or("SPECFLOW_BASE_BRANCH", "main"),
            branch_prefix: env_or("SPECFLOW_BRANCH_PREFIX", "specflow-update"),
            labels: parse_label_list(&env_or(
                "SPECFLOW_PR_LABELS",
                "infrastructure-change,automated",
            )),
            label_color: env_or("SPECFLOW_LABEL_COLOR", "e4e669")
                .trim_start_matches('#')
                .to_string(),
            call_timeout_secs: env_secs("SPECFLOW_CALL_TIMEOUT_SECS", 15),
            allowed_repos: parse_label_list(&env_or("SPECFLOW_ALLOWED_REPOS", "")),
        }
    }
}

impl ApplierConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Set the base branch
    pub fn with_base_branch(mut self, branch: &str) -> Self {
        self.base_branch = branch.to_string();
        self
    }

    /// Set the generated branch prefix
    pub fn with_branch_prefix(mut self, prefix: &str) -> Self {
        self.branch_prefix = prefix.to_string();
        self
    }

    /// Replace the label list
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-call timeout
    pub fn with_call_timeout_secs(mut self, secs: u64) -> Self {
        self.call_timeout_secs = secs;
        self
    }

    /// Restrict requests to the given repositories
    pub fn with_allowed_repos<I, S>(mut self, repos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_repos = repos.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `repository` passes the allowlist. Owner and name compare
    /// case-insensitively, as GitHub does.
    pub fn allows_repo(&self, repository: &str) -> bool {
        self.allowed_repos.is_empty()
            || self
                .allowed_repos
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(repository))
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

/// Discovery service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveryConfig {
    /// Bound applied to every inventory call
    pub call_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            call_timeout_secs: env_secs("SPECFLOW_DISCOVERY_TIMEOUT_SECS", 10),
        }
    }
}

impl DiscoveryConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Set the per-call timeout
    pub fn with_call_timeout_secs(mut self, secs: u64) -> Self {
        self.call_timeout_secs = secs;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}
