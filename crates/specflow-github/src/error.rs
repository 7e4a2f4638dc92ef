//! Error types for specflow-github

use thiserror::Error;

/// Errors raised while building a GitHub client
#[derive(Error, Debug)]
pub enum GitHubError {
    /// Neither `GITHUB_TOKEN` nor `GH_TOKEN` is set
    #[error("GitHub token not configured (set GITHUB_TOKEN or GH_TOKEN)")]
    MissingToken,

    /// API base URL could not be parsed
    #[error("invalid GitHub API URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },

    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for GitHubError {
    fn from(err: reqwest::Error) -> Self {
        GitHubError::Http(err.to_string())
    }
}
