//! Specflow-GitHub: GitHub REST adapter
//!
//! ## Layer 2 - Hosted git
//!
//! - `GitHubClient`: implements `VersionControl` over the v3 REST API
//! - `GitHubConfig`: endpoint, token and timeout, read from the environment
//!
//! Status codes are mapped onto `RemoteError` so callers can tell a missing
//! file from a branch collision from a rate limit.

pub mod client;
pub mod config;
pub mod error;

pub use client::{classify_failure, GitHubClient};
pub use config::{GitHubConfig, DEFAULT_API_URL};
pub use error::GitHubError;
