//! Version-control capability.
//!
//! `VersionControl` is the narrow slice of a hosted git API the change
//! pipeline needs: read a file, create a branch, commit one file, open a pull
//! request and label it. Implementations live in adapter crates; an in-memory
//! fake lives in [`crate::fakes`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::RemoteResult;

// ---------------------------------------------------------------------------
// RepoId
// ---------------------------------------------------------------------------

/// Rejected repository identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid repository '{0}': expected 'owner/name'")]
pub struct InvalidRepoId(pub String);

/// A repository addressed as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    /// Parse `owner/name`. Each segment is restricted to `[A-Za-z0-9_.-]` and
    /// may not be `.` or `..`.
    pub fn parse(raw: &str) -> Result<Self, InvalidRepoId> {
        let invalid = || InvalidRepoId(raw.to_string());
        let (owner, name) = raw.trim().split_once('/').ok_or_else(invalid)?;
        if !valid_segment(owner) || !valid_segment(name) {
            return Err(invalid());
        }
        Ok(RepoId {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

fn valid_segment(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A file read at a given ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// Decoded UTF-8 content
    pub content: String,
    /// Blob SHA, required to update the file
    pub sha: String,
}

/// A branch created by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub head_sha: String,
}

/// Parameters for a single-file create-or-update commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCommit<'a> {
    pub path: &'a str,
    pub branch: &'a str,
    pub content: &'a str,
    pub message: &'a str,
    /// Current blob SHA on `branch`; `None` creates the file.
    pub prior_sha: Option<&'a str>,
}

/// Parameters for opening a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub head: &'a str,
    pub base: &'a str,
}

/// A pull request as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
    pub api_url: String,
}

// ---------------------------------------------------------------------------
// VersionControl
// ---------------------------------------------------------------------------

/// Hosted version-control API.
///
/// Every method fails with exactly one [`crate::RemoteError`] variant:
/// - `NotFound` when the file, ref or issue is absent.
/// - `Conflict` when creating a ref, file or pull request that already exists.
/// - `PermissionDenied` when the token lacks access.
/// - `Upstream` for everything else.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Read the file at `path` on `git_ref`.
    async fn read_file(&self, repo: &RepoId, path: &str, git_ref: &str)
        -> RemoteResult<FileContent>;

    /// Resolve the head commit SHA of `branch`.
    async fn branch_head(&self, repo: &RepoId, branch: &str) -> RemoteResult<String>;

    /// Create branch `name` pointing at `base_sha`. `Conflict` if it exists.
    async fn create_branch(&self, repo: &RepoId, name: &str, base_sha: &str)
        -> RemoteResult<Branch>;

    /// Create or update exactly one file. Returns the new commit SHA.
    async fn put_file(&self, repo: &RepoId, commit: FileCommit<'_>) -> RemoteResult<String>;

    /// Open a pull request. `Conflict` if one already exists for `head`.
    async fn create_pull_request(
        &self,
        repo: &RepoId,
        pr: NewPullRequest<'_>,
    ) -> RemoteResult<PullRequest>;

    /// Names of all labels defined in the repository.
    async fn list_labels(&self, repo: &RepoId) -> RemoteResult<Vec<String>>;

    /// Define a new label.
    async fn create_label(&self, repo: &RepoId, name: &str, color: &str) -> RemoteResult<()>;

    /// Attach existing labels to an issue or pull request.
    async fn add_labels(&self, repo: &RepoId, number: u64, labels: &[String])
        -> RemoteResult<()>;
}
