//! Spec applier: turns a proposed spec into a labelled pull request.
//!
//! The pipeline is strictly sequential and fail-fast:
//!
//! `Validating -> FetchingOldSpec -> BranchCreating -> Committing -> PrCreating
//!  -> LabelApplying (best-effort) -> Done`
//!
//! - Validation happens before the first remote call, so invalid input never
//!   leaves a branch behind.
//! - A branch-name collision is retried exactly once with a random suffix.
//! - Label application can never turn a success into a failure.
//! - Nothing is rolled back: a branch created before a later failure stays
//!   on the remote for an operator to inspect.

use std::fmt;
use std::future::Future;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use specflow_remote::{
    Branch, FileCommit, NewPullRequest, RemoteError, RemoteResult, RepoId, VersionControl,
};
use thiserror::Error;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::best_effort::BestEffort;
use crate::classify::classify;
use crate::config::ApplierConfig;
use crate::domain::{ChangeWarning, Spec, SpecError};
use crate::metrics::METRICS;
use crate::narrative::{render_pr_body, render_pr_title};
use crate::obs;

/// A change-application request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyRequest {
    /// `owner/name`
    pub repository: String,
    /// Repository-relative path of the spec file
    pub spec_path: String,
    /// Proposed spec document (YAML or JSON)
    pub new_spec_raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
}

/// Successful outcome of an apply request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub request_id: String,
    pub pull_request_url: String,
    pub pull_request_number: u64,
    pub branch_name: String,
    pub warnings: Vec<ChangeWarning>,
    /// Whether the best-effort label step completed. Never affects success.
    pub labels_applied: bool,
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyStage {
    Validating,
    FetchingOldSpec,
    BranchCreating,
    Committing,
    PrCreating,
    LabelApplying,
    Done,
}

impl ApplyStage {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplyStage::Validating => "validating",
            ApplyStage::FetchingOldSpec => "fetching_old_spec",
            ApplyStage::BranchCreating => "branch_creating",
            ApplyStage::Committing => "committing",
            ApplyStage::PrCreating => "pr_creating",
            ApplyStage::LabelApplying => "label_applying",
            ApplyStage::Done => "done",
        }
    }
}

impl fmt::Display for ApplyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-facing error category. Each maps to a distinct HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    InputValidation,
    NotFound,
    Conflict,
    PermissionDenied,
    UpstreamUnavailable,
    Internal,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::InputValidation => "input_validation",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::PermissionDenied => "permission_denied",
            ErrorCategory::UpstreamUnavailable => "upstream_unavailable",
            ErrorCategory::Internal => "internal",
        }
    }

    pub fn http_status(self) -> u16 {
        match self {
            ErrorCategory::InputValidation => 400,
            ErrorCategory::PermissionDenied => 403,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Conflict => 409,
            ErrorCategory::UpstreamUnavailable => 502,
            ErrorCategory::Internal => 500,
        }
    }

    pub fn from_remote(err: &RemoteError) -> Self {
        match err {
            RemoteError::NotFound(_) => ErrorCategory::NotFound,
            RemoteError::PermissionDenied { .. } => ErrorCategory::PermissionDenied,
            RemoteError::Conflict(_) => ErrorCategory::Conflict,
            RemoteError::Upstream { .. } => ErrorCategory::UpstreamUnavailable,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failures of the apply pipeline.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("invalid {field}: {reason}")]
    InvalidRequest { field: &'static str, reason: String },

    #[error("invalid spec: {0}")]
    InvalidSpec(#[from] SpecError),

    #[error("repository {repository} is not in the allowed repository list")]
    RepositoryNotAllowed { repository: String },

    #[error("spec not found at path {path} on {base_ref}")]
    OldSpecNotFound { path: String, base_ref: String },

    #[error("branch already exists after retry: tried {first} and {second}")]
    BranchConflictExhausted { first: String, second: String },

    #[error("a pull request already exists for branch {branch} (branch was created and committed): {detail}")]
    PrConflict { branch: String, detail: String },

    #[error("{stage} returned an unusable response: {detail}")]
    UnexpectedResponse { stage: ApplyStage, detail: String },

    #[error("{stage} failed: {source}")]
    Remote {
        stage: ApplyStage,
        #[source]
        source: RemoteError,
    },
}

impl ApplyError {
    fn remote(stage: ApplyStage) -> impl FnOnce(RemoteError) -> ApplyError {
        move |source| ApplyError::Remote { stage, source }
    }

    /// Stage the pipeline stopped at.
    pub fn stage(&self) -> ApplyStage {
        match self {
            ApplyError::InvalidRequest { .. }
            | ApplyError::InvalidSpec(_)
            | ApplyError::RepositoryNotAllowed { .. } => ApplyStage::Validating,
            ApplyError::OldSpecNotFound { .. } => ApplyStage::FetchingOldSpec,
            ApplyError::BranchConflictExhausted { .. } => ApplyStage::BranchCreating,
            ApplyError::PrConflict { .. } => ApplyStage::PrCreating,
            ApplyError::UnexpectedResponse { stage, .. } | ApplyError::Remote { stage, .. } => {
                *stage
            }
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ApplyError::InvalidRequest { .. }
            | ApplyError::InvalidSpec(_)
            | ApplyError::RepositoryNotAllowed { .. } => ErrorCategory::InputValidation,
            ApplyError::OldSpecNotFound { .. } => ErrorCategory::NotFound,
            ApplyError::BranchConflictExhausted { .. } | ApplyError::PrConflict { .. } => {
                ErrorCategory::Conflict
            }
            ApplyError::UnexpectedResponse { .. } => ErrorCategory::Internal,
            ApplyError::Remote { source, .. } => ErrorCategory::from_remote(source),
        }
    }

    /// Actionable next step for the caller.
    pub fn hint(&self) -> String {
        match self {
            ApplyError::InvalidRequest { field, .. } => {
                format!("fix the {field} field and resubmit; no changes were made")
            }
            ApplyError::InvalidSpec(_) => {
                "correct the spec document and resubmit; no changes were made".to_string()
            }
            ApplyError::RepositoryNotAllowed { .. } => {
                "target a repository listed in SPECFLOW_ALLOWED_REPOS; no changes were made"
                    .to_string()
            }
            ApplyError::OldSpecNotFound { path, base_ref } => {
                format!("spec not found at path {path} on {base_ref}; check spec_path")
            }
            ApplyError::BranchConflictExhausted { .. } => {
                "branch already exists after retry; resubmit the request".to_string()
            }
            ApplyError::PrConflict { branch, .. } => {
                format!("inspect or close the existing pull request for branch {branch}")
            }
            ApplyError::UnexpectedResponse { .. } => {
                "check the repository for a partially created change before resubmitting"
                    .to_string()
            }
            ApplyError::Remote { source, .. } => match source {
                RemoteError::NotFound(_) => {
                    "check the repository name and base branch".to_string()
                }
                RemoteError::PermissionDenied { .. } => {
                    "the configured token lacks access to this repository".to_string()
                }
                RemoteError::Conflict(_) => {
                    "a concurrent change raced this request; resubmit".to_string()
                }
                RemoteError::Upstream { .. } => {
                    "upstream unavailable; resubmitting is safe and creates a new branch"
                        .to_string()
                }
            },
        }
    }

    /// Serializable failure body.
    pub fn to_failure(&self) -> ApplyFailure {
        ApplyFailure {
            error_category: self.category(),
            stage: self.stage(),
            detail: self.to_string(),
            hint: self.hint(),
        }
    }
}

/// Failure response: `{error_category, stage, detail, hint}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyFailure {
    pub error_category: ErrorCategory,
    pub stage: ApplyStage,
    pub detail: String,
    pub hint: String,
}

/// Validate a repository-relative file path.
pub fn validate_spec_path(path: &str) -> Result<(), ApplyError> {
    let invalid = |reason: &str| ApplyError::InvalidRequest {
        field: "spec_path",
        reason: reason.to_string(),
    };
    if path.trim().is_empty() {
        return Err(invalid("must not be empty"));
    }
    if path.starts_with('/') {
        return Err(invalid("must be relative to the repository root"));
    }
    if path.contains('\\') {
        return Err(invalid("must use '/' separators"));
    }
    if path.split('/').any(|seg| seg.is_empty() || seg == "..") {
        return Err(invalid("must not contain empty or '..' segments"));
    }
    Ok(())
}

fn commit_message(request: &ApplyRequest) -> Result<String, ApplyError> {
    match &request.commit_message {
        None => Ok(format!("Update {}", request.spec_path)),
        Some(msg) if msg.trim().is_empty() => Err(ApplyError::InvalidRequest {
            field: "commit_message",
            reason: "must not be blank".to_string(),
        }),
        Some(msg) => Ok(msg.trim().to_string()),
    }
}

/// Drives the apply pipeline against a [`VersionControl`] capability.
pub struct SpecApplier<V> {
    vcs: V,
    config: ApplierConfig,
}

impl<V: VersionControl> SpecApplier<V> {
    pub fn new(vcs: V, config: ApplierConfig) -> Self {
        Self { vcs, config }
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    pub fn config(&self) -> &ApplierConfig {
        &self.config
    }

    /// Run one request end to end.
    pub async fn apply(&self, request: &ApplyRequest) -> Result<ApplyOutcome, ApplyError> {
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let span = obs::apply_span(&request_id, &request.repository);

        async {
            obs::emit_apply_started(&request_id, &request.repository, &request.spec_path);
            let outcome = self.run(&request_id, request).await;
            let duration_ms = started.elapsed().as_millis() as u64;
            match &outcome {
                Ok(done) => {
                    METRICS.inc_applies_succeeded();
                    obs::emit_apply_finished(
                        &request_id,
                        duration_ms,
                        &done.branch_name,
                        done.pull_request_number,
                        done.warnings.len(),
                        done.labels_applied,
                    );
                }
                Err(e) => {
                    METRICS.inc_applies_failed();
                    obs::emit_apply_failed(
                        &request_id,
                        duration_ms,
                        e.stage().as_str(),
                        e.category().as_str(),
                        e,
                    );
                }
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request_id: &str, request: &ApplyRequest) -> Result<ApplyOutcome, ApplyError> {
        let base = self.config.base_branch.as_str();

        obs::emit_apply_stage(request_id, ApplyStage::Validating.as_str());
        let repo = RepoId::parse(&request.repository).map_err(|e| ApplyError::InvalidRequest {
            field: "repository",
            reason: e.to_string(),
        })?;
        if !self.config.allows_repo(&repo.to_string()) {
            warn!(repository = %repo, "repository rejected by allowlist");
            return Err(ApplyError::RepositoryNotAllowed {
                repository: repo.to_string(),
            });
        }
        validate_spec_path(&request.spec_path)?;
        let message = commit_message(request)?;
        let new_spec = Spec::parse(&request.new_spec_raw)?;

        obs::emit_apply_stage(request_id, ApplyStage::FetchingOldSpec.as_str());
        let old_file = self
            .bounded("read_file", self.vcs.read_file(&repo, &request.spec_path, base))
            .await
            .map_err(|e| match e {
                RemoteError::NotFound(_) => ApplyError::OldSpecNotFound {
                    path: request.spec_path.clone(),
                    base_ref: base.to_string(),
                },
                other => ApplyError::Remote {
                    stage: ApplyStage::FetchingOldSpec,
                    source: other,
                },
            })?;
        let old_spec = match Spec::from_yaml(&old_file.content) {
            Ok(spec) => Some(spec),
            Err(e) => {
                warn!(path = %request.spec_path, error = %e, "committed spec is unreadable, classifying as first submission");
                None
            }
        };
        let warnings = classify(old_spec.as_ref(), &new_spec);
        debug!(warnings = warnings.len(), "classified change");

        obs::emit_apply_stage(request_id, ApplyStage::BranchCreating.as_str());
        let base_sha = self
            .bounded("branch_head", self.vcs.branch_head(&repo, base))
            .await
            .map_err(ApplyError::remote(ApplyStage::BranchCreating))?;
        let branch = self.create_branch(&repo, &base_sha).await?;

        obs::emit_apply_stage(request_id, ApplyStage::Committing.as_str());
        let prior_sha = match self
            .bounded(
                "read_file",
                self.vcs.read_file(&repo, &request.spec_path, &branch.name),
            )
            .await
        {
            Ok(file) => Some(file.sha),
            Err(RemoteError::NotFound(_)) => None,
            Err(e) => return Err(ApplyError::remote(ApplyStage::Committing)(e)),
        };
        let commit = FileCommit {
            path: &request.spec_path,
            branch: &branch.name,
            content: &request.new_spec_raw,
            message: &message,
            prior_sha: prior_sha.as_deref(),
        };
        let commit_sha = self
            .bounded("put_file", self.vcs.put_file(&repo, commit))
            .await
            .map_err(ApplyError::remote(ApplyStage::Committing))?;
        debug!(commit = %commit_sha, branch = %branch.name, "committed spec");

        obs::emit_apply_stage(request_id, ApplyStage::PrCreating.as_str());
        let empty = Spec::empty();
        let body = render_pr_body(old_spec.as_ref().unwrap_or(&empty), &new_spec, &warnings);
        let title = render_pr_title(&new_spec);
        let pr = self
            .bounded(
                "create_pull_request",
                self.vcs.create_pull_request(
                    &repo,
                    NewPullRequest {
                        title: &title,
                        body: &body,
                        head: &branch.name,
                        base,
                    },
                ),
            )
            .await
            .map_err(|e| match e {
                RemoteError::Conflict(detail) => ApplyError::PrConflict {
                    branch: branch.name.clone(),
                    detail,
                },
                other => ApplyError::Remote {
                    stage: ApplyStage::PrCreating,
                    source: other,
                },
            })?;
        if pr.number == 0 || pr.html_url.trim().is_empty() {
            return Err(ApplyError::UnexpectedResponse {
                stage: ApplyStage::PrCreating,
                detail: format!(
                    "pull request for branch {} has number {} and url {:?}",
                    branch.name, pr.number, pr.html_url
                ),
            });
        }

        obs::emit_apply_stage(request_id, ApplyStage::LabelApplying.as_str());
        let labels = BestEffort::run("labels", self.apply_labels(&repo, pr.number)).await;
        if !labels.is_done() {
            METRICS.inc_label_failures();
            obs::emit_labels_skipped(request_id, pr.number);
        }

        obs::emit_apply_stage(request_id, ApplyStage::Done.as_str());
        Ok(ApplyOutcome {
            request_id: request_id.to_string(),
            pull_request_url: pr.html_url,
            pull_request_number: pr.number,
            branch_name: branch.name,
            warnings,
            labels_applied: labels.is_done(),
        })
    }

    /// Create a fresh branch, retrying once on a name collision.
    async fn create_branch(&self, repo: &RepoId, base_sha: &str) -> Result<Branch, ApplyError> {
        let first = format!(
            "{}-{}",
            self.config.branch_prefix,
            chrono::Utc::now().timestamp()
        );
        match self
            .bounded("create_branch", self.vcs.create_branch(repo, &first, base_sha))
            .await
        {
            Ok(branch) => return Ok(branch),
            Err(RemoteError::Conflict(_)) => {
                METRICS.inc_branch_retries();
                info!(branch = %first, "branch name collision, retrying with suffix");
            }
            Err(e) => return Err(ApplyError::remote(ApplyStage::BranchCreating)(e)),
        }

        let second = format!("{first}-{}", hex::encode(rand::random::<[u8; 4]>()));
        self.bounded("create_branch", self.vcs.create_branch(repo, &second, base_sha))
            .await
            .map_err(|e| match e {
                RemoteError::Conflict(_) => ApplyError::BranchConflictExhausted {
                    first: first.clone(),
                    second: second.clone(),
                },
                other => ApplyError::Remote {
                    stage: ApplyStage::BranchCreating,
                    source: other,
                },
            })
    }

    /// List, create missing, then attach the configured labels.
    async fn apply_labels(&self, repo: &RepoId, number: u64) -> RemoteResult<()> {
        let wanted = &self.config.labels;
        if wanted.is_empty() {
            return Ok(());
        }

        let existing = self.bounded("list_labels", self.vcs.list_labels(repo)).await?;
        for label in wanted.iter().filter(|l| !existing.contains(*l)) {
            match self
                .bounded(
                    "create_label",
                    self.vcs.create_label(repo, label, &self.config.label_color),
                )
                .await
            {
                Ok(()) | Err(RemoteError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }

        self.bounded("add_labels", self.vcs.add_labels(repo, number, wanted))
            .await
    }

    async fn bounded<T, F>(&self, operation: &str, call: F) -> RemoteResult<T>
    where
        F: Future<Output = RemoteResult<T>>,
    {
        match tokio::time::timeout(self.config.call_timeout(), call).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::timed_out(
                operation,
                self.config.call_timeout_secs,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_path_rules() {
        assert!(validate_spec_path("specs/prod/web.yaml").is_ok());
        for bad in ["", "  ", "/etc/passwd", "specs/../secrets", "specs\\web.yaml", "specs//web.yaml", "specs/"] {
            assert!(validate_spec_path(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn commit_message_defaults_and_rejects_blank() {
        let mut request = ApplyRequest {
            repository: "acme/infra".to_string(),
            spec_path: "specs/web.yaml".to_string(),
            new_spec_raw: String::new(),
            commit_message: None,
        };
        assert_eq!(commit_message(&request).unwrap(), "Update specs/web.yaml");

        request.commit_message = Some("   ".to_string());
        assert!(commit_message(&request).is_err());

        request.commit_message = Some(" Shrink cluster ".to_string());
        assert_eq!(commit_message(&request).unwrap(), "Shrink cluster");
    }

    #[test]
    fn categories_have_distinct_statuses() {
        let all = [
            ErrorCategory::InputValidation,
            ErrorCategory::NotFound,
            ErrorCategory::Conflict,
            ErrorCategory::PermissionDenied,
            ErrorCategory::UpstreamUnavailable,
            ErrorCategory::Internal,
        ];
        let mut statuses: Vec<u16> = all.iter().map(|c| c.http_status()).collect();
        statuses.sort_unstable();
        statuses.dedup();
        assert_eq!(statuses.len(), all.len());
    }

    #[test]
    fn failure_body_names_stage_and_hint() {
        let err = ApplyError::OldSpecNotFound {
            path: "specs/web.yaml".to_string(),
            base_ref: "main".to_string(),
        };
        let failure = err.to_failure();
        assert_eq!(failure.error_category, ErrorCategory::NotFound);
        assert_eq!(failure.stage, ApplyStage::FetchingOldSpec);
        assert!(failure.hint.contains("spec not found at path specs/web.yaml"));

        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["error_category"], "not_found");
        assert_eq!(json["stage"], "fetching_old_spec");
    }

    #[test]
    fn remote_errors_keep_their_category() {
        let err = ApplyError::Remote {
            stage: ApplyStage::Committing,
            source: RemoteError::upstream("HTTP502", "bad gateway"),
        };
        assert_eq!(err.category(), ErrorCategory::UpstreamUnavailable);
        assert_eq!(err.stage(), ApplyStage::Committing);
        assert!(err.to_string().starts_with("committing failed"));
    }

    #[test]
    fn disallowed_repository_is_a_validation_error() {
        let err = ApplyError::RepositoryNotAllowed {
            repository: "evil/infra".to_string(),
        };
        assert_eq!(err.stage(), ApplyStage::Validating);
        assert_eq!(err.category(), ErrorCategory::InputValidation);
        assert!(err.hint().contains("SPECFLOW_ALLOWED_REPOS"));
    }

    #[test]
    fn unusable_response_is_internal() {
        let err = ApplyError::UnexpectedResponse {
            stage: ApplyStage::PrCreating,
            detail: "pull request number 0".to_string(),
        };
        let failure = err.to_failure();
        assert_eq!(failure.error_category, ErrorCategory::Internal);
        assert_eq!(failure.stage, ApplyStage::PrCreating);
        assert_eq!(failure.error_category.http_status(), 500);
    }
}
