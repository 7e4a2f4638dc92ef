//! GitHub REST client
//!
//! Implements [`VersionControl`] against the v3 REST API. Every HTTP failure
//! is mapped onto one [`RemoteError`] variant by [`classify_failure`].

use crate::config::GitHubConfig;
use crate::error::GitHubError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use specflow_remote::{
    Branch, FileCommit, FileContent, NewPullRequest, PullRequest, RemoteError, RemoteResult,
    RepoId, VersionControl,
};
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("specflow-github/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const LABELS_PER_PAGE: usize = 100;
const MAX_LABEL_PAGES: u32 = 10;

/// GitHub client for the change pipeline
pub struct GitHubClient {
    config: GitHubConfig,
    api_base: Url,
    token: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.config.api_url)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create a new GitHub client. A token is required.
    pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {
        let token = config.token.clone().ok_or(GitHubError::MissingToken)?;
        let api_base =
            Url::parse(&config.api_url).map_err(|e| GitHubError::InvalidApiUrl {
                url: config.api_url.clone(),
                reason: e.to_string(),
            })?;
        if api_base.cannot_be_a_base() {
            return Err(GitHubError::InvalidApiUrl {
                url: config.api_url.clone(),
                reason: "not a hierarchical URL".to_string(),
            });
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(GitHubClient {
            config,
            api_base,
            token,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self, GitHubError> {
        Self::new(GitHubConfig::from_env())
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// `<api>/repos/<owner>/<name>/<tail...>`; `/` inside a tail element
    /// separates path segments, everything else is percent-encoded.
    fn repo_url(&self, repo: &RepoId, tail: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(["repos", repo.owner.as_str(), repo.name.as_str()]);
            for part in tail {
                segments.extend(part.split('/').filter(|s| !s.is_empty()));
            }
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(operation, &e))?;
        let status = response.status();
        debug!(operation, status = status.as_u16(), "GitHub response");
        if status.is_success() {
            return Ok(response);
        }

        let rate_limited = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim() == "0")
            .unwrap_or(false);
        let message = response
            .json::<ApiMessage>()
            .await
            .map(|m| m.text())
            .unwrap_or_default();
        Err(classify_failure(operation, status, rate_limited, &message))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> RemoteResult<T> {
        let response = self.send(operation, request).await?;
        response.json::<T>().await.map_err(|e| {
            RemoteError::upstream("MalformedResponse", format!("{operation}: {e}"))
        })
    }
}

/// Map a non-2xx GitHub response onto the remote error taxonomy.
pub fn classify_failure(
    operation: &str,
    status: StatusCode,
    rate_limited: bool,
    message: &str,
) -> RemoteError {
    let detail = if message.is_empty() {
        format!("{operation}: HTTP {}", status.as_u16())
    } else {
        format!("{operation}: {message}")
    };
    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound(detail),
        StatusCode::UNAUTHORIZED => RemoteError::permission_denied("Unauthorized", detail),
        StatusCode::FORBIDDEN if rate_limited => RemoteError::upstream("RateLimited", detail),
        StatusCode::FORBIDDEN => RemoteError::permission_denied("Forbidden", detail),
        StatusCode::TOO_MANY_REQUESTS => RemoteError::upstream("RateLimited", detail),
        StatusCode::CONFLICT => RemoteError::Conflict(detail),
        StatusCode::UNPROCESSABLE_ENTITY if reports_existing(message) =>
        {
            RemoteError::Conflict(detail)
        }
        other => RemoteError::upstream(format!("HTTP{}", other.as_u16()), detail),
    }
}

fn reports_existing(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("already exists") || lower.contains("already_exists")
}

fn transport_error(operation: &str, err: &reqwest::Error) -> RemoteError {
    let code = if err.is_timeout() {
        "Timeout"
    } else if err.is_connect() {
        "ConnectFailed"
    } else {
        "Transport"
    };
    RemoteError::upstream(code, format!("{operation}: {err}"))
}

/// GitHub error body: `{"message": ..., "errors": [{"message": ...}]}`.
/// Validation errors may carry only `resource` and `code` instead of a
/// message, e.g. `{"resource": "Label", "code": "already_exists"}`.
#[derive(Debug, Default, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<Value>,
}

impl ApiMessage {
    fn text(self) -> String {
        let mut parts = vec![self.message];
        for err in &self.errors {
            if let Some(m) = err.get("message").and_then(Value::as_str) {
                parts.push(m.to_string());
            } else if let Some(code) = err.get("code").and_then(Value::as_str) {
                match err.get("resource").and_then(Value::as_str) {
                    Some(resource) => parts.push(format!("{resource} {code}")),
                    None => parts.push(code.to_string()),
                }
            }
        }
        parts.retain(|p| !p.is_empty());
        parts.join("; ")
    }
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
    sha: String,
}

#[derive(Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Deserialize)]
struct RefResponse {
    #[serde(rename = "ref")]
    name: String,
    object: GitObject,
}

#[derive(Deserialize)]
struct PutContentResponse {
    commit: GitObject,
}

#[derive(Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
    url: String,
}

#[derive(Deserialize)]
struct LabelResponse {
    name: String,
}

fn decode_content(path: &str, body: ContentResponse) -> RemoteResult<FileContent> {
    if !body.encoding.is_empty() && body.encoding != "base64" {
        return Err(RemoteError::upstream(
            "UnsupportedEncoding",
            format!("{path}: {}", body.encoding),
        ));
    }
    let packed: String = body
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(packed)
        .map_err(|e| RemoteError::upstream("InvalidEncoding", format!("{path}: {e}")))?;
    let content = String::from_utf8(bytes)
        .map_err(|_| RemoteError::upstream("InvalidEncoding", format!("{path}: not UTF-8")))?;
    Ok(FileContent {
        content,
        sha: body.sha,
    })
}

#[async_trait]
impl VersionControl for GitHubClient {
    async fn read_file(&self, repo: &RepoId, path: &str, git_ref: &str) -> RemoteResult<FileContent> {
        let mut url = self.repo_url(repo, &["contents", path]);
        url.query_pairs_mut().append_pair("ref", git_ref);

        let body: Value = self
            .send_json("read_file", self.request(Method::GET, url))
            .await?;
        if body.is_array() {
            return Err(RemoteError::NotFound(format!("{path} is a directory")));
        }
        let body: ContentResponse = serde_json::from_value(body).map_err(|e| {
            RemoteError::upstream("MalformedResponse", format!("read_file: {e}"))
        })?;
        decode_content(path, body)
    }

    async fn branch_head(&self, repo: &RepoId, branch: &str) -> RemoteResult<String> {
        let url = self.repo_url(repo, &["git", "ref", "heads", branch]);
        let body: RefResponse = self
            .send_json("branch_head", self.request(Method::GET, url))
            .await?;
        Ok(body.object.sha)
    }

    async fn create_branch(&self, repo: &RepoId, name: &str, base_sha: &str) -> RemoteResult<Branch> {
        let url = self.repo_url(repo, &["git", "refs"]);
        let payload = json!({
            "ref": format!("refs/heads/{name}"),
            "sha": base_sha,
        });
        let body: RefResponse = self
            .send_json("create_branch", self.request(Method::POST, url).json(&payload))
            .await?;
        Ok(Branch {
            name: body
                .name
                .strip_prefix("refs/heads/")
                .unwrap_or(name)
                .to_string(),
            head_sha: body.object.sha,
        })
    }

    async fn put_file(&self, repo: &RepoId, commit: FileCommit<'_>) -> RemoteResult<String> {
        let url = self.repo_url(repo, &["contents", commit.path]);
        let mut payload = json!({
            "message": commit.message,
            "content": STANDARD.encode(commit.content.as_bytes()),
            "branch": commit.branch,
        });
        if let Some(sha) = commit.prior_sha {
            payload["sha"] = Value::String(sha.to_string());
        }
        let body: PutContentResponse = self
            .send_json("put_file", self.request(Method::PUT, url).json(&payload))
            .await?;
        Ok(body.commit.sha)
    }

    async fn create_pull_request(
        &self,
        repo: &RepoId,
        pr: NewPullRequest<'_>,
    ) -> RemoteResult<PullRequest> {
        let url = self.repo_url(repo, &["pulls"]);
        let payload = json!({
            "title": pr.title,
            "body": pr.body,
            "head": pr.head,
            "base": pr.base,
        });
        let body: PullResponse = self
            .send_json(
                "create_pull_request",
                self.request(Method::POST, url).json(&payload),
            )
            .await?;
        Ok(PullRequest {
            number: body.number,
            html_url: body.html_url,
            api_url: body.url,
        })
    }

    async fn list_labels(&self, repo: &RepoId) -> RemoteResult<Vec<String>> {
        let mut names = Vec::new();
        let mut exhausted = true;
        for page in 1..=MAX_LABEL_PAGES {
            let mut url = self.repo_url(repo, &["labels"]);
            url.query_pairs_mut()
                .append_pair("per_page", &LABELS_PER_PAGE.to_string())
                .append_pair("page", &page.to_string());
            let batch: Vec<LabelResponse> = self
                .send_json("list_labels", self.request(Method::GET, url))
                .await?;
            let last = batch.len() < LABELS_PER_PAGE;
            names.extend(batch.into_iter().map(|l| l.name));
            if last {
                exhausted = false;
                break;
            }
        }
        if exhausted {
            warn!(
                repository = %repo,
                pages = MAX_LABEL_PAGES,
                collected = names.len(),
                "label listing stopped at page limit; later labels not checked"
            );
        }
        Ok(names)
    }

    async fn create_label(&self, repo: &RepoId, name: &str, color: &str) -> RemoteResult<()> {
        let url = self.repo_url(repo, &["labels"]);
        let payload = json!({ "name": name, "color": color });
        self.send("create_label", self.request(Method::POST, url).json(&payload))
            .await?;
        Ok(())
    }

    async fn add_labels(&self, repo: &RepoId, number: u64, labels: &[String]) -> RemoteResult<()> {
        let url = self.repo_url(repo, &["issues", &number.to_string(), "labels"]);
        let payload = json!({ "labels": labels });
        self.send("add_labels", self.request(Method::POST, url).json(&payload))
            .await?;
        Ok(())
    }
}
