//! In-memory fakes for the remote capabilities (testing only)
//!
//! `MemoryVersionControl` and `MemoryCloudInventory` honour the trait
//! contracts, record every call, and can be scripted to fail or stall on a
//! given operation.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{RemoteError, RemoteResult};
use crate::inventory::*;
use crate::vcs::*;

/// Base branch every `MemoryVersionControl` starts with.
pub const FAKE_BASE_BRANCH: &str = "main";
/// Head SHA of [`FAKE_BASE_BRANCH`].
pub const FAKE_BASE_SHA: &str = "0000000000000000000000000000000000000000";

// ---------------------------------------------------------------------------
// MemoryVersionControl
// ---------------------------------------------------------------------------

/// Operations of [`VersionControl`], used to script and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcsOp {
    ReadFile,
    BranchHead,
    CreateBranch,
    PutFile,
    CreatePullRequest,
    ListLabels,
    CreateLabel,
    AddLabels,
}

impl VcsOp {
    /// Whether the operation changes remote state.
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            VcsOp::CreateBranch
                | VcsOp::PutFile
                | VcsOp::CreatePullRequest
                | VcsOp::CreateLabel
                | VcsOp::AddLabels
        )
    }
}

#[derive(Debug, Default)]
struct VcsState {
    branches: HashMap<String, String>,
    files: HashMap<(String, String), FileContent>,
    pulls: Vec<(String, PullRequest)>,
    labels: Vec<String>,
    applied: HashMap<u64, Vec<String>>,
    branch_attempts: Vec<String>,
    commit_messages: Vec<String>,
    pull_url_override: Option<String>,
    calls: Vec<VcsOp>,
    failures: HashMap<VcsOp, VecDeque<RemoteError>>,
    delays: HashMap<VcsOp, Duration>,
    seq: u64,
}

/// In-memory hosted repository.
#[derive(Debug)]
pub struct MemoryVersionControl {
    state: Mutex<VcsState>,
}

impl Default for MemoryVersionControl {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVersionControl {
    /// A repository with a single `main` branch.
    pub fn new() -> Self {
        let mut state = VcsState::default();
        state
            .branches
            .insert(FAKE_BASE_BRANCH.to_string(), FAKE_BASE_SHA.to_string());
        Self {
            state: Mutex::new(state),
        }
    }

    /// Seed a file on `branch` (the branch is created if needed).
    pub fn with_file(self, branch: &str, path: &str, content: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state
                .branches
                .entry(branch.to_string())
                .or_insert_with(|| FAKE_BASE_SHA.to_string());
            state.seq += 1;
            let sha = format!("blob-{}", state.seq);
            state.files.insert(
                (branch.to_string(), path.to_string()),
                FileContent {
                    content: content.to_string(),
                    sha,
                },
            );
        }
        self
    }

    /// Seed an existing label.
    pub fn with_label(self, name: &str) -> Self {
        self.state.lock().unwrap().labels.push(name.to_string());
        self
    }

    /// Report `url` as the link of every pull request created from now on.
    pub fn with_pull_request_url(self, url: &str) -> Self {
        self.state.lock().unwrap().pull_url_override = Some(url.to_string());
        self
    }

    /// Make the next call to `op` fail with `err`. Calls queue up in order.
    pub fn fail_next(&self, op: VcsOp, err: RemoteError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(op)
            .or_default()
            .push_back(err);
    }

    /// Make every call to `op` sleep for `delay` before answering.
    pub fn delay(&self, op: VcsOp, delay: Duration) {
        self.state.lock().unwrap().delays.insert(op, delay);
    }

    /// Number of calls made to `op`.
    pub fn calls(&self, op: VcsOp) -> usize {
        let state = self.state.lock().unwrap();
        state.calls.iter().filter(|c| **c == op).count()
    }

    /// Number of state-changing calls made so far.
    pub fn mutating_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.calls.iter().filter(|c| c.is_mutation()).count()
    }

    /// Total number of calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// Every branch name passed to `create_branch`, in call order.
    pub fn branch_attempts(&self) -> Vec<String> {
        self.state.lock().unwrap().branch_attempts.clone()
    }

    pub fn has_branch(&self, name: &str) -> bool {
        self.state.lock().unwrap().branches.contains_key(name)
    }

    /// Content of `path` on `branch`, if present.
    pub fn file(&self, branch: &str, path: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .files
            .get(&(branch.to_string(), path.to_string()))
            .map(|f| f.content.clone())
    }

    /// Messages of successful commits, oldest first.
    pub fn commit_messages(&self) -> Vec<String> {
        self.state.lock().unwrap().commit_messages.clone()
    }

    pub fn pull_requests(&self) -> Vec<PullRequest> {
        let state = self.state.lock().unwrap();
        state.pulls.iter().map(|(_, pr)| pr.clone()).collect()
    }

    /// Labels attached to issue/PR `number`.
    pub fn labels_on(&self, number: u64) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.applied.get(&number).cloned().unwrap_or_default()
    }

    /// Labels defined in the repository.
    pub fn defined_labels(&self) -> Vec<String> {
        self.state.lock().unwrap().labels.clone()
    }

    /// Record the call, then sleep and/or return a scripted failure.
    async fn enter(&self, op: VcsOp) -> RemoteResult<()> {
        let (delay, failure) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(op);
            let failure = state.failures.get_mut(&op).and_then(|q| q.pop_front());
            (state.delays.get(&op).copied(), failure)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl VersionControl for MemoryVersionControl {
    async fn read_file(
        &self,
        _repo: &RepoId,
        path: &str,
        git_ref: &str,
    ) -> RemoteResult<FileContent> {
        self.enter(VcsOp::ReadFile).await?;
        let state = self.state.lock().unwrap();
        state
            .files
            .get(&(git_ref.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("{path} on {git_ref}")))
    }

    async fn branch_head(&self, _repo: &RepoId, branch: &str) -> RemoteResult<String> {
        self.enter(VcsOp::BranchHead).await?;
        let state = self.state.lock().unwrap();
        state
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("branch {branch}")))
    }

    async fn create_branch(
        &self,
        _repo: &RepoId,
        name: &str,
        base_sha: &str,
    ) -> RemoteResult<Branch> {
        self.state
            .lock()
            .unwrap()
            .branch_attempts
            .push(name.to_string());
        self.enter(VcsOp::CreateBranch).await?;
        let mut state = self.state.lock().unwrap();
        if state.branches.contains_key(name) {
            return Err(RemoteError::Conflict(format!(
                "Reference refs/heads/{name} already exists"
            )));
        }
        state
            .branches
            .insert(name.to_string(), base_sha.to_string());
        // New branches see the files of the branch they forked from.
        let inherited: Vec<((String, String), FileContent)> = state
            .files
            .iter()
            .filter(|((branch, _), _)| {
                state.branches.get(branch).map(String::as_str) == Some(base_sha)
                    && branch != name
            })
            .map(|((_, path), file)| ((name.to_string(), path.clone()), file.clone()))
            .collect();
        state.files.extend(inherited);
        Ok(Branch {
            name: name.to_string(),
            head_sha: base_sha.to_string(),
        })
    }

    async fn put_file(&self, _repo: &RepoId, commit: FileCommit<'_>) -> RemoteResult<String> {
        self.enter(VcsOp::PutFile).await?;
        let mut state = self.state.lock().unwrap();
        if !state.branches.contains_key(commit.branch) {
            return Err(RemoteError::NotFound(format!("branch {}", commit.branch)));
        }
        let key = (commit.branch.to_string(), commit.path.to_string());
        let current = state.files.get(&key).map(|f| f.sha.clone());
        if current.as_deref() != commit.prior_sha {
            return Err(RemoteError::Conflict(format!(
                "{} does not match the current blob on {}",
                commit.path, commit.branch
            )));
        }
        state.seq += 1;
        let blob = format!("blob-{}", state.seq);
        let commit_sha = format!("commit-{}", state.seq);
        state.files.insert(
            key,
            FileContent {
                content: commit.content.to_string(),
                sha: blob,
            },
        );
        state
            .branches
            .insert(commit.branch.to_string(), commit_sha.clone());
        state.commit_messages.push(commit.message.to_string());
        Ok(commit_sha)
    }

    async fn create_pull_request(
        &self,
        repo: &RepoId,
        pr: NewPullRequest<'_>,
    ) -> RemoteResult<PullRequest> {
        self.enter(VcsOp::CreatePullRequest).await?;
        let mut state = self.state.lock().unwrap();
        if !state.branches.contains_key(pr.head) {
            return Err(RemoteError::NotFound(format!("branch {}", pr.head)));
        }
        if state.pulls.iter().any(|(head, _)| head == pr.head) {
            return Err(RemoteError::Conflict(format!(
                "A pull request already exists for {}",
                pr.head
            )));
        }
        let number = state.pulls.len() as u64 + 1;
        let created = PullRequest {
            number,
            html_url: state
                .pull_url_override
                .clone()
                .unwrap_or_else(|| format!("https://github.test/{repo}/pull/{number}")),
            api_url: format!("https://api.github.test/repos/{repo}/pulls/{number}"),
        };
        state.pulls.push((pr.head.to_string(), created.clone()));
        Ok(created)
    }

    async fn list_labels(&self, _repo: &RepoId) -> RemoteResult<Vec<String>> {
        self.enter(VcsOp::ListLabels).await?;
        Ok(self.state.lock().unwrap().labels.clone())
    }

    async fn create_label(&self, _repo: &RepoId, name: &str, _color: &str) -> RemoteResult<()> {
        self.enter(VcsOp::CreateLabel).await?;
        let mut state = self.state.lock().unwrap();
        if state.labels.iter().any(|l| l == name) {
            return Err(RemoteError::Conflict(format!("label {name} already exists")));
        }
        state.labels.push(name.to_string());
        Ok(())
    }

    async fn add_labels(&self, _repo: &RepoId, number: u64, labels: &[String]) -> RemoteResult<()> {
        self.enter(VcsOp::AddLabels).await?;
        let mut state = self.state.lock().unwrap();
        if !state.pulls.iter().any(|(_, pr)| pr.number == number) {
            return Err(RemoteError::NotFound(format!("issue #{number}")));
        }
        state
            .applied
            .entry(number)
            .or_default()
            .extend(labels.iter().cloned());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryCloudInventory
// ---------------------------------------------------------------------------

/// Operations of [`CloudInventory`], used to script and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InventoryOp {
    ListVpcs,
    ListSubnets,
    ListLoadBalancers,
    ListPolicySets,
    GetPolicySet,
}

#[derive(Debug, Default)]
struct InventoryState {
    calls: Vec<InventoryOp>,
    subnet_filters: Vec<Option<String>>,
    failures: HashMap<InventoryOp, RemoteError>,
    detail_failures: HashSet<String>,
    delays: HashMap<InventoryOp, Duration>,
}

/// In-memory cloud account.
#[derive(Debug, Default)]
pub struct MemoryCloudInventory {
    vpcs: Vec<VpcRecord>,
    subnets: Vec<SubnetRecord>,
    load_balancers: Vec<LoadBalancerRecord>,
    policy_sets: Vec<PolicySetDetail>,
    state: Mutex<InventoryState>,
}

impl MemoryCloudInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vpc(mut self, vpc: VpcRecord) -> Self {
        self.vpcs.push(vpc);
        self
    }

    pub fn with_subnet(mut self, subnet: SubnetRecord) -> Self {
        self.subnets.push(subnet);
        self
    }

    pub fn with_load_balancer(mut self, lb: LoadBalancerRecord) -> Self {
        self.load_balancers.push(lb);
        self
    }

    pub fn with_policy_set(mut self, detail: PolicySetDetail) -> Self {
        self.policy_sets.push(detail);
        self
    }

    /// Make every call to `op` fail with `err`.
    pub fn fail(&self, op: InventoryOp, err: RemoteError) {
        self.state.lock().unwrap().failures.insert(op, err);
    }

    /// Make the detail fetch for policy set `id` fail.
    pub fn fail_detail(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .detail_failures
            .insert(id.to_string());
    }

    /// Make every call to `op` sleep for `delay` before answering.
    pub fn delay(&self, op: InventoryOp, delay: Duration) {
        self.state.lock().unwrap().delays.insert(op, delay);
    }

    pub fn calls(&self, op: InventoryOp) -> usize {
        let state = self.state.lock().unwrap();
        state.calls.iter().filter(|c| **c == op).count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// VPC filters passed to `list_subnets`, in call order.
    pub fn subnet_filters(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().subnet_filters.clone()
    }

    async fn enter(&self, op: InventoryOp) -> RemoteResult<()> {
        let (delay, failure) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(op);
            (state.delays.get(&op).copied(), state.failures.get(&op).cloned())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CloudInventory for MemoryCloudInventory {
    async fn list_vpcs(&self) -> RemoteResult<Vec<VpcRecord>> {
        self.enter(InventoryOp::ListVpcs).await?;
        Ok(self.vpcs.clone())
    }

    async fn list_subnets(&self, vpc_id: Option<&str>) -> RemoteResult<Vec<SubnetRecord>> {
        self.state
            .lock()
            .unwrap()
            .subnet_filters
            .push(vpc_id.map(str::to_string));
        self.enter(InventoryOp::ListSubnets).await?;
        Ok(self
            .subnets
            .iter()
            .filter(|s| vpc_id.map_or(true, |id| s.vpc_id == id))
            .cloned()
            .collect())
    }

    async fn list_load_balancers(&self) -> RemoteResult<Vec<LoadBalancerRecord>> {
        self.enter(InventoryOp::ListLoadBalancers).await?;
        Ok(self.load_balancers.clone())
    }

    async fn list_policy_sets(&self) -> RemoteResult<Vec<PolicySetSummary>> {
        self.enter(InventoryOp::ListPolicySets).await?;
        Ok(self
            .policy_sets
            .iter()
            .map(|p| PolicySetSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                arn: format!("arn:aws:wafv2:us-east-1:000000000000:regional/webacl/{}/{}", p.name, p.id),
            })
            .collect())
    }

    async fn get_policy_set(&self, summary: &PolicySetSummary) -> RemoteResult<PolicySetDetail> {
        self.enter(InventoryOp::GetPolicySet).await?;
        if self
            .state
            .lock()
            .unwrap()
            .detail_failures
            .contains(&summary.id)
        {
            return Err(RemoteError::permission_denied(
                "AccessDeniedException",
                format!("not authorized to read web ACL {}", summary.id),
            ));
        }
        self.policy_sets
            .iter()
            .find(|p| p.id == summary.id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("policy set {}", summary.id)))
    }
}
