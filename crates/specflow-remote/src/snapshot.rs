//! File-backed [`CloudInventory`] reading exported describe/list responses.
//!
//! Layout of a snapshot directory:
//!
//! ```text
//! vpcs.json                   {"Vpcs": [...]}
//! subnets.json                {"Subnets": [...]}
//! load_balancers.json         {"LoadBalancers": [...]}
//! firewall_policy_sets.json   {"WebACLs": [...]}
//! firewall_policy_sets/<id>.json  {"WebACL": {...}}
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};
use crate::inventory::*;

/// Inventory served from a directory of JSON exports.
#[derive(Debug, Clone)]
pub struct SnapshotInventory {
    root: PathBuf,
}

impl SnapshotInventory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read `rel` and deserialize the value stored under `key`.
    async fn load<T: DeserializeOwned>(&self, rel: &Path, key: &str) -> RemoteResult<T> {
        let path = self.root.join(rel);
        let raw = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => RemoteError::NotFound(path.display().to_string()),
            ErrorKind::PermissionDenied => {
                RemoteError::permission_denied("AccessDenied", format!("{}: {e}", path.display()))
            }
            _ => RemoteError::upstream("IoError", format!("{}: {e}", path.display())),
        })?;
        debug!(path = %path.display(), bytes = raw.len(), "read inventory snapshot");

        let mut doc: Value = serde_json::from_slice(&raw).map_err(|e| {
            RemoteError::upstream("MalformedSnapshot", format!("{}: {e}", path.display()))
        })?;
        let section = doc.get_mut(key).map(Value::take).ok_or_else(|| {
            RemoteError::upstream(
                "MalformedSnapshot",
                format!("{} has no '{key}' key", path.display()),
            )
        })?;
        serde_json::from_value(section).map_err(|e| {
            RemoteError::upstream("MalformedSnapshot", format!("{}: {key}: {e}", path.display()))
        })
    }
}

#[async_trait]
impl CloudInventory for SnapshotInventory {
    async fn list_vpcs(&self) -> RemoteResult<Vec<VpcRecord>> {
        self.load(Path::new("vpcs.json"), "Vpcs").await
    }

    async fn list_subnets(&self, vpc_id: Option<&str>) -> RemoteResult<Vec<SubnetRecord>> {
        let subnets: Vec<SubnetRecord> = self.load(Path::new("subnets.json"), "Subnets").await?;
        Ok(match vpc_id {
            Some(id) => subnets.into_iter().filter(|s| s.vpc_id == id).collect(),
            None => subnets,
        })
    }

    async fn list_load_balancers(&self) -> RemoteResult<Vec<LoadBalancerRecord>> {
        self.load(Path::new("load_balancers.json"), "LoadBalancers")
            .await
    }

    async fn list_policy_sets(&self) -> RemoteResult<Vec<PolicySetSummary>> {
        self.load(Path::new("firewall_policy_sets.json"), "WebACLs")
            .await
    }

    async fn get_policy_set(&self, summary: &PolicySetSummary) -> RemoteResult<PolicySetDetail> {
        let id = summary.id.as_str();
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(RemoteError::NotFound(format!("policy set {id}")));
        }
        let rel = Path::new("firewall_policy_sets").join(format!("{id}.json"));
        self.load(&rel, "WebACL").await
    }
}
