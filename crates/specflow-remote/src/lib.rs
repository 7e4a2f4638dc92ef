//! Specflow-Remote: remote capabilities for specflow
//!
//! The change pipeline and the discovery service never talk to a network
//! client directly. They receive one of the capabilities defined here, which
//! keeps both testable with substitute implementations.
//!
//! ## Layer 0 - Remote capabilities
//!
//! - `VersionControl`: hosted git API (files, branches, pull requests, labels)
//! - `CloudInventory`: read-only cloud resource queries
//! - `RemoteError`: the not-found / permission-denied / conflict / upstream taxonomy
//!
//! In-memory fakes are provided in [`fakes`]; [`SnapshotInventory`] serves
//! inventory from exported JSON.

mod error;
pub mod fakes;
pub mod inventory;
pub mod snapshot;
pub mod vcs;

pub use error::{RemoteError, RemoteResult};
pub use inventory::{
    name_tag, CloudInventory, LoadBalancerRecord, LoadBalancerState, PolicyRule,
    PolicySetDetail, PolicySetSummary, SubnetRecord, Tag, VpcRecord,
};
pub use snapshot::SnapshotInventory;
pub use vcs::{
    Branch, FileCommit, FileContent, InvalidRepoId, NewPullRequest, PullRequest, RepoId,
    VersionControl,
};
