//! Specflow Core Library
//!
//! Infrastructure change review: classify the risk of a spec change, open a
//! pull request that carries the risk summary, and discover existing cloud
//! resources for spec authors.
//!
//! ## Layer 1 - Domain and pipelines
//!
//! - [`classify()`]: pure rule-table diff of two specs into [`ChangeWarning`]s
//! - [`render_pr_body`]: markdown narrative for the pull request
//! - [`SpecApplier`]: branch, commit, pull request, best-effort labels
//! - [`DiscoveryService`]: per-category discovery with graceful degradation

pub mod best_effort;
pub mod classify;
pub mod config;
pub mod discovery;
pub mod domain;
pub mod metrics;
pub mod narrative;
pub mod obs;
pub mod orchestrator;
pub mod telemetry;

/// Crate version, reported by the binaries.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use best_effort::BestEffort;
pub use classify::{classify, classify_with, ChangeRule, ChangeRuleSet};
pub use config::{parse_label_list, ApplierConfig, DiscoveryConfig};
pub use discovery::{
    Category, DiscoveredResource, DiscoveryError, DiscoveryRequest, DiscoveryResult,
    DiscoveryService, ResourceAttributes,
};
pub use domain::{ChangeWarning, Severity, Spec, SpecError};
pub use metrics::METRICS;
pub use narrative::{render_pr_body, render_pr_title, NO_WARNINGS_SENTINEL};
pub use orchestrator::{
    validate_spec_path, ApplyError, ApplyFailure, ApplyOutcome, ApplyRequest, ApplyStage,
    ErrorCategory, SpecApplier,
};
pub use telemetry::init_tracing;

pub use specflow_remote::{
    CloudInventory, RemoteError, RemoteResult, RepoId, SnapshotInventory, VersionControl,
};
