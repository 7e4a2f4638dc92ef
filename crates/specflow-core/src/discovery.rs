//! Resource discovery.
//!
//! Queries each requested category of cloud resources independently and
//! concurrently. A failing category degrades to an empty list plus a warn
//! log carrying the upstream error code; sibling categories are unaffected
//! and the payload shape never changes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::str::FromStr;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use specflow_remote::{
    name_tag, CloudInventory, PolicySetSummary, RemoteError, RemoteResult,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::DiscoveryConfig;
use crate::metrics::METRICS;
use crate::obs;
use crate::orchestrator::ErrorCategory;

/// Display name used when a resource carries no name.
pub const UNNAMED: &str = "unnamed";

/// Policy sets are queried in regional scope only.
pub const POLICY_SET_SCOPE: &str = "REGIONAL";

/// Discovery categories, keyed by their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Vpcs,
    Subnets,
    LoadBalancers,
    FirewallPolicySets,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Vpcs,
        Category::Subnets,
        Category::LoadBalancers,
        Category::FirewallPolicySets,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            Category::Vpcs => "vpcs",
            Category::Subnets => "subnets",
            Category::LoadBalancers => "load_balancers",
            Category::FirewallPolicySets => "firewall_policy_sets",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Category {
    type Err = DiscoveryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "vpcs" | "vpc" => Ok(Category::Vpcs),
            "subnets" | "subnet" => Ok(Category::Subnets),
            "load_balancers" | "load_balancer" | "alb" | "albs" => Ok(Category::LoadBalancers),
            "firewall_policy_sets" | "firewall_policy_set" | "waf" => {
                Ok(Category::FirewallPolicySets)
            }
            _ => Err(DiscoveryError::UnknownCategory(raw.trim().to_string())),
        }
    }
}

/// Discovery request validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("unknown discovery category '{0}' (expected vpcs, subnets, load_balancers, firewall_policy_sets or all)")]
    UnknownCategory(String),

    #[error("parent_filter must not be blank")]
    BlankParentFilter,
}

impl DiscoveryError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::InputValidation
    }
}

/// Which categories to query, and an optional parent VPC for subnets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub categories: BTreeSet<Category>,
    pub parent_filter: Option<String>,
}

impl Default for DiscoveryRequest {
    fn default() -> Self {
        Self::all()
    }
}

impl DiscoveryRequest {
    /// Every category, no parent filter.
    pub fn all() -> Self {
        Self {
            categories: Category::ALL.into_iter().collect(),
            parent_filter: None,
        }
    }

    /// Build from wire names. No names (or `all`) selects every category.
    pub fn from_names<I, S>(names: I, parent_filter: Option<&str>) -> Result<Self, DiscoveryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut categories = BTreeSet::new();
        let mut everything = false;
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if name.eq_ignore_ascii_case("all") {
                everything = true;
            } else {
                categories.insert(name.parse::<Category>()?);
            }
        }
        if everything || categories.is_empty() {
            categories = Category::ALL.into_iter().collect();
        }

        let parent_filter = match parent_filter {
            Some(p) if p.trim().is_empty() => return Err(DiscoveryError::BlankParentFilter),
            Some(p) => Some(p.trim().to_string()),
            None => None,
        };

        Ok(Self {
            categories,
            parent_filter,
        })
    }

    /// Parse a comma separated list such as `vpcs,subnets`.
    pub fn parse(categories: Option<&str>, parent_filter: Option<&str>) -> Result<Self, DiscoveryError> {
        Self::from_names(categories.unwrap_or_default().split(','), parent_filter)
    }
}

/// Category-specific attributes of a discovered resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceAttributes {
    Subnet {
        vpc_id: String,
        cidr: String,
        availability_zone: String,
    },
    Vpc {
        cidr: String,
        is_default: bool,
    },
    LoadBalancer {
        arn: String,
        dns_name: String,
        vpc_id: String,
        state: String,
    },
    FirewallPolicySet {
        arn: String,
        scope: String,
        managed_rule_count: usize,
    },
}

/// One normalized resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredResource {
    pub id: String,
    pub display_name: String,
    pub category_attributes: ResourceAttributes,
}

/// Result of a discovery call: one list per requested category.
pub type DiscoveryResult = BTreeMap<Category, Vec<DiscoveredResource>>;

fn display_name(name: Option<&str>) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(UNNAMED)
        .to_string()
}

/// Read-only discovery over a [`CloudInventory`] capability.
pub struct DiscoveryService<C> {
    inventory: C,
    config: DiscoveryConfig,
}

impl<C: CloudInventory> DiscoveryService<C> {
    pub fn new(inventory: C, config: DiscoveryConfig) -> Self {
        Self { inventory, config }
    }

    pub fn inventory(&self) -> &C {
        &self.inventory
    }

    /// Query every requested category. Never fails: a category whose query
    /// fails is returned as an empty list.
    pub async fn discover(&self, request: &DiscoveryRequest) -> DiscoveryResult {
        let parent = request.parent_filter.as_deref();
        let (vpcs, subnets, load_balancers, policy_sets) = futures::join!(
            self.run_category(request, Category::Vpcs, || self.vpcs()),
            self.run_category(request, Category::Subnets, || self.subnets(parent)),
            self.run_category(request, Category::LoadBalancers, || self.load_balancers()),
            self.run_category(request, Category::FirewallPolicySets, || self.policy_sets()),
        );

        let result: DiscoveryResult = [
            (Category::Vpcs, vpcs),
            (Category::Subnets, subnets),
            (Category::LoadBalancers, load_balancers),
            (Category::FirewallPolicySets, policy_sets),
        ]
        .into_iter()
        .filter_map(|(category, list)| list.map(|l| (category, l)))
        .collect();

        debug!(
            categories = result.len(),
            resources = result.values().map(Vec::len).sum::<usize>(),
            "discovery finished"
        );
        result
    }

    async fn run_category<F, Fut>(
        &self,
        request: &DiscoveryRequest,
        category: Category,
        query: F,
    ) -> Option<Vec<DiscoveredResource>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RemoteResult<Vec<DiscoveredResource>>>,
    {
        if !request.categories.contains(&category) {
            return None;
        }
        match query().await {
            Ok(mut resources) => {
                resources.sort_by(|a, b| {
                    a.display_name
                        .cmp(&b.display_name)
                        .then_with(|| a.id.cmp(&b.id))
                });
                Some(resources)
            }
            Err(e) => {
                METRICS.inc_degraded_categories();
                obs::emit_discovery_category_failed(category.wire_name(), e.code(), &e);
                Some(Vec::new())
            }
        }
    }

    async fn vpcs(&self) -> RemoteResult<Vec<DiscoveredResource>> {
        let records = self
            .bounded("list_vpcs", self.inventory.list_vpcs())
            .await?;
        Ok(records
            .into_iter()
            .map(|vpc| DiscoveredResource {
                display_name: display_name(name_tag(&vpc.tags)),
                id: vpc.vpc_id,
                category_attributes: ResourceAttributes::Vpc {
                    cidr: vpc.cidr_block,
                    is_default: vpc.is_default,
                },
            })
            .collect())
    }

    async fn subnets(&self, vpc_id: Option<&str>) -> RemoteResult<Vec<DiscoveredResource>> {
        let records = self
            .bounded("list_subnets", self.inventory.list_subnets(vpc_id))
            .await?;
        Ok(records
            .into_iter()
            .map(|subnet| DiscoveredResource {
                display_name: display_name(name_tag(&subnet.tags)),
                id: subnet.subnet_id,
                category_attributes: ResourceAttributes::Subnet {
                    vpc_id: subnet.vpc_id,
                    cidr: subnet.cidr_block,
                    availability_zone: subnet.availability_zone,
                },
            })
            .collect())
    }

    /// Only application-layer balancers survive normalization.
    async fn load_balancers(&self) -> RemoteResult<Vec<DiscoveredResource>> {
        let records = self
            .bounded("list_load_balancers", self.inventory.list_load_balancers())
            .await?;
        Ok(records
            .into_iter()
            .filter(|lb| lb.kind.eq_ignore_ascii_case("application"))
            .map(|lb| DiscoveredResource {
                display_name: display_name(Some(&lb.load_balancer_name)),
                id: lb.load_balancer_arn.clone(),
                category_attributes: ResourceAttributes::LoadBalancer {
                    arn: lb.load_balancer_arn,
                    dns_name: lb.dns_name,
                    vpc_id: lb.vpc_id,
                    state: lb
                        .state
                        .map(|s| s.code)
                        .unwrap_or_else(|| "unknown".to_string()),
                },
            })
            .collect())
    }

    async fn policy_sets(&self) -> RemoteResult<Vec<DiscoveredResource>> {
        let summaries = self
            .bounded("list_policy_sets", self.inventory.list_policy_sets())
            .await?;
        let counts = join_all(summaries.iter().map(|s| self.managed_rule_count(s))).await;
        Ok(summaries
            .into_iter()
            .zip(counts)
            .map(|(set, managed_rule_count)| DiscoveredResource {
                display_name: display_name(Some(&set.name)),
                id: set.id,
                category_attributes: ResourceAttributes::FirewallPolicySet {
                    arn: set.arn,
                    scope: POLICY_SET_SCOPE.to_string(),
                    managed_rule_count,
                },
            })
            .collect())
    }

    /// A failed detail fetch reports zero managed rules instead of dropping the set.
    async fn managed_rule_count(&self, summary: &PolicySetSummary) -> usize {
        match self
            .bounded("get_policy_set", self.inventory.get_policy_set(summary))
            .await
        {
            Ok(detail) => detail.managed_rule_count(),
            Err(e) => {
                warn!(
                    policy_set = %summary.id,
                    error_code = %e.code(),
                    error = %e,
                    "policy set detail fetch failed, reporting 0 managed rules"
                );
                0
            }
        }
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
