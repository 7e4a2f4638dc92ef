//! Cloud resource inventory capability.
//!
//! Records mirror the shape of the provider's describe/list responses
//! (PascalCase keys) so exported JSON can be deserialized directly. They are
//! raw: normalization, filtering and sorting happen in the discovery service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RemoteResult;

/// A resource tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl Tag {
    pub fn new(key: &str, value: &str) -> Self {
        Tag {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Value of the `Name` tag, if any.
pub fn name_tag(tags: &[Tag]) -> Option<&str> {
    tags.iter()
        .find(|t| t.key == "Name")
        .map(|t| t.value.as_str())
        .filter(|v| !v.is_empty())
}

/// A network boundary (VPC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcRecord {
    pub vpc_id: String,
    pub cidr_block: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// A subnetwork inside a VPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetRecord {
    pub subnet_id: String,
    pub vpc_id: String,
    pub cidr_block: String,
    pub availability_zone: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadBalancerState {
    pub code: String,
}

/// A load balancer of any layer (`application`, `network`, `gateway`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadBalancerRecord {
    pub load_balancer_arn: String,
    pub load_balancer_name: String,
    #[serde(rename = "DNSName", default)]
    pub dns_name: String,
    #[serde(default)]
    pub vpc_id: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(default)]
    pub state: Option<LoadBalancerState>,
}

/// Entry of a firewall policy set listing (WAF web ACL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicySetSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "ARN", default)]
    pub arn: String,
}

/// One rule of a firewall policy set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyRule {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub statement: Value,
}

impl PolicyRule {
    /// Whether the rule delegates to a provider-managed rule group.
    pub fn is_managed(&self) -> bool {
        self.statement.get("ManagedRuleGroupStatement").is_some()
    }
}

/// Full firewall policy set, as returned by the per-set detail call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicySetDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

impl PolicySetDetail {
    pub fn managed_rule_count(&self) -> usize {
        self.rules.iter().filter(|r| r.is_managed()).count()
    }
}

/// Read-only cloud resource queries, scoped to the caller's account and region.
#[async_trait]
pub trait CloudInventory: Send + Sync {
    async fn list_vpcs(&self) -> RemoteResult<Vec<VpcRecord>>;

    /// List subnets, optionally restricted to one VPC.
    async fn list_subnets(&self, vpc_id: Option<&str>) -> RemoteResult<Vec<SubnetRecord>>;

    /// List load balancers of every layer; callers filter.
    async fn list_load_balancers(&self) -> RemoteResult<Vec<LoadBalancerRecord>>;

    /// List regional firewall policy sets.
    async fn list_policy_sets(&self) -> RemoteResult<Vec<PolicySetSummary>>;

    /// Fetch the rules of one policy set.
    async fn get_policy_set(&self, summary: &PolicySetSummary) -> RemoteResult<PolicySetDetail>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_balancer_deserializes_provider_shape() {
        let raw = json!({
            "LoadBalancerArn": "arn:aws:elasticloadbalancing:us-east-1:1:loadbalancer/app/web/1",
            "LoadBalancerName": "web",
            "DNSName": "web-1.elb.amazonaws.com",
            "VpcId": "vpc-1",
            "Type": "application",
            "State": {"Code": "active"}
        });
        let lb: LoadBalancerRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(lb.kind, "application");
        assert_eq!(lb.dns_name, "web-1.elb.amazonaws.com");
        assert_eq!(lb.state.unwrap().code, "active");
    }

    #[test]
    fn managed_rule_count_only_counts_managed_statements() {
        let detail = PolicySetDetail {
            id: "1".into(),
            name: "edge".into(),
            rules: vec![
                PolicyRule {
                    name: "common".into(),
                    statement: json!({"ManagedRuleGroupStatement": {"Name": "AWSManagedRulesCommonRuleSet"}}),
                },
                PolicyRule {
                    name: "rate".into(),
                    statement: json!({"RateBasedStatement": {"Limit": 100}}),
                },
            ],
        };
        assert_eq!(detail.managed_rule_count(), 1);
    }

    #[test]
    fn name_tag_ignores_other_keys_and_empty_values() {
        let tags = vec![Tag::new("env", "prod"), Tag::new("Name", "")];
        assert_eq!(name_tag(&tags), None);
        let tags = vec![Tag::new("Name", "main-vpc")];
        assert_eq!(name_tag(&tags), Some("main-vpc"));
    }
}
