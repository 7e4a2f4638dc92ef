//! Discovery service tests against the in-memory inventory fake.

use std::time::Duration;

use serde_json::json;
use specflow_core::{
    Category, DiscoveryConfig, DiscoveryRequest, DiscoveryService, ResourceAttributes,
};
use specflow_remote::fakes::{InventoryOp, MemoryCloudInventory};
use specflow_remote::{
    LoadBalancerRecord, LoadBalancerState, PolicyRule, PolicySetDetail, RemoteError,
    SubnetRecord, Tag, VpcRecord,
};
use tracing_test::traced_test;

fn vpc(id: &str, name: Option<&str>) -> VpcRecord {
    VpcRecord {
        vpc_id: id.to_string(),
        cidr_block: "10.0.0.0/16".to_string(),
        is_default: false,
        tags: name.map(|n| vec![Tag::new("Name", n)]).unwrap_or_default(),
    }
}

fn subnet(id: &str, vpc_id: &str, name: &str) -> SubnetRecord {
    SubnetRecord {
        subnet_id: id.to_string(),
        vpc_id: vpc_id.to_string(),
        cidr_block: "10.0.1.0/24".to_string(),
        availability_zone: "us-east-1a".to_string(),
        tags: vec![Tag::new("Name", name)],
    }
}

fn load_balancer(name: &str, kind: &str) -> LoadBalancerRecord {
    LoadBalancerRecord {
        load_balancer_arn: format!("arn:aws:elasticloadbalancing:us-east-1:1:loadbalancer/{name}"),
        load_balancer_name: name.to_string(),
        dns_name: format!("{name}.elb.amazonaws.com"),
        vpc_id: "vpc-1".to_string(),
        kind: kind.to_string(),
        state: Some(LoadBalancerState {
            code: "active".to_string(),
        }),
    }
}

fn policy_set(id: &str, managed: usize, custom: usize) -> PolicySetDetail {
    let mut rules = Vec::new();
    for i in 0..managed {
        rules.push(PolicyRule {
            name: format!("managed-{i}"),
            statement: json!({"ManagedRuleGroupStatement": {"VendorName": "AWS"}}),
        });
    }
    for i in 0..custom {
        rules.push(PolicyRule {
            name: format!("custom-{i}"),
            statement: json!({"RateBasedStatement": {"Limit": 100}}),
        });
    }
    PolicySetDetail {
        id: id.to_string(),
        name: format!("{id}-acl"),
        rules,
    }
}

fn service(inventory: MemoryCloudInventory) -> DiscoveryService<MemoryCloudInventory> {
    DiscoveryService::new(inventory, DiscoveryConfig::from_env().with_call_timeout_secs(5))
}

fn populated() -> MemoryCloudInventory {
    MemoryCloudInventory::new()
        .with_vpc(vpc("vpc-2", Some("staging")))
        .with_vpc(vpc("vpc-1", Some("production")))
        .with_vpc(vpc("vpc-3", None))
        .with_subnet(subnet("subnet-a", "vpc-1", "public-a"))
        .with_subnet(subnet("subnet-b", "vpc-2", "public-b"))
        .with_load_balancer(load_balancer("web", "application"))
        .with_load_balancer(load_balancer("tcp-edge", "network"))
        .with_load_balancer(load_balancer("api", "application"))
        .with_policy_set(policy_set("acl-1", 2, 1))
}

#[tokio::test]
async fn discovers_every_category_by_default() {
    let service = service(populated());

    let result = service.discover(&DiscoveryRequest::all()).await;

    assert_eq!(result.len(), 4);
    assert_eq!(result[&Category::Vpcs].len(), 3);
    assert_eq!(result[&Category::Subnets].len(), 2);
    assert_eq!(result[&Category::LoadBalancers].len(), 2);
    assert_eq!(result[&Category::FirewallPolicySets].len(), 1);
}

#[tokio::test]
async fn results_sort_by_display_name_with_unnamed_sentinel() {
    let service = service(populated());

    let result = service.discover(&DiscoveryRequest::all()).await;

    let names: Vec<&str> = result[&Category::Vpcs]
        .iter()
        .map(|r| r.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["production", "staging", "unnamed"]);
    assert_eq!(result[&Category::Vpcs][2].id, "vpc-3");
}

#[tokio::test]
async fn only_application_load_balancers_survive() {
    let service = service(populated());

    let result = service
        .discover(&DiscoveryRequest::parse(Some("alb"), None).unwrap())
        .await;

    let lbs = &result[&Category::LoadBalancers];
    let names: Vec<&str> = lbs.iter().map(|r| r.display_name.as_str()).collect();
    assert_eq!(names, vec!["api", "web"]);
    match &lbs[1].category_attributes {
        ResourceAttributes::LoadBalancer {
            dns_name, state, ..
        } => {
            assert_eq!(dns_name, "web.elb.amazonaws.com");
            assert_eq!(state, "active");
        }
        other => panic!("unexpected attributes {other:?}"),
    }
}

#[tokio::test]
async fn policy_sets_report_managed_rule_count() {
    let service = service(populated());

    let result = service
        .discover(&DiscoveryRequest::parse(Some("waf"), None).unwrap())
        .await;

    match &result[&Category::FirewallPolicySets][0].category_attributes {
        ResourceAttributes::FirewallPolicySet {
            scope,
            managed_rule_count,
            ..
        } => {
            assert_eq!(scope, "REGIONAL");
            assert_eq!(*managed_rule_count, 2);
        }
        other => panic!("unexpected attributes {other:?}"),
    }
}

#[traced_test]
#[tokio::test]
async fn failed_detail_fetch_keeps_entry_with_zero_count() {
    let inventory = populated().with_policy_set(policy_set("acl-2", 3, 0));
    inventory.fail_detail("acl-2");
    let service = service(inventory);

    let result = service
        .discover(&DiscoveryRequest::parse(Some("firewall_policy_sets"), None).unwrap())
        .await;

    let sets = &result[&Category::FirewallPolicySets];
    assert_eq!(sets.len(), 2);
    let failed = sets.iter().find(|r| r.id == "acl-2").unwrap();
    assert!(matches!(
        failed.category_attributes,
        ResourceAttributes::FirewallPolicySet {
            managed_rule_count: 0,
            ..
        }
    ));
    assert!(logs_contain("policy set detail fetch failed"));
}

#[traced_test]
#[tokio::test]
async fn permission_denied_degrades_only_that_category() {
    let inventory = populated();
    inventory.fail(
        InventoryOp::ListVpcs,
        RemoteError::permission_denied("UnauthorizedOperation", "not authorized to DescribeVpcs"),
    );
    let service = service(inventory);

    let result = service
        .discover(&DiscoveryRequest::parse(Some("vpcs,subnets"), None).unwrap())
        .await;

    assert!(result[&Category::Vpcs].is_empty());
    assert_eq!(result[&Category::Subnets].len(), 2);
    assert!(logs_contain("discovery.category_failed"));
    assert!(logs_contain("UnauthorizedOperation"));
}

#[tokio::test]
async fn unrequested_categories_are_never_queried() {
    let service = service(populated());

    let result = service
        .discover(&DiscoveryRequest::parse(Some("subnets"), None).unwrap())
        .await;

    assert_eq!(result.keys().copied().collect::<Vec<_>>(), vec![Category::Subnets]);
    let inventory = service.inventory();
    assert_eq!(inventory.calls(InventoryOp::ListSubnets), 1);
    assert_eq!(inventory.calls(InventoryOp::ListVpcs), 0);
    assert_eq!(inventory.calls(InventoryOp::ListLoadBalancers), 0);
    assert_eq!(inventory.calls(InventoryOp::ListPolicySets), 0);
    assert_eq!(inventory.total_calls(), 1);
}

#[tokio::test]
async fn parent_filter_scopes_subnet_query() {
    let service = service(populated());

    let result = service
        .discover(&DiscoveryRequest::parse(Some("subnets"), Some("vpc-1")).unwrap())
        .await;

    assert_eq!(
        service.inventory().subnet_filters(),
        vec![Some("vpc-1".to_string())]
    );
    let subnets = &result[&Category::Subnets];
    assert_eq!(subnets.len(), 1);
    assert_eq!(subnets[0].id, "subnet-a");
}

#[tokio::test(start_paused = true)]
async fn slow_category_times_out_and_degrades() {
    let inventory = populated();
    inventory.delay(InventoryOp::ListLoadBalancers, Duration::from_secs(60));
    let service = service(inventory);

    let result = service.discover(&DiscoveryRequest::all()).await;

    assert!(result[&Category::LoadBalancers].is_empty());
    assert_eq!(result[&Category::Vpcs].len(), 3);
}

#[tokio::test]
async fn failed_and_empty_categories_share_one_shape() {
    let inventory = MemoryCloudInventory::new();
    inventory.fail(
        InventoryOp::ListSubnets,
        RemoteError::upstream("Throttling", "Rate exceeded"),
    );
    let service = service(inventory);

    let result = service
        .discover(&DiscoveryRequest::parse(Some("vpcs,subnets"), None).unwrap())
        .await;

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json, json!({"vpcs": [], "subnets": []}));
}
