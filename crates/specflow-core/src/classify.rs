//! Change classifier.
//!
//! Diffs two [`Spec`] snapshots against an ordered [`ChangeRuleSet`] and
//! produces one [`ChangeWarning`] per rule that fires. Output order is rule
//! declaration order. The classifier is pure: no I/O, no clock, no state.
//!
//! Values are compared semantically. Numbers compare numerically (`3` and
//! `3.0` are equal), strings are trimmed, and lists compare as sets, so key
//! order, whitespace and numeric formatting never produce a warning.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::spec::lookup;
use crate::domain::{ChangeWarning, Severity, Spec};

/// Size tiers, smallest first. Unknown sizes rank with the smallest.
const SIZE_ORDER: [&str; 4] = ["demo", "small", "medium", "large"];

const DEFAULT_SHUTDOWN_HOURS: u64 = 24;

/// A single change rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRule {
    WafDisabled,
    WafModeDowngraded,
    WafRulesetsRemoved,
    EncryptionAtRestDisabled,
    EncryptionInTransitDisabled,
    ComputeSizeReduced,
    ComputeMaxReduced,
    ComputeMinReduced,
    DataEngineRemoved,
    DataEngineChanged,
    DataSizeReduced,
    HighAvailabilityDisabled,
    BackupRetentionReduced,
    VpcChanged,
    PublicAccessDisabled,
    SubnetsRemoved,
    AutoShutdownEnabled,
    MonthlySpendReduced,
}

impl ChangeRule {
    /// Every rule, in declaration order.
    pub const ALL: [ChangeRule; 18] = [
        ChangeRule::WafDisabled,
        ChangeRule::WafModeDowngraded,
        ChangeRule::WafRulesetsRemoved,
        ChangeRule::EncryptionAtRestDisabled,
        ChangeRule::EncryptionInTransitDisabled,
        ChangeRule::ComputeSizeReduced,
        ChangeRule::ComputeMaxReduced,
        ChangeRule::ComputeMinReduced,
        ChangeRule::DataEngineRemoved,
        ChangeRule::DataEngineChanged,
        ChangeRule::DataSizeReduced,
        ChangeRule::HighAvailabilityDisabled,
        ChangeRule::BackupRetentionReduced,
        ChangeRule::VpcChanged,
        ChangeRule::PublicAccessDisabled,
        ChangeRule::SubnetsRemoved,
        ChangeRule::AutoShutdownEnabled,
        ChangeRule::MonthlySpendReduced,
    ];

    /// Field the rule inspects, reported as the warning's `field_path`.
    pub fn field_path(self) -> &'static str {
        match self {
            ChangeRule::WafDisabled => "spec.security.waf.enabled",
            ChangeRule::WafModeDowngraded => "spec.security.waf.mode",
            ChangeRule::WafRulesetsRemoved => "spec.security.waf.rulesets",
            ChangeRule::EncryptionAtRestDisabled => "spec.security.encryption.atRest",
            ChangeRule::EncryptionInTransitDisabled => "spec.security.encryption.inTransit",
            ChangeRule::ComputeSizeReduced => "spec.compute.size",
            ChangeRule::ComputeMaxReduced => "spec.compute.scaling.max",
            ChangeRule::ComputeMinReduced => "spec.compute.scaling.min",
            ChangeRule::DataEngineRemoved | ChangeRule::DataEngineChanged => "spec.data.engine",
            ChangeRule::DataSizeReduced => "spec.data.size",
            ChangeRule::HighAvailabilityDisabled => "spec.data.highAvailability",
            ChangeRule::BackupRetentionReduced => "spec.data.backupRetention",
            ChangeRule::VpcChanged => "spec.network.vpc",
            ChangeRule::PublicAccessDisabled => "spec.network.publicAccess",
            ChangeRule::SubnetsRemoved => "spec.network.subnets",
            ChangeRule::AutoShutdownEnabled => "spec.governance.autoShutdown.enabled",
            ChangeRule::MonthlySpendReduced => "spec.governance.maxMonthlySpend",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            ChangeRule::DataEngineRemoved | ChangeRule::DataEngineChanged => Severity::Critical,
            ChangeRule::AutoShutdownEnabled | ChangeRule::MonthlySpendReduced => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

/// An ordered set of change rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeRuleSet {
    pub rules: Vec<ChangeRule>,
}

impl Default for ChangeRuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl ChangeRuleSet {
    /// Every rule in declaration order.
    pub fn standard() -> Self {
        Self {
            rules: ChangeRule::ALL.to_vec(),
        }
    }

    /// An empty set, to be filled with [`with_rule`](Self::with_rule).
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule to this set (builder pattern).
    pub fn with_rule(mut self, rule: ChangeRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Classify the change from `old` to `new` with the standard rule set.
///
/// `old == None` marks a first submission: only informational rules run,
/// against an empty previous tree.
pub fn classify(old: Option<&Spec>, new: &Spec) -> Vec<ChangeWarning> {
    classify_with(&ChangeRuleSet::standard(), old, new)
}

/// Classify with an explicit rule set.
pub fn classify_with(
    rule_set: &ChangeRuleSet,
    old: Option<&Spec>,
    new: &Spec,
) -> Vec<ChangeWarning> {
    let empty = Spec::empty();
    let first_submission = old.is_none();
    let ctx = Snapshots {
        old: old.unwrap_or(&empty).as_value(),
        new: new.as_value(),
    };

    rule_set
        .rules
        .iter()
        .filter(|rule| !first_submission || rule.severity() == Severity::Info)
        .filter_map(|&rule| {
            check_rule(rule, &ctx).map(|message| ChangeWarning {
                severity: rule.severity(),
                message,
                field_path: rule.field_path().to_string(),
            })
        })
        .collect()
}

struct Snapshots<'a> {
    old: &'a Value,
    new: &'a Value,
}

impl<'a> Snapshots<'a> {
    fn before(&self, path: &str) -> Option<&'a Value> {
        lookup(self.old, path).filter(|v| !v.is_null())
    }

    fn after(&self, path: &str) -> Option<&'a Value> {
        lookup(self.new, path).filter(|v| !v.is_null())
    }

    /// Section rules only run when the previous snapshot had the section.
    fn old_has(&self, section: &str) -> bool {
        self.before(section).map(truthy).unwrap_or(false)
    }

    fn both_have(&self, section: &str) -> bool {
        self.old_has(section) && self.after(section).map(truthy).unwrap_or(false)
    }

    fn flag_turned_off(&self, path: &str) -> bool {
        self.before(path).map(truthy).unwrap_or(false) && !self.after(path).map(truthy).unwrap_or(false)
    }

    fn flag_turned_off_default_on(&self, path: &str) -> bool {
        self.before(path).map(truthy).unwrap_or(true) && !self.after(path).map(truthy).unwrap_or(true)
    }

    fn number_pair(&self, path: &str) -> Option<(f64, f64)> {
        let old = self.before(path).and_then(as_number)?;
        let new = self.after(path).and_then(as_number)?;
        (old != 0.0 && new != 0.0).then_some((old, new))
    }

    fn text_pair(&self, path: &str) -> (Option<&'a str>, Option<&'a str>) {
        (
            self.before(path).and_then(as_text),
            self.after(path).and_then(as_text),
        )
    }

    fn removed_members(&self, path: &str) -> Vec<String> {
        let old = members(self.before(path));
        let new = members(self.after(path));
        old.difference(&new).cloned().collect()
    }
}

/// YAML-style truthiness: null, false, zero, blank strings and empty
/// collections are false. YAML 1.1 boolean words (`off`, `no`, `n`, ...)
/// are read as booleans even though the parser keeps them as strings.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => yaml11_bool(s).unwrap_or_else(|| !s.trim().is_empty()),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn yaml11_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "on" => Some(true),
        "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn members(value: Option<&Value>) -> BTreeSet<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(member_key).collect(),
        Some(other) => member_key(other).into_iter().collect(),
        None => BTreeSet::new(),
    }
}

fn member_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(format_number(n.as_f64().unwrap_or_default())),
        other => Some(other.to_string()),
    }
}

fn size_rank(size: &str) -> usize {
    SIZE_ORDER
        .iter()
        .position(|s| s.eq_ignore_ascii_case(size))
        .unwrap_or(0)
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn size_reduced(ctx: &Snapshots, path: &str) -> Option<(String, String)> {
    match ctx.text_pair(path) {
        (Some(old), Some(new)) if size_rank(new) < size_rank(old) => {
            Some((old.to_string(), new.to_string()))
        }
        _ => None,
    }
}

fn number_reduced(ctx: &Snapshots, path: &str) -> Option<(String, String)> {
    ctx.number_pair(path)
        .filter(|(old, new)| new < old)
        .map(|(old, new)| (format_number(old), format_number(new)))
}

fn check_rule(rule: ChangeRule, ctx: &Snapshots) -> Option<String> {
    match rule {
        ChangeRule::WafDisabled => ctx
            .flag_turned_off(rule.field_path())
            .then(|| "Disabling WAF will remove security protection".to_string()),
        ChangeRule::WafModeDowngraded => match ctx.text_pair(rule.field_path()) {
            (Some(old), Some(new))
                if old.eq_ignore_ascii_case("block") && new.eq_ignore_ascii_case("monitor") =>
            {
                Some(
                    "WAF mode downgrade from 'block' to 'monitor' - attacks will be logged but not blocked"
                        .to_string(),
                )
            }
            _ => None,
        },
        ChangeRule::WafRulesetsRemoved => {
            let removed = ctx.removed_members(rule.field_path());
            (!removed.is_empty())
                .then(|| format!("Removing WAF rulesets: {}", removed.join(", ")))
        }
        ChangeRule::EncryptionAtRestDisabled => ctx
            .flag_turned_off_default_on(rule.field_path())
            .then(|| "Disabling encryption at rest".to_string()),
        ChangeRule::EncryptionInTransitDisabled => ctx
            .flag_turned_off_default_on(rule.field_path())
            .then(|| "Disabling encryption in transit".to_string()),
        ChangeRule::ComputeSizeReduced => {
            if !ctx.both_have("spec.compute") {
                return None;
            }
            size_reduced(ctx, rule.field_path()).map(|(old, new)| {
                format!("Compute size reduction from '{old}' to '{new}' may cause downtime")
            })
        }
        ChangeRule::ComputeMaxReduced => {
            if !ctx.both_have("spec.compute") {
                return None;
            }
            number_reduced(ctx, rule.field_path())
                .map(|(old, new)| format!("Maximum instance count reduced from {old} to {new}"))
        }
        ChangeRule::ComputeMinReduced => {
            if !ctx.both_have("spec.compute") {
                return None;
            }
            number_reduced(ctx, rule.field_path())
                .map(|(old, new)| format!("Minimum instance count reduced from {old} to {new}"))
        }
        ChangeRule::DataEngineRemoved => {
            if !ctx.old_has("spec.data") {
                return None;
            }
            match ctx.text_pair(rule.field_path()) {
                (Some(old), new)
                    if !old.eq_ignore_ascii_case("none")
                        && new.map(|n| n.eq_ignore_ascii_case("none")).unwrap_or(true) =>
                {
                    Some(format!(
                        "Removing data engine '{old}' will DELETE all data (irreversible!)"
                    ))
                }
                _ => None,
            }
        }
        ChangeRule::DataEngineChanged => {
            if !ctx.old_has("spec.data") {
                return None;
            }
            match ctx.text_pair(rule.field_path()) {
                (Some(old), Some(new))
                    if !old.eq_ignore_ascii_case("none")
                        && !new.eq_ignore_ascii_case("none")
                        && old != new =>
                {
                    Some(format!(
                        "Changing data.engine from '{old}' to '{new}' requires manual data migration"
                    ))
                }
                _ => None,
            }
        }
        ChangeRule::DataSizeReduced => {
            if !ctx.old_has("spec.data") {
                return None;
            }
            size_reduced(ctx, rule.field_path()).map(|(old, new)| {
                format!("Database size reduction from '{old}' to '{new}' may require data cleanup")
            })
        }
        ChangeRule::HighAvailabilityDisabled => {
            if !ctx.old_has("spec.data") {
                return None;
            }
            ctx.flag_turned_off(rule.field_path()).then(|| {
                "Disabling high availability - single point of failure introduced".to_string()
            })
        }
        ChangeRule::BackupRetentionReduced => {
            if !ctx.old_has("spec.data") {
                return None;
            }
            number_reduced(ctx, rule.field_path())
                .map(|(old, new)| format!("Backup retention reduced from {old} to {new} days"))
        }
        ChangeRule::VpcChanged => {
            if !ctx.old_has("spec.network") {
                return None;
            }
            match ctx.text_pair(rule.field_path()) {
                (Some(old), Some(new)) if old != new => Some(format!(
                    "VPC change from '{old}' to '{new}' requires complete network reconfiguration"
                )),
                _ => None,
            }
        }
        ChangeRule::PublicAccessDisabled => {
            if !ctx.old_has("spec.network") {
                return None;
            }
            ctx.flag_turned_off(rule.field_path()).then(|| {
                "Disabling public access - external connectivity will be lost".to_string()
            })
        }
        ChangeRule::SubnetsRemoved => {
            if !ctx.old_has("spec.network") {
                return None;
            }
            let removed = ctx.removed_members(rule.field_path());
            (!removed.is_empty()).then(|| format!("Removing subnets: {}", removed.join(", ")))
        }
        ChangeRule::AutoShutdownEnabled => {
            let was_enabled = ctx.before(rule.field_path()).map(truthy).unwrap_or(false);
            let now_enabled = ctx.after(rule.field_path()).map(truthy).unwrap_or(false);
            if was_enabled || !now_enabled {
                return None;
            }
            let hours = ctx
                .after("spec.governance.autoShutdown.afterHours")
                .and_then(as_number)
                .map(format_number)
                .unwrap_or_else(|| DEFAULT_SHUTDOWN_HOURS.to_string());
            Some(format!(
                "Auto-shutdown enabled: infrastructure will stop after {hours} hours of inactivity"
            ))
        }
        ChangeRule::MonthlySpendReduced => number_reduced(ctx, rule.field_path())
            .map(|(old, new)| format!("Monthly budget reduced from ${old} to ${new}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(value: Value) -> Spec {
        Spec::new(value)
    }

    fn paths(warnings: &[ChangeWarning]) -> Vec<&str> {
        warnings.iter().map(|w| w.field_path.as_str()).collect()
    }

    #[test]
    fn rule_table_is_in_declaration_order() {
        assert_eq!(ChangeRuleSet::standard().rules.len(), 18);
        assert_eq!(ChangeRule::ALL[0], ChangeRule::WafDisabled);
        assert_eq!(ChangeRule::ALL[17], ChangeRule::MonthlySpendReduced);
    }

    #[test]
    fn truthiness_follows_yaml_conventions() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("  ")));
        assert!(!truthy(&json!([])));
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!({"a": 1})));
        assert!(!truthy(&json!("off")));
        assert!(!truthy(&json!("No")));
        assert!(truthy(&json!("on")));
        assert!(truthy(&json!("enabled")));
    }

    #[test]
    fn numbers_compare_numerically() {
        let old = spec(json!({"spec": {"compute": {"scaling": {"max": 3}}}}));
        let new = spec(json!({"spec": {"compute": {"scaling": {"max": 3.0}}}}));
        assert!(classify(Some(&old), &new).is_empty());
    }

    #[test]
    fn whitespace_in_strings_is_ignored() {
        let old = spec(json!({"spec": {"network": {"vpc": "vpc-1", "subnets": ["a", "b"]}}}));
        let new = spec(json!({"spec": {"network": {"vpc": " vpc-1 ", "subnets": ["b ", "a"]}}}));
        assert!(classify(Some(&old), &new).is_empty());
    }

    #[test]
    fn waf_mode_downgrade_is_case_insensitive() {
        let old = spec(json!({"spec": {"security": {"waf": {"enabled": true, "mode": "BLOCK"}}}}));
        let new = spec(json!({"spec": {"security": {"waf": {"enabled": true, "mode": "monitor"}}}}));
        let warnings = classify(Some(&old), &new);
        assert_eq!(paths(&warnings), vec!["spec.security.waf.mode"]);
    }

    #[test]
    fn rulesets_removed_lists_sorted_names() {
        let old = spec(json!({"spec": {"security": {"waf": {"rulesets": ["sqli", "core", "xss"]}}}}));
        let new = spec(json!({"spec": {"security": {"waf": {"rulesets": ["core"]}}}}));
        let warnings = classify(Some(&old), &new);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].message, "Removing WAF rulesets: sqli, xss");
    }

    #[test]
    fn encryption_defaults_to_enabled() {
        let old = spec(json!({"spec": {"security": {}}}));
        let new = spec(json!({"spec": {"security": {"encryption": {"atRest": false}}}}));
        let warnings = classify(Some(&old), &new);
        assert_eq!(paths(&warnings), vec!["spec.security.encryption.atRest"]);

        let new = spec(json!({"spec": {"security": {}}}));
        assert!(classify(Some(&old), &new).is_empty());
    }

    #[test]
    fn compute_rules_need_both_sections() {
        let old = spec(json!({"spec": {"compute": {"size": "large"}}}));
        let new = spec(json!({"spec": {}}));
        assert!(classify(Some(&old), &new).is_empty());

        let new = spec(json!({"spec": {"compute": {"size": "small"}}}));
        let warnings = classify(Some(&old), &new);
        assert_eq!(
            warnings[0].message,
            "Compute size reduction from 'large' to 'small' may cause downtime"
        );
    }

    #[test]
    fn unknown_size_ranks_lowest() {
        let old = spec(json!({"spec": {"compute": {"size": "xlarge"}}}));
        let new = spec(json!({"spec": {"compute": {"size": "demo"}}}));
        assert!(classify(Some(&old), &new).is_empty());
    }

    #[test]
    fn data_engine_none_is_critical_deletion() {
        let old = spec(json!({"spec": {"data": {"engine": "postgres"}}}));
        let new = spec(json!({"spec": {"data": {"engine": "none"}}}));
        let warnings = classify(Some(&old), &new);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, Severity::Critical);
        assert_eq!(warnings[0].field_path, "spec.data.engine");
        assert!(warnings[0].message.contains("DELETE"));
    }

    #[test]
    fn data_section_removed_counts_as_deletion() {
        let old = spec(json!({"spec": {"data": {"engine": "mysql"}}}));
        let new = spec(json!({"spec": {}}));
        let warnings = classify(Some(&old), &new);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, Severity::Critical);
    }

    #[test]
    fn data_engine_swap_is_critical_migration() {
        let old = spec(json!({"spec": {"data": {"engine": "postgres"}}}));
        let new = spec(json!({"spec": {"data": {"engine": "mysql"}}}));
        let warnings = classify(Some(&old), &new);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].message,
            "Changing data.engine from 'postgres' to 'mysql' requires manual data migration"
        );
    }

    #[test]
    fn data_rules_skip_when_old_had_no_data() {
        let old = spec(json!({"spec": {"data": {"engine": "none"}}}));
        let new = spec(json!({"spec": {"data": {"engine": "postgres"}}}));
        assert!(classify(Some(&old), &new).is_empty());
    }

    #[test]
    fn auto_shutdown_reports_hours() {
        let old = spec(json!({"spec": {}}));
        let new = spec(json!({"spec": {"governance": {"autoShutdown": {"enabled": true, "afterHours": 8}}}}));
        let warnings = classify(Some(&old), &new);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, Severity::Info);
        assert!(warnings[0].message.contains("after 8 hours"));

        let new = spec(json!({"spec": {"governance": {"autoShutdown": {"enabled": true}}}}));
        let warnings = classify(Some(&old), &new);
        assert!(warnings[0].message.contains("after 24 hours"));
    }

    #[test]
    fn budget_message_formats_whole_numbers() {
        let old = spec(json!({"spec": {"governance": {"maxMonthlySpend": 500}}}));
        let new = spec(json!({"spec": {"governance": {"maxMonthlySpend": 250.5}}}));
        let warnings = classify(Some(&old), &new);
        assert_eq!(warnings[0].message, "Monthly budget reduced from $500 to $250.5");
    }

    #[test]
    fn classify_with_custom_subset() {
        let rules = ChangeRuleSet::empty().with_rule(ChangeRule::PublicAccessDisabled);
        let old = spec(json!({"spec": {"network": {"publicAccess": true}, "security": {"waf": {"enabled": true}}}}));
        let new = spec(json!({"spec": {"network": {"publicAccess": false}}}));
        let warnings = classify_with(&rules, Some(&old), &new);
        assert_eq!(paths(&warnings), vec!["spec.network.publicAccess"]);
    }

    #[test]
    fn yaml11_boolean_words_disable_flags() {
        for word in ["off", "no", "N", "False", "OFF"] {
            let old = spec(json!({"spec": {
                "security": {"waf": {"enabled": true}},
                "data": {"engine": "postgres", "highAvailability": "on"},
                "network": {"publicAccess": "yes"}
            }}));
            let new = spec(json!({"spec": {
                "security": {"waf": {"enabled": word}},
                "data": {"engine": "postgres", "highAvailability": word},
                "network": {"publicAccess": word}
            }}));
            assert_eq!(
                paths(&classify(Some(&old), &new)),
                vec![
                    "spec.security.waf.enabled",
                    "spec.data.highAvailability",
                    "spec.network.publicAccess",
                ],
                "{word:?} should read as false"
            );
        }
    }

    #[test]
    fn yaml11_boolean_words_enable_auto_shutdown() {
        let old = spec(json!({"spec": {"governance": {"autoShutdown": {"enabled": "off"}}}}));
        let new = spec(json!({"spec": {"governance": {"autoShutdown": {"enabled": "yes"}}}}));
        assert_eq!(
            paths(&classify(Some(&old), &new)),
            vec!["spec.governance.autoShutdown.enabled"]
        );
    }

    #[test]
    fn encryption_off_word_is_reported() {
        let old = spec(json!({"spec": {"security": {"encryption": {"atRest": true, "inTransit": "on"}}}}));
        let new = spec(json!({"spec": {"security": {"encryption": {"atRest": "no", "inTransit": "off"}}}}));
        assert_eq!(
            paths(&classify(Some(&old), &new)),
            vec!["spec.security.encryption.atRest", "spec.security.encryption.inTransit"]
        );
    }
}
