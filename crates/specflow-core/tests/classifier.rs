//! Classifier behaviour over realistic spec documents.

use specflow_core::{
    classify, classify_with, render_pr_body, ChangeRule, ChangeRuleSet, Severity, Spec,
    NO_WARNINGS_SENTINEL,
};

const BASELINE: &str = "\
apiVersion: actionspec/v1
kind: WebApplication
metadata:
  name: storefront
spec:
  compute:
    size: large
    scaling:
      min: 2
      max: 10
  data:
    engine: postgres
    size: medium
    highAvailability: true
    backupRetention: 14
  network:
    vpc: vpc-main
    publicAccess: true
    subnets: [subnet-a, subnet-b]
  security:
    waf:
      enabled: true
      mode: block
      rulesets: [core, sqli]
    encryption:
      atRest: true
      inTransit: true
  governance:
    maxMonthlySpend: 500
";

fn baseline() -> Spec {
    Spec::parse(BASELINE).unwrap()
}

fn edited(from: &str, to: &str) -> Spec {
    assert!(BASELINE.contains(from), "baseline has no '{from}'");
    Spec::parse(&BASELINE.replacen(from, to, 1)).unwrap()
}

#[test]
fn identical_specs_produce_no_warnings() {
    let spec = baseline();
    assert!(classify(Some(&spec), &spec).is_empty());
}

#[test]
fn classification_is_deterministic() {
    let old = baseline();
    let new = edited("engine: postgres", "engine: mysql");

    let first = classify(Some(&old), &new);
    let second = classify(Some(&old), &new);
    assert_eq!(first, second);
}

#[test]
fn disabling_waf_yields_one_warning() {
    let old = baseline();
    let new = edited("      enabled: true\n      mode: block", "      enabled: false\n      mode: block");

    let warnings = classify(Some(&old), &new);

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, Severity::Warning);
    assert_eq!(warnings[0].field_path, "spec.security.waf.enabled");
    assert!(warnings[0].message.contains("WAF"));
}

#[test]
fn yaml_off_word_disables_waf() {
    let old = baseline();
    let new = edited("      enabled: true\n      mode: block", "      enabled: off\n      mode: block");

    let warnings = classify(Some(&old), &new);

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field_path, "spec.security.waf.enabled");
}

#[test]
fn yaml_no_word_disables_high_availability() {
    let old = baseline();
    let new = edited("highAvailability: true", "highAvailability: no");

    let warnings = classify(Some(&old), &new);

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field_path, "spec.data.highAvailability");
}

#[test]
fn quoted_off_disables_public_access() {
    let old = baseline();
    let new = edited("publicAccess: true", "publicAccess: \"Off\"");

    let warnings = classify(Some(&old), &new);

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field_path, "spec.network.publicAccess");
}

#[test]
fn yaml_on_word_keeps_encryption_enabled() {
    let old = baseline();
    let new = edited("atRest: true", "atRest: on");

    assert!(classify(Some(&old), &new).is_empty());
}

#[test]
fn removing_the_data_section_is_critical() {
    let old = baseline();
    let new = Spec::parse(
        "kind: WebApplication\nmetadata:\n  name: storefront\nspec:\n  compute:\n    size: large\n",
    )
    .unwrap();

    let warnings = classify(Some(&old), &new);

    let critical: Vec<_> = warnings
        .iter()
        .filter(|w| w.severity == Severity::Critical)
        .collect();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].field_path, "spec.data.engine");
    assert!(critical[0].message.contains("postgres"));
}

#[test]
fn warnings_follow_rule_table_order() {
    let old = baseline();
    let new = Spec::parse(
        &BASELINE
            .replacen("maxMonthlySpend: 500", "maxMonthlySpend: 250", 1)
            .replacen("engine: postgres", "engine: mysql", 1)
            .replacen("mode: block", "mode: monitor", 1),
    )
    .unwrap();

    let paths: Vec<String> = classify(Some(&old), &new)
        .into_iter()
        .map(|w| w.field_path)
        .collect();

    assert_eq!(
        paths,
        vec![
            "spec.security.waf.mode",
            "spec.data.engine",
            "spec.governance.maxMonthlySpend",
        ]
    );
}

#[test]
fn first_submission_reports_only_informational_rules() {
    let new = Spec::parse(
        "\
kind: WebApplication
metadata:
  name: storefront
spec:
  security:
    waf:
      enabled: false
    encryption:
      atRest: false
  governance:
    autoShutdown:
      enabled: true
      afterHours: 4
",
    )
    .unwrap();

    let warnings = classify(None, &new);

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, Severity::Info);
    assert_eq!(warnings[0].field_path, "spec.governance.autoShutdown.enabled");
    assert!(warnings[0].message.contains("4 hours"));
}

#[test]
fn custom_rule_set_limits_checks() {
    let old = baseline();
    let new = Spec::parse(
        &BASELINE
            .replacen("publicAccess: true", "publicAccess: false", 1)
            .replacen("backupRetention: 14", "backupRetention: 7", 1),
    )
    .unwrap();

    let rules = ChangeRuleSet::empty().with_rule(ChangeRule::BackupRetentionReduced);
    let warnings = classify_with(&rules, Some(&old), &new);

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, "Backup retention reduced from 14 to 7 days");
    assert_eq!(classify(Some(&old), &new).len(), 2);
}

#[test]
fn rendered_body_carries_sentinel_for_safe_change() {
    let old = baseline();
    let new = edited("max: 10", "max: 20");

    let warnings = classify(Some(&old), &new);
    assert!(warnings.is_empty());

    let body = render_pr_body(&old, &new, &warnings);
    assert!(body.contains(NO_WARNINGS_SENTINEL));
    assert!(body.contains("storefront"));
}

#[test]
fn rendered_body_lists_every_warning() {
    let old = baseline();
    let new = Spec::parse(
        &BASELINE
            .replacen("atRest: true", "atRest: false", 1)
            .replacen("subnets: [subnet-a, subnet-b]", "subnets: [subnet-a]", 1),
    )
    .unwrap();

    let warnings = classify(Some(&old), &new);
    assert_eq!(warnings.len(), 2);

    let body = render_pr_body(&old, &new, &warnings);
    for warning in &warnings {
        assert!(body.contains(&warning.message));
        assert!(body.contains(&warning.field_path));
    }
    assert!(!body.contains(NO_WARNINGS_SENTINEL));
}
