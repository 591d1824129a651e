// crates/api-verifier-core/tests/precheck.rs
// ============================================================================
// Module: Precheck Tests
// Description: Precheck draft validation and gate verdicts.
// Purpose: Validate single and multi-condition precheck semantics.
// Dependencies: api-verifier-core, serde_json
// ============================================================================
//! ## Overview
//! Exercises precheck rule parsing, single and multi-condition evaluation,
//! and the gate verdicts that decide whether a test case is skipped.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use api_verifier_core::PrecheckDraftError;
use api_verifier_core::PrecheckMode;
use api_verifier_core::PrecheckName;
use api_verifier_core::PrecheckRule;
use api_verifier_core::PrecheckSet;
use api_verifier_core::runtime::GateVerdict;
use api_verifier_core::runtime::evaluate_precheck;
use api_verifier_core::runtime::gate;
use api_verifier_core::validate_precheck_draft;
use serde_json::json;

/// Builds a registry holding one single-condition and one multi-condition rule.
fn registry() -> PrecheckSet {
    let (single_name, single) = validate_precheck_draft(
        "isAdmin",
        &json!({"endpoint": "/me", "method": "GET", "extractPath": "user.role", "operator": "==", "value": "admin"}),
    )
    .unwrap();
    let (multi_name, multi) = validate_precheck_draft(
        "hasQuota",
        &json!({
            "endpoint": "/quota",
            "logic": "AND",
            "conditions": [
                {"path": "quota.remaining", "operator": ">", "value": 0},
                {"path": "quota.plan", "operator": "startsWith", "value": "pro"}
            ]
        }),
    )
    .unwrap();
    PrecheckSet::from([(single_name, single), (multi_name, multi)])
}

/// Verifies rule shapes are detected from their fields.
#[test]
fn rule_modes_are_detected() {
    let set = registry();
    assert_eq!(set[&PrecheckName::new("isAdmin")].mode(), PrecheckMode::Single);
    assert_eq!(set[&PrecheckName::new("hasQuota")].mode(), PrecheckMode::Multi);
    assert_eq!(set[&PrecheckName::new("hasQuota")].endpoint(), "/quota");
}

/// Verifies draft validation rejects incomplete rules.
#[test]
fn incomplete_drafts_are_rejected() {
    assert_eq!(
        validate_precheck_draft("  ", &json!({"endpoint": "/x", "extractPath": "a"})).unwrap_err(),
        PrecheckDraftError::EmptyName
    );
    assert_eq!(
        validate_precheck_draft("p", &json!({"extractPath": "a"})).unwrap_err(),
        PrecheckDraftError::MissingField("endpoint")
    );
    assert_eq!(
        validate_precheck_draft("p", &json!({"endpoint": "/x", "conditions": []})).unwrap_err(),
        PrecheckDraftError::MissingField("conditions")
    );
    assert!(matches!(
        validate_precheck_draft("p", &json!({"endpoint": "/x", "extractPath": "a", "operator": "~"})),
        Err(PrecheckDraftError::Malformed(_))
    ));
}

/// Verifies single-condition rules match any resolved node.
#[test]
fn single_condition_matches_any_node() {
    let set = registry();
    let rule: &PrecheckRule = &set[&PrecheckName::new("isAdmin")];
    assert!(evaluate_precheck(rule, &json!({"user": {"role": "admin"}})));
    assert!(!evaluate_precheck(rule, &json!({"user": {"role": "guest"}})));
    assert!(!evaluate_precheck(rule, &json!({"user": {}})));
}

/// Verifies multi-condition rules combine conditions with their logic.
#[test]
fn multi_condition_applies_logic() {
    let set = registry();
    let rule = &set[&PrecheckName::new("hasQuota")];
    assert!(evaluate_precheck(rule, &json!({"quota": {"remaining": 5, "plan": "pro-annual"}})));
    assert!(!evaluate_precheck(rule, &json!({"quota": {"remaining": 0, "plan": "pro"}})));
    assert!(!evaluate_precheck(rule, &json!({"quota": {"remaining": 3, "plan": "free"}})));

    let (_, any) = validate_precheck_draft(
        "either",
        &json!({
            "endpoint": "/q",
            "logic": "OR",
            "conditions": [{"path": "a", "value": "x"}, {"path": "b", "value": "y"}]
        }),
    )
    .unwrap();
    assert!(evaluate_precheck(&any, &json!({"a": "no", "b": "y"})));
    assert!(!evaluate_precheck(&any, &json!({"a": "no"})));
}

/// Verifies a condition whose path resolves nothing contributes the fold identity.
#[test]
fn missing_condition_path_contributes_identity() {
    let (_, all) = validate_precheck_draft(
        "quotaAll",
        &json!({
            "endpoint": "/quota",
            "logic": "AND",
            "conditions": [
                {"path": "quota.remaining", "operator": ">", "value": 0},
                {"path": "quota.absent", "value": "x"}
            ]
        }),
    )
    .unwrap();
    assert!(evaluate_precheck(&all, &json!({"quota": {"remaining": 5}})));
    assert!(!evaluate_precheck(&all, &json!({"quota": {"remaining": 0}})));
    assert!(!evaluate_precheck(&all, &json!({"quota": {"remaining": 5, "absent": "y"}})));

    let (_, any) = validate_precheck_draft(
        "quotaAny",
        &json!({
            "endpoint": "/quota",
            "logic": "OR",
            "conditions": [
                {"path": "quota.remaining", "operator": ">", "value": 0},
                {"path": "quota.absent", "value": "x"}
            ]
        }),
    )
    .unwrap();
    assert!(evaluate_precheck(&any, &json!({"quota": {"remaining": 5}})));
    assert!(!evaluate_precheck(&any, &json!({"quota": {"remaining": 0}})));
    assert!(!evaluate_precheck(&any, &json!({"quota": {}})));
}

/// Verifies gate verdicts for absent, unknown, failing, and passing prechecks.
#[test]
fn gate_verdicts() {
    let set = registry();
    let admin = PrecheckName::new("isAdmin");
    assert_eq!(gate(&set, None, None), GateVerdict::Ungated);
    assert_eq!(gate(&set, Some(&PrecheckName::new("unknown")), None), GateVerdict::Ungated);
    assert_eq!(gate(&set, Some(&admin), Some(r#"{"user":{"role":"admin"}}"#)), GateVerdict::Passed);

    let failed = gate(&set, Some(&admin), Some(r#"{"user":{"role":"guest"}}"#));
    assert!(!failed.allows_execution());
    assert_eq!(
        failed,
        GateVerdict::Failed {
            reason: "Precheck 'isAdmin' failed".to_string()
        }
    );

    let unusable = gate(&set, Some(&admin), Some("<html>"));
    assert!(matches!(unusable, GateVerdict::Failed { .. }));
}
