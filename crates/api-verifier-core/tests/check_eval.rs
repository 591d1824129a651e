// crates/api-verifier-core/tests/check_eval.rs
// ============================================================================
// Module: Check Evaluation Tests
// Description: Draft validation, path resolution, and check evaluation.
// Purpose: Validate check schemas and evaluation semantics.
// Dependencies: api-verifier-core, serde_json
// ============================================================================
//! ## Overview
//! Exercises check draft validation (unknown types, empty-path warnings),
//! JSON path selectors, and per-variant evaluation outcomes.

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

use api_verifier_core::Check;
use api_verifier_core::CheckDraftError;
use api_verifier_core::DraftWarning;
use api_verifier_core::EntryStatus;
use api_verifier_core::validate_check_draft;
use api_verifier_core::runtime::Evaluate;
use api_verifier_core::runtime::evaluate_checks;
use api_verifier_core::runtime::evaluate_response;
use api_verifier_core::runtime::json_path::node_text;
use api_verifier_core::runtime::json_path::resolve;
use serde_json::Value;
use serde_json::json;

/// Builds a validated check, confirming warnings.
fn check(kind: &str, fields: Value) -> Check {
    validate_check_draft(kind, &fields).unwrap().into_check(true).unwrap()
}

/// Sample response document.
fn document() -> Value {
    json!({
        "status": "ok",
        "count": 3,
        "data": {
            "users": [
                {"id": 1, "name": "alice", "role": "admin", "email": "a@x.io"},
                {"id": 2, "name": "bob", "role": "user", "phone": "555"}
            ]
        },
        "empty": [],
        "nothing": null
    })
}

// ============================================================================
// SECTION: Draft Validation
// ============================================================================

/// Verifies unknown check types are rejected.
#[test]
fn unknown_type_is_rejected() {
    let err = validate_check_draft("regexAll", &json!({"path": "a"})).unwrap_err();
    assert_eq!(err, CheckDraftError::UnknownType("regexAll".to_string()));
}

/// Verifies an empty path warns and requires confirmation.
#[test]
fn empty_path_requires_confirmation() {
    let draft = validate_check_draft("keyValue", &json!({"path": ""})).unwrap();
    assert_eq!(draft.warnings, vec![DraftWarning::EmptyPath]);
    let err = draft.clone().into_check(false).unwrap_err();
    assert!(matches!(err, CheckDraftError::Unconfirmed(_)));
    assert!(draft.into_check(true).is_ok());
}

/// Verifies fieldExistence never warns about an empty path.
#[test]
fn field_existence_skips_path_warning() {
    let draft = validate_check_draft("fieldExistence", &json!({"fields": ["id"]})).unwrap();
    assert!(draft.warnings.is_empty());
}

/// Verifies required fields are enforced per variant.
#[test]
fn required_fields_are_enforced() {
    assert_eq!(
        validate_check_draft("patternMatch", &json!({"path": "a", "pattern": " "})).unwrap_err(),
        CheckDraftError::MissingField("pattern")
    );
    assert_eq!(
        validate_check_draft("fieldExistence", &json!({"path": "a", "fields": []})).unwrap_err(),
        CheckDraftError::MissingField("fields")
    );
    assert_eq!(
        validate_check_draft("valueMatch", &json!({"path": "a", "operator": "=="})).unwrap_err(),
        CheckDraftError::MissingField("expected")
    );
    assert!(validate_check_draft("valueMatch", &json!({"path": "a", "operator": "EMPTY"})).is_ok());
}

/// Verifies the keyPresence alias and unknown operators.
#[test]
fn aliases_and_bad_operators() {
    let parsed: Check = serde_json::from_value(json!({"type": "keyPresence", "path": "a"})).unwrap();
    assert!(matches!(parsed, Check::KeyValue(_)));
    let err = validate_check_draft("valueMatch", &json!({"path": "a", "operator": "~=", "expected": 1}))
        .unwrap_err();
    assert!(matches!(err, CheckDraftError::Malformed(_)));
}

// ============================================================================
// SECTION: Path Resolution
// ============================================================================

/// Verifies wildcard, index, and filter selectors.
#[test]
fn json_path_selectors() {
    let doc = document();
    assert_eq!(resolve(&doc, "$").len(), 1);
    assert_eq!(resolve(&doc, "").len(), 1);
    assert_eq!(resolve(&doc, "data.users[*].name").len(), 2);
    assert_eq!(resolve(&doc, "$.data.users[1].name"), vec![&json!("bob")]);
    assert_eq!(resolve(&doc, "data.users[name='alice'].role"), vec![&json!("admin")]);
    assert_eq!(resolve(&doc, "data.users[id=2].name"), vec![&json!("bob")]);
    assert!(resolve(&doc, "data.users[9]").is_empty());
    assert!(resolve(&doc, "missing.field").is_empty());
}

/// Verifies node text rendering.
#[test]
fn node_text_renders_scalars_and_containers() {
    assert_eq!(node_text(&json!("x")), "x");
    assert_eq!(node_text(&json!(3)), "3");
    assert_eq!(node_text(&Value::Null), "null");
    assert_eq!(node_text(&json!({"a": 1})), "{\"a\":1}");
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Verifies keyValue presence semantics.
#[test]
fn key_value_checks_presence() {
    let doc = document();
    assert!(check("keyValue", json!({"path": "data.users"})).evaluate(&doc).passed);
    assert!(check("keyValue", json!({"path": "nothing"})).evaluate(&doc).passed);
    assert!(!check("keyValue", json!({"path": "absent"})).evaluate(&doc).passed);
}

/// Verifies patternMatch collects nested string leaves.
#[test]
fn pattern_match_scans_string_leaves() {
    let doc = document();
    assert!(check("patternMatch", json!({"path": "data", "pattern": "^a@"})).evaluate(&doc).passed);
    assert!(!check("patternMatch", json!({"path": "count", "pattern": "3"})).evaluate(&doc).passed);
    let invalid = check("patternMatch", json!({"path": "status", "pattern": "("})).evaluate(&doc);
    assert!(!invalid.passed);
    assert!(invalid.message.starts_with("Invalid regex pattern"));
}

/// Verifies fieldExistence with required and any-of fields.
#[test]
fn field_existence_checks_every_element() {
    let doc = document();
    let all = check("fieldExistence", json!({"path": "data.users", "fields": ["id", "name"]}));
    assert!(all.evaluate(&doc).passed);
    let any = check(
        "fieldExistence",
        json!({"path": "data.users", "fields": ["id"], "fieldAny": ["email", "phone"]}),
    );
    assert!(any.evaluate(&doc).passed);
    let missing = check("fieldExistence", json!({"path": "data.users", "fields": ["email"]}));
    assert!(!missing.evaluate(&doc).passed);
    let scalar = check("fieldExistence", json!({"path": "status", "fields": ["x"]}));
    assert!(!scalar.evaluate(&doc).passed);
}

/// Verifies valueMatch operators, logic defaults, and type constraints.
#[test]
fn value_match_semantics() {
    let doc = document();
    let equals = check("valueMatch", json!({"path": "status", "operator": "==", "expected": "ok"}));
    let outcome = equals.evaluate(&doc);
    assert!(outcome.passed);
    assert_eq!(outcome.message, "PASS: status → matched expected ANY \"ok\"");

    let any_of = check(
        "valueMatch",
        json!({"path": "data.users[*].role", "operator": "==", "expected": ["admin", "user"]}),
    );
    assert!(any_of.evaluate(&doc).passed);

    let all_of = check(
        "valueMatch",
        json!({"path": "data.users[*].role", "operator": "==", "logic": "AND", "expected": ["admin"]}),
    );
    let outcome = all_of.evaluate(&doc);
    assert!(!outcome.passed);
    assert_eq!(outcome.message, "FAIL: data.users[*].role → expected ANY \"admin\" but found \"user\" (type=string)");

    let greater = check("valueMatch", json!({"path": "count", "operator": ">", "expected": "2.5"}));
    assert!(greater.evaluate(&doc).passed);
    let non_numeric = check("valueMatch", json!({"path": "status", "operator": ">", "expected": 1}));
    assert!(!non_numeric.evaluate(&doc).passed);

    let typed = check(
        "valueMatch",
        json!({"path": "count", "operator": "==", "expectedType": "string", "expected": "3"}),
    );
    assert!(!typed.evaluate(&doc).passed);

    let empty = check("valueMatch", json!({"path": "empty", "operator": "EMPTY"}));
    assert!(empty.evaluate(&doc).passed);
    let not_empty = check("valueMatch", json!({"path": "nothing", "operator": "NOTEMPTY"}));
    assert!(!not_empty.evaluate(&doc).passed);
}

/// Verifies missing and unparsable bodies fail every check.
#[test]
fn missing_bodies_fail_every_check() {
    let checks = vec![
        check("keyValue", json!({"path": "a"})),
        check("patternMatch", json!({"path": "a", "pattern": "x"})),
    ];
    let entries = evaluate_checks(&checks, None);
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry.status == Some(EntryStatus::Fail)));
    assert_eq!(entries[0].message, "Response is null or empty.");
    assert_eq!(entries[1].kind, "patternMatch");

    let outcome = evaluate_response(&checks[0], Some("{not json"));
    assert!(!outcome.passed);
    assert!(outcome.message.starts_with("Response body is not valid JSON"));
}
