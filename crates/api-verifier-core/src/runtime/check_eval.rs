// crates/api-verifier-core/src/runtime/check_eval.rs
// ============================================================================
// Module: API Verifier Check Evaluation
// Description: Evaluation of checks against response documents.
// Purpose: Produce pass/fail outcomes with human-readable messages.
// Dependencies: crate::core, crate::runtime::{comparator, json_path}, regex
// ============================================================================

//! ## Overview
//! Each check variant implements [`Evaluate`]. Evaluation is pure: it reads
//! the response document and returns a [`CheckOutcome`]. A missing or
//! unparsable response body fails every check with an explanatory message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;
use serde_json::Value;

use crate::core::Check;
use crate::core::EntryStatus;
use crate::core::ExpectedType;
use crate::core::FieldExistenceCheck;
use crate::core::KeyValueCheck;
use crate::core::Logic;
use crate::core::PatternMatchCheck;
use crate::core::ResultEntry;
use crate::core::ValueMatchCheck;
use crate::runtime::comparator::Comparison;
use crate::runtime::comparator::compare;
use crate::runtime::json_path::node_text;
use crate::runtime::json_path::resolve;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of evaluating one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// True when the check passed.
    pub passed: bool,
    /// Human-readable explanation.
    pub message: String,
}

impl CheckOutcome {
    /// Builds a passing outcome.
    #[must_use]
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    /// Builds a failing outcome.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// Returns the entry status for this outcome.
    #[must_use]
    pub const fn status(&self) -> EntryStatus {
        if self.passed { EntryStatus::Pass } else { EntryStatus::Fail }
    }

    /// Converts the outcome into a raw result entry for `check`.
    #[must_use]
    pub fn into_entry(self, check: &Check) -> ResultEntry {
        let status = self.status();
        ResultEntry::check(check.kind().as_str(), status, self.message)
    }
}

/// Evaluates a check variant against a parsed document.
pub trait Evaluate {
    /// Evaluates against `document`.
    fn evaluate(&self, document: &Value) -> CheckOutcome;
}

// ============================================================================
// SECTION: Entry Points
// ============================================================================

/// Evaluates one check against a raw response body.
#[must_use]
pub fn evaluate_response(check: &Check, body: Option<&str>) -> CheckOutcome {
    match parse_body(body) {
        Ok(document) => check.evaluate(&document),
        Err(outcome) => outcome,
    }
}

/// Evaluates every check against a raw response body, in order.
#[must_use]
pub fn evaluate_checks(checks: &[Check], body: Option<&str>) -> Vec<ResultEntry> {
    let document = parse_body(body);
    checks
        .iter()
        .map(|check| {
            let outcome = match &document {
                Ok(document) => check.evaluate(document),
                Err(outcome) => outcome.clone(),
            };
            outcome.into_entry(check)
        })
        .collect()
}

/// Parses a response body, mapping absence and parse errors to failures.
fn parse_body(body: Option<&str>) -> Result<Value, CheckOutcome> {
    let body = body.filter(|body| !body.trim().is_empty());
    let Some(body) = body else {
        return Err(CheckOutcome::fail("Response is null or empty."));
    };
    serde_json::from_str(body)
        .map_err(|err| CheckOutcome::fail(format!("Response body is not valid JSON: {err}")))
}

/// Returns `$` for an empty path.
fn root_if_empty(path: &str) -> &str {
    if path.trim().is_empty() { "$" } else { path }
}

// ============================================================================
// SECTION: Variants
// ============================================================================

impl Evaluate for Check {
    fn evaluate(&self, document: &Value) -> CheckOutcome {
        match self {
            Self::PatternMatch(check) => check.evaluate(document),
            Self::KeyValue(check) => check.evaluate(document),
            Self::FieldExistence(check) => check.evaluate(document),
            Self::ValueMatch(check) => check.evaluate(document),
        }
    }
}

impl Evaluate for KeyValueCheck {
    fn evaluate(&self, document: &Value) -> CheckOutcome {
        let path = root_if_empty(&self.path);
        if resolve(document, path).is_empty() {
            CheckOutcome::fail(format!("Key not found: {path}"))
        } else {
            CheckOutcome::pass(format!("Key present: {path}"))
        }
    }
}

impl Evaluate for PatternMatchCheck {
    fn evaluate(&self, document: &Value) -> CheckOutcome {
        let path = root_if_empty(&self.path);
        if self.pattern.is_empty() {
            return CheckOutcome::fail("Missing or empty regex pattern.");
        }
        let nodes = resolve(document, path);
        if nodes.is_empty() {
            return CheckOutcome::fail(format!("Path not found in response: {path}"));
        }
        let mut values = Vec::new();
        for node in nodes {
            collect_strings(node, &mut values);
        }
        if values.is_empty() {
            return CheckOutcome::fail(format!("No string values found at path: {path}"));
        }
        let regex = match Regex::new(&self.pattern) {
            Ok(regex) => regex,
            Err(err) => return CheckOutcome::fail(format!("Invalid regex pattern: {err}")),
        };
        match values.iter().find(|value| regex.is_match(value)) {
            Some(value) => {
                CheckOutcome::pass(format!("Pattern matched '{}' in: {value}", self.pattern))
            }
            None => CheckOutcome::fail(format!(
                "No value matched the pattern '{}'. Found: [{}]",
                self.pattern,
                values.join(", ")
            )),
        }
    }
}

/// Collects every string leaf under `node`, depth first.
fn collect_strings<'a>(node: &'a Value, out: &mut Vec<&'a str>) {
    match node {
        Value::String(text) => out.push(text),
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(fields) => fields.values().for_each(|field| collect_strings(field, out)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

impl Evaluate for FieldExistenceCheck {
    fn evaluate(&self, document: &Value) -> CheckOutcome {
        let path = root_if_empty(&self.path);
        if self.fields.is_empty() {
            return CheckOutcome::fail("Missing 'fields' array in fieldExistence check.");
        }
        let nodes = resolve(document, path);
        if nodes.is_empty() {
            return CheckOutcome::fail(format!("Path not found: {path}"));
        }
        for node in nodes {
            let element_ok = match node {
                Value::Array(items) => items.iter().all(|item| self.element_ok(item)),
                Value::Object(_) => self.element_ok(node),
                _ => {
                    return CheckOutcome::fail(format!(
                        "Target is not object or array at path: {path}"
                    ));
                }
            };
            if !element_ok {
                return CheckOutcome::fail(format!("Element failed fieldExistence at path: {path}"));
            }
        }
        let any_suffix = if self.field_any.is_empty() {
            String::new()
        } else {
            format!(" and any of [{}]", self.field_any.join(", "))
        };
        CheckOutcome::pass(format!(
            "All elements contain required fields [{}]{any_suffix} at path: {path}",
            self.fields.join(", ")
        ))
    }
}

impl FieldExistenceCheck {
    /// Returns true when `element` is an object with every required field and
    /// at least one `fieldAny` field when that list is non-empty.
    fn element_ok(&self, element: &Value) -> bool {
        let Some(object) = element.as_object() else {
            return false;
        };
        let required = self.fields.iter().all(|field| object.contains_key(field));
        let any = self.field_any.is_empty()
            || self.field_any.iter().any(|field| object.contains_key(field));
        required && any
    }
}

impl Evaluate for ValueMatchCheck {
    fn evaluate(&self, document: &Value) -> CheckOutcome {
        let path = self.path.trim();
        if path.is_empty() {
            return CheckOutcome::fail("Missing 'path' in valueMatch check.");
        }
        let nodes = resolve(document, path);
        if nodes.is_empty() {
            return CheckOutcome::fail(format!("Path not found: {path}"));
        }
        let expected = self.expected_texts();
        let comparison = Comparison::from(self.operator);
        if !self.operator.is_unary() && expected.is_empty() {
            return CheckOutcome::fail("Missing 'expected' in valueMatch check.");
        }
        let type_label = self.expected_type.map_or_else(|| "ANY".to_string(), |kind| {
            kind.as_str().to_ascii_uppercase()
        });
        if let Some(expected_type) = self.expected_type {
            for node in &nodes {
                let actual = ExpectedType::of(node);
                if actual != expected_type {
                    return CheckOutcome::fail(format!(
                        "FAIL: {path} → expected {type_label} but found {}",
                        actual.as_str().to_ascii_uppercase()
                    ));
                }
            }
        }
        let expected_label = if expected.is_empty() { "-".to_string() } else { expected.join(", ") };
        let logic = self.effective_logic();
        for node in &nodes {
            let matched = if self.operator.is_unary() {
                compare(comparison, node, "")
            } else {
                logic.fold(expected.iter().map(|operand| compare(comparison, node, operand)))
            };
            match (logic, matched) {
                (Logic::Or, true) => {
                    return CheckOutcome::pass(format!(
                        "PASS: {path} → matched expected {type_label} \"{expected_label}\""
                    ));
                }
                (Logic::And, false) => {
                    return CheckOutcome::fail(format!(
                        "FAIL: {path} → expected {type_label} \"{expected_label}\" but found \"{}\" (type={})",
                        node_text(node),
                        ExpectedType::of(node).as_str()
                    ));
                }
                _ => {}
            }
        }
        match logic {
            Logic::And => CheckOutcome::pass(format!(
                "PASS: {path} → matched expected {type_label} \"{expected_label}\""
            )),
            Logic::Or => CheckOutcome::fail(format!(
                "FAIL: {path} → expected {type_label} \"{expected_label}\" but found \"null\" (type={})",
                self.expected_type.map_or("any", ExpectedType::as_str)
            )),
        }
    }
}
