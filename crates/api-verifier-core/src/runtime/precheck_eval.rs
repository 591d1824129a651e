// crates/api-verifier-core/src/runtime/precheck_eval.rs
// ============================================================================
// Module: API Verifier Precheck Evaluation
// Description: Pass/fail semantics of gating rules over probe responses.
// Purpose: Decide whether a test case may run its main request.
// Dependencies: crate::core, crate::runtime::{comparator, json_path}
// ============================================================================

//! ## Overview
//! Single-condition rules pass when any node resolved at `extractPath`
//! satisfies the comparison; nothing resolved means failure. Multi-condition
//! rules fold each condition's resolved nodes with the rule's logic and then
//! fold the per-condition results with the same logic. A condition that
//! resolves nothing contributes the fold identity, and an empty condition
//! list yields the identity (AND: true, OR: false).
//!
//! A test case whose precheck name is not registered is not gated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::MultiConditionRule;
use crate::core::PrecheckName;
use crate::core::PrecheckRule;
use crate::core::PrecheckSet;
use crate::core::SingleConditionRule;
use crate::runtime::comparator::Comparison;
use crate::runtime::comparator::compare;
use crate::runtime::json_path::resolve;

// ============================================================================
// SECTION: Verdicts
// ============================================================================

/// Outcome of gating one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    /// No precheck is referenced or the name is not registered.
    Ungated,
    /// The rule held.
    Passed,
    /// The rule did not hold; the test case must be skipped.
    Failed {
        /// Skip reason.
        reason: String,
    },
}

impl GateVerdict {
    /// Returns true when the main request may run.
    #[must_use]
    pub const fn allows_execution(&self) -> bool {
        matches!(self, Self::Ungated | Self::Passed)
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates a rule against a parsed probe response.
#[must_use]
pub fn evaluate_precheck(rule: &PrecheckRule, document: &Value) -> bool {
    match rule {
        PrecheckRule::Single(single) => evaluate_single(single, document),
        PrecheckRule::Multi(multi) => evaluate_multi(multi, document),
    }
}

/// Gates a test case that references `name` given the probe response body.
///
/// An absent or unparsable probe body fails a registered rule.
#[must_use]
pub fn gate(prechecks: &PrecheckSet, name: Option<&PrecheckName>, probe_body: Option<&str>) -> GateVerdict {
    let Some(name) = name else {
        return GateVerdict::Ungated;
    };
    let Some(rule) = prechecks.get(name) else {
        return GateVerdict::Ungated;
    };
    let document = probe_body.and_then(|body| serde_json::from_str::<Value>(body).ok());
    let Some(document) = document else {
        return GateVerdict::Failed {
            reason: format!("Precheck '{name}' received no usable response"),
        };
    };
    if evaluate_precheck(rule, &document) {
        GateVerdict::Passed
    } else {
        GateVerdict::Failed {
            reason: format!("Precheck '{name}' failed"),
        }
    }
}

/// Evaluates a single-condition rule.
fn evaluate_single(rule: &SingleConditionRule, document: &Value) -> bool {
    let nodes = resolve(document, &rule.extract_path);
    let comparison = Comparison::from(rule.operator);
    let expected = rule.value.text();
    nodes.iter().any(|node| compare(comparison, node, &expected))
}

/// Evaluates a multi-condition rule.
fn evaluate_multi(rule: &MultiConditionRule, document: &Value) -> bool {
    let logic = rule.logic;
    logic.fold(rule.conditions.iter().map(|condition| {
        let nodes = resolve(document, &condition.path);
        if nodes.is_empty() {
            return logic.identity();
        }
        let comparison = Comparison::from(condition.operator);
        let expected = condition.value.text();
        logic.fold(nodes.iter().map(|node| compare(comparison, node, &expected)))
    }))
}
