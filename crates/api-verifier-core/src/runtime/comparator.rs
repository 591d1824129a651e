// crates/api-verifier-core/src/runtime/comparator.rs
// ============================================================================
// Module: API Verifier Comparator Logic
// Description: Operator evaluation shared by value checks and prechecks.
// Purpose: Compare observed JSON nodes against expected text operands.
// Dependencies: crate::core, bigdecimal, serde_json
// ============================================================================

//! ## Overview
//! Comparisons are text based: the observed node is rendered with
//! [`node_text`] and compared with the expected operand. Ordering operators
//! parse both sides as `BigDecimal`; when either side is not numeric the
//! comparison is false. Emptiness treats `null`, `""`, `[]`, and `{}` as
//! empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::Value;

use crate::core::PrecheckOperator;
use crate::core::ValueOperator;
use crate::runtime::json_path::node_text;

// ============================================================================
// SECTION: Operators
// ============================================================================

/// Operator understood by [`compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Text equality.
    Equals,
    /// Text inequality.
    NotEquals,
    /// Decimal `>`.
    GreaterThan,
    /// Decimal `<`.
    LessThan,
    /// Decimal `>=`.
    GreaterThanOrEqual,
    /// Decimal `<=`.
    LessThanOrEqual,
    /// Substring.
    Contains,
    /// Negated substring.
    NotContains,
    /// Prefix.
    StartsWith,
    /// Suffix.
    EndsWith,
    /// Observed node is empty.
    Empty,
    /// Observed node is not empty.
    NotEmpty,
}

impl From<ValueOperator> for Comparison {
    fn from(value: ValueOperator) -> Self {
        match value {
            ValueOperator::Equals => Self::Equals,
            ValueOperator::NotEquals => Self::NotEquals,
            ValueOperator::GreaterThan => Self::GreaterThan,
            ValueOperator::LessThan => Self::LessThan,
            ValueOperator::GreaterThanOrEqual => Self::GreaterThanOrEqual,
            ValueOperator::LessThanOrEqual => Self::LessThanOrEqual,
            ValueOperator::Contains => Self::Contains,
            ValueOperator::NotContains => Self::NotContains,
            ValueOperator::StartsWith => Self::StartsWith,
            ValueOperator::EndsWith => Self::EndsWith,
            ValueOperator::Empty => Self::Empty,
            ValueOperator::NotEmpty => Self::NotEmpty,
        }
    }
}

impl From<PrecheckOperator> for Comparison {
    fn from(value: PrecheckOperator) -> Self {
        match value {
            PrecheckOperator::Equals => Self::Equals,
            PrecheckOperator::NotEquals => Self::NotEquals,
            PrecheckOperator::GreaterThan => Self::GreaterThan,
            PrecheckOperator::LessThan => Self::LessThan,
            PrecheckOperator::GreaterThanOrEqual => Self::GreaterThanOrEqual,
            PrecheckOperator::LessThanOrEqual => Self::LessThanOrEqual,
            PrecheckOperator::Contains => Self::Contains,
            PrecheckOperator::NotContains => Self::NotContains,
            PrecheckOperator::StartsWith => Self::StartsWith,
            PrecheckOperator::EndsWith => Self::EndsWith,
        }
    }
}

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// Compares an observed node against an expected operand.
#[must_use]
pub fn compare(comparison: Comparison, observed: &Value, expected: &str) -> bool {
    match comparison {
        Comparison::Empty => is_empty_node(observed),
        Comparison::NotEmpty => !is_empty_node(observed),
        _ => compare_text(comparison, &node_text(observed), expected),
    }
}

/// Compares two rendered operands.
#[must_use]
pub fn compare_text(comparison: Comparison, actual: &str, expected: &str) -> bool {
    match comparison {
        Comparison::Equals => actual == expected,
        Comparison::NotEquals => actual != expected,
        Comparison::GreaterThan => decimal_cmp(actual, expected).is_some_and(Ordering::is_gt),
        Comparison::LessThan => decimal_cmp(actual, expected).is_some_and(Ordering::is_lt),
        Comparison::GreaterThanOrEqual => decimal_cmp(actual, expected).is_some_and(Ordering::is_ge),
        Comparison::LessThanOrEqual => decimal_cmp(actual, expected).is_some_and(Ordering::is_le),
        Comparison::Contains => actual.contains(expected),
        Comparison::NotContains => !actual.contains(expected),
        Comparison::StartsWith => actual.starts_with(expected),
        Comparison::EndsWith => actual.ends_with(expected),
        Comparison::Empty => actual.is_empty(),
        Comparison::NotEmpty => !actual.is_empty(),
    }
}

/// Returns true for `null`, empty strings, empty arrays, and empty objects.
fn is_empty_node(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Compares two operands as exact decimals.
fn decimal_cmp(left: &str, right: &str) -> Option<Ordering> {
    let left = decimal_from_text(left)?;
    let right = decimal_from_text(right)?;
    Some(left.cmp(&right))
}

/// Parses trimmed text into a `BigDecimal`.
fn decimal_from_text(text: &str) -> Option<BigDecimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    BigDecimal::from_str(trimmed).ok()
}
