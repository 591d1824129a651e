// crates/api-verifier-core/src/core/precheck.rs
// ============================================================================
// Module: API Verifier Precheck Schema
// Description: Named gating rules evaluated against a probe response.
// Purpose: Model single- and multi-condition prechecks and validate drafts.
// Dependencies: crate::core::{check, identifiers, testcase}, serde, thiserror
// ============================================================================

//! ## Overview
//! A precheck is a named rule that gates a test case: a probe request is
//! issued first and its response must satisfy the rule before the test
//! case's main request runs. Rules come in two shapes, distinguished by the
//! presence of `conditions`:
//! - single condition: `{endpoint, method, extractPath, operator, value}`
//! - multi condition: `{endpoint, method, logic, conditions: [{path, operator, value}]}`
//!
//! Prechecks are suite-independent and keyed by unique name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::check::Logic;
use crate::core::check::Scalar;
use crate::core::identifiers::PrecheckName;
use crate::core::testcase::HttpMethod;

// ============================================================================
// SECTION: Rules
// ============================================================================

/// Registered prechecks keyed by name.
pub type PrecheckSet = BTreeMap<PrecheckName, PrecheckRule>;

/// A precheck rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrecheckRule {
    /// Several conditions combined with AND/OR.
    Multi(MultiConditionRule),
    /// One condition on a single extracted path.
    Single(SingleConditionRule),
}

impl PrecheckRule {
    /// Returns the rule shape.
    #[must_use]
    pub const fn mode(&self) -> PrecheckMode {
        match self {
            Self::Multi(_) => PrecheckMode::Multi,
            Self::Single(_) => PrecheckMode::Single,
        }
    }

    /// Returns the probe endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Multi(rule) => &rule.endpoint,
            Self::Single(rule) => &rule.endpoint,
        }
    }

    /// Returns the probe method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        match self {
            Self::Multi(rule) => rule.method,
            Self::Single(rule) => rule.method,
        }
    }
}

/// Precheck rule shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecheckMode {
    /// Single condition.
    Single,
    /// Multiple conditions.
    Multi,
}

/// Single-condition precheck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleConditionRule {
    /// Probe endpoint.
    #[serde(default)]
    pub endpoint: String,
    /// Probe method.
    #[serde(default)]
    pub method: HttpMethod,
    /// JSON path extracted from the probe response.
    pub extract_path: String,
    /// Comparison operator.
    #[serde(default)]
    pub operator: PrecheckOperator,
    /// Comparison operand.
    #[serde(default)]
    pub value: Scalar,
}

/// Multi-condition precheck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiConditionRule {
    /// Probe endpoint.
    #[serde(default)]
    pub endpoint: String,
    /// Probe method.
    #[serde(default)]
    pub method: HttpMethod,
    /// Combination logic.
    #[serde(default)]
    pub logic: Logic,
    /// Ordered conditions.
    pub conditions: Vec<PrecheckCondition>,
}

/// One condition of a multi-condition precheck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecheckCondition {
    /// JSON path into the probe response.
    pub path: String,
    /// Comparison operator.
    #[serde(default)]
    pub operator: PrecheckOperator,
    /// Comparison operand.
    #[serde(default)]
    pub value: Scalar,
}

// ============================================================================
// SECTION: Operators
// ============================================================================

/// Operators available to precheck conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PrecheckOperator {
    /// Text equality.
    #[default]
    Equals,
    /// Text inequality.
    NotEquals,
    /// Decimal greater-than.
    GreaterThan,
    /// Decimal less-than.
    LessThan,
    /// Decimal greater-than-or-equal.
    GreaterThanOrEqual,
    /// Decimal less-than-or-equal.
    LessThanOrEqual,
    /// Substring match.
    Contains,
    /// Negated substring match.
    NotContains,
    /// Prefix match.
    StartsWith,
    /// Suffix match.
    EndsWith,
}

impl PrecheckOperator {
    /// Returns the canonical wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThanOrEqual => "<=",
            Self::Contains => "contains",
            Self::NotContains => "notContains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
        }
    }
}

impl TryFrom<String> for PrecheckOperator {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(match value.trim().to_ascii_lowercase().as_str() {
            "" | "==" | "=" => Self::Equals,
            "!=" => Self::NotEquals,
            ">" => Self::GreaterThan,
            "<" => Self::LessThan,
            ">=" => Self::GreaterThanOrEqual,
            "<=" => Self::LessThanOrEqual,
            "contains" => Self::Contains,
            "notcontains" => Self::NotContains,
            "startswith" => Self::StartsWith,
            "endswith" => Self::EndsWith,
            _ => return Err(format!("unsupported precheck operator `{value}`")),
        })
    }
}

impl From<PrecheckOperator> for String {
    fn from(value: PrecheckOperator) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PrecheckOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Draft Validation
// ============================================================================

/// Errors raised while validating a precheck draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrecheckDraftError {
    /// The precheck name is empty.
    #[error("precheck name must not be empty")]
    EmptyName,
    /// The rule failed to deserialize.
    #[error("malformed precheck: {0}")]
    Malformed(String),
    /// A required field is missing or empty.
    #[error("precheck field `{0}` is required")]
    MissingField(&'static str),
}

/// Validates a precheck draft and returns its name and rule.
///
/// # Errors
///
/// Returns [`PrecheckDraftError`] when the name is empty, the rule is
/// malformed, or the rule lacks its endpoint, path, or conditions.
pub fn validate_precheck_draft(
    name: &str,
    rule: &Value,
) -> Result<(PrecheckName, PrecheckRule), PrecheckDraftError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PrecheckDraftError::EmptyName);
    }
    let rule: PrecheckRule = serde_json::from_value(rule.clone())
        .map_err(|err| PrecheckDraftError::Malformed(err.to_string()))?;
    if rule.endpoint().trim().is_empty() {
        return Err(PrecheckDraftError::MissingField("endpoint"));
    }
    match &rule {
        PrecheckRule::Single(single) if single.extract_path.trim().is_empty() => {
            return Err(PrecheckDraftError::MissingField("extractPath"));
        }
        PrecheckRule::Multi(multi) if multi.conditions.is_empty() => {
            return Err(PrecheckDraftError::MissingField("conditions"));
        }
        PrecheckRule::Multi(multi)
            if multi.conditions.iter().any(|condition| condition.path.trim().is_empty()) =>
        {
            return Err(PrecheckDraftError::MissingField("conditions[].path"));
        }
        _ => {}
    }
    Ok((PrecheckName::new(name), rule))
}
