// crates/api-verifier-core/src/core/check.rs
// ============================================================================
// Module: API Verifier Check Schema
// Description: Typed assertion definitions evaluated against response documents.
// Purpose: Model checks as a tagged union and validate authoring drafts.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`Check`] is one assertion over a JSON response document. Checks are a
//! tagged union keyed by `type` on the wire (`patternMatch`, `keyValue`,
//! `fieldExistence`, `valueMatch`); the legacy spelling `keyPresence` is
//! accepted on input.
//!
//! Authoring goes through [`validate_check_draft`], which rejects unknown or
//! malformed drafts and raises warnings (not errors) for an empty `path`. A
//! caller turns the draft into a check with [`CheckDraft::into_check`],
//! confirming any outstanding warnings.
//!
//! Security posture: drafts are untrusted authoring input; all fields are
//! validated before a check is persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Check Union
// ============================================================================

/// One assertion evaluated against a response document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Check {
    /// String values at `path` must match a regular expression.
    PatternMatch(PatternMatchCheck),
    /// A value must exist at `path`.
    #[serde(alias = "keyPresence")]
    KeyValue(KeyValueCheck),
    /// The object(s) at `path` must carry the named fields.
    FieldExistence(FieldExistenceCheck),
    /// Value(s) at `path` must compare against expected values.
    ValueMatch(ValueMatchCheck),
}

impl Check {
    /// Returns the check kind.
    #[must_use]
    pub const fn kind(&self) -> CheckKind {
        match self {
            Self::PatternMatch(_) => CheckKind::PatternMatch,
            Self::KeyValue(_) => CheckKind::KeyValue,
            Self::FieldExistence(_) => CheckKind::FieldExistence,
            Self::ValueMatch(_) => CheckKind::ValueMatch,
        }
    }

    /// Returns the JSON path the check targets (possibly empty).
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::PatternMatch(check) => &check.path,
            Self::KeyValue(check) => &check.path,
            Self::FieldExistence(check) => &check.path,
            Self::ValueMatch(check) => &check.path,
        }
    }
}

/// Discriminant of a [`Check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckKind {
    /// `patternMatch`.
    PatternMatch,
    /// `keyValue` (alias `keyPresence`).
    KeyValue,
    /// `fieldExistence`.
    FieldExistence,
    /// `valueMatch`.
    ValueMatch,
}

impl CheckKind {
    /// Parses a wire type name, accepting the `keyPresence` alias.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "patternMatch" => Some(Self::PatternMatch),
            "keyValue" | "keyPresence" => Some(Self::KeyValue),
            "fieldExistence" => Some(Self::FieldExistence),
            "valueMatch" => Some(Self::ValueMatch),
            _ => None,
        }
    }

    /// Returns the canonical wire type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PatternMatch => "patternMatch",
            Self::KeyValue => "keyValue",
            Self::FieldExistence => "fieldExistence",
            Self::ValueMatch => "valueMatch",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Variants
// ============================================================================

/// Regular-expression match over string leaves at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatchCheck {
    /// JSON path; empty means the document root.
    #[serde(default)]
    pub path: String,
    /// Regular expression searched in every string leaf.
    #[serde(default)]
    pub pattern: String,
}

/// Presence-only check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValueCheck {
    /// JSON path; empty means the document root.
    #[serde(default)]
    pub path: String,
}

/// Field presence over the object (or array of objects) at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldExistenceCheck {
    /// JSON path; empty means the document root.
    #[serde(default)]
    pub path: String,
    /// Fields that must all be present.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Fields of which at least one must be present, when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_any: Vec<String>,
}

/// Comparison of the value(s) at `path` against expected scalars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueMatchCheck {
    /// JSON path; must be non-empty at evaluation time.
    #[serde(default)]
    pub path: String,
    /// Comparison operator (defaults to `==`).
    #[serde(default)]
    pub operator: ValueOperator,
    /// Combination logic; see [`ValueMatchCheck::effective_logic`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<Logic>,
    /// Optional runtime type constraint on observed values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_type: Option<ExpectedType>,
    /// Expected scalar or ordered scalars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Expected>,
}

impl ValueMatchCheck {
    /// Returns the expected values rendered as text.
    #[must_use]
    pub fn expected_texts(&self) -> Vec<String> {
        self.expected.as_ref().map(Expected::texts).unwrap_or_default()
    }

    /// Returns the logic used for evaluation.
    ///
    /// An explicit `logic` wins. Otherwise multiple expected values default to
    /// OR and everything else to AND.
    #[must_use]
    pub fn effective_logic(&self) -> Logic {
        match self.logic {
            Some(logic) => logic,
            None if self.expected.as_ref().is_some_and(|expected| expected.len() > 1) => Logic::Or,
            None => Logic::And,
        }
    }
}

// ============================================================================
// SECTION: Operators and Logic
// ============================================================================

/// Operators available to `valueMatch` checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueOperator {
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
    /// Observed value is empty.
    Empty,
    /// Observed value is non-empty.
    NotEmpty,
}

impl ValueOperator {
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
            Self::Contains => "CONTAINS",
            Self::NotContains => "NOTCONTAINS",
            Self::StartsWith => "STARTSWITH",
            Self::EndsWith => "ENDSWITH",
            Self::Empty => "EMPTY",
            Self::NotEmpty => "NOTEMPTY",
        }
    }

    /// Returns true when the operator ignores expected values.
    #[must_use]
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::Empty | Self::NotEmpty)
    }
}

impl TryFrom<String> for ValueOperator {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        Ok(match normalized.as_str() {
            "" | "==" | "=" => Self::Equals,
            "!=" => Self::NotEquals,
            ">" => Self::GreaterThan,
            "<" => Self::LessThan,
            ">=" => Self::GreaterThanOrEqual,
            "<=" => Self::LessThanOrEqual,
            "CONTAINS" => Self::Contains,
            "NOTCONTAINS" => Self::NotContains,
            "STARTSWITH" => Self::StartsWith,
            "ENDSWITH" => Self::EndsWith,
            "EMPTY" => Self::Empty,
            "NOTEMPTY" => Self::NotEmpty,
            _ => return Err(format!("unsupported operator `{value}`")),
        })
    }
}

impl From<ValueOperator> for String {
    fn from(value: ValueOperator) -> Self {
        value.as_str().to_string()
    }
}

/// Boolean combination logic shared by checks and prechecks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Logic {
    /// Every operand must hold.
    #[default]
    And,
    /// At least one operand must hold.
    Or,
}

impl Logic {
    /// Returns the fold identity (`true` for AND, `false` for OR).
    #[must_use]
    pub const fn identity(self) -> bool {
        matches!(self, Self::And)
    }

    /// Folds boolean operands; an empty iterator yields the identity.
    pub fn fold(self, operands: impl IntoIterator<Item = bool>) -> bool {
        let mut operands = operands.into_iter();
        match self {
            Self::And => operands.all(|operand| operand),
            Self::Or => operands.any(|operand| operand),
        }
    }

    /// Returns the canonical wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl TryFrom<String> for Logic {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            _ => Err(format!("unsupported logic `{value}`")),
        }
    }
}

impl From<Logic> for String {
    fn from(value: Logic) -> Self {
        value.as_str().to_string()
    }
}

/// JSON type an observed value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExpectedType {
    /// JSON boolean.
    Boolean,
    /// JSON number.
    Number,
    /// JSON string.
    String,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
    /// JSON null.
    Null,
}

impl ExpectedType {
    /// Returns the type of a JSON value.
    #[must_use]
    pub const fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
            Value::Null => Self::Null,
        }
    }

    /// Returns the lowercase wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        }
    }
}

impl TryFrom<String> for ExpectedType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "boolean" => Ok(Self::Boolean),
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            "null" => Ok(Self::Null),
            _ => Err(format!("unsupported expectedType `{value}`")),
        }
    }
}

impl From<ExpectedType> for String {
    fn from(value: ExpectedType) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// SECTION: Expected Values
// ============================================================================

/// A JSON scalar used as an expected or comparison value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean literal.
    Bool(bool),
    /// Numeric literal.
    Number(Number),
    /// String literal.
    Text(String),
    /// Null literal.
    Null,
}

impl Scalar {
    /// Renders the scalar as comparison text.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::Null => "null".to_string(),
        }
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Expected value(s) of a `valueMatch` check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expected {
    /// Ordered sequence of scalars.
    Many(Vec<Scalar>),
    /// Single scalar.
    One(Scalar),
}

impl Expected {
    /// Returns the number of expected values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Many(values) => values.len(),
            Self::One(_) => 1,
        }
    }

    /// Returns true when no expected values are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every expected value rendered as text.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        match self {
            Self::Many(values) => values.iter().map(Scalar::text).collect(),
            Self::One(value) => vec![value.text()],
        }
    }
}

// ============================================================================
// SECTION: Draft Validation
// ============================================================================

/// Non-fatal issues raised while validating a check draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftWarning {
    /// The draft targets the document root because its path is empty.
    EmptyPath,
}

impl fmt::Display for DraftWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPath => f.write_str("path is empty; the check will target the whole response"),
        }
    }
}

/// Errors raised while validating a check draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckDraftError {
    /// The `type` is not a known check kind.
    #[error("unknown check type `{0}`")]
    UnknownType(String),
    /// The draft fields are not a JSON object.
    #[error("check fields must be a JSON object")]
    NotAnObject,
    /// A required field is missing or empty.
    #[error("check field `{0}` is required")]
    MissingField(&'static str),
    /// The draft fields failed to deserialize.
    #[error("malformed check: {0}")]
    Malformed(String),
    /// Warnings were raised and the caller did not confirm them.
    #[error("check draft requires confirmation: {}", render_warnings(.0))]
    Unconfirmed(Vec<DraftWarning>),
}

/// Renders warnings for error display.
fn render_warnings(warnings: &[DraftWarning]) -> String {
    warnings.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// A structurally valid check awaiting confirmation of its warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckDraft {
    /// Validated check.
    pub check: Check,
    /// Warnings the caller must confirm before persisting.
    pub warnings: Vec<DraftWarning>,
}

impl CheckDraft {
    /// Converts the draft into a check.
    ///
    /// # Errors
    ///
    /// Returns [`CheckDraftError::Unconfirmed`] when warnings are outstanding
    /// and `confirmed` is false.
    pub fn into_check(self, confirmed: bool) -> Result<Check, CheckDraftError> {
        if self.warnings.is_empty() || confirmed {
            Ok(self.check)
        } else {
            Err(CheckDraftError::Unconfirmed(self.warnings))
        }
    }
}

/// Validates an authoring draft of the given check `kind`.
///
/// `fields` holds the variant's fields (any `type` key inside it is
/// replaced by `kind`).
///
/// # Errors
///
/// Returns [`CheckDraftError`] for unknown kinds, malformed fields, or
/// missing required fields.
pub fn validate_check_draft(kind: &str, fields: &Value) -> Result<CheckDraft, CheckDraftError> {
    let kind = CheckKind::parse(kind).ok_or_else(|| CheckDraftError::UnknownType(kind.to_string()))?;
    let Value::Object(fields) = fields else {
        return Err(CheckDraftError::NotAnObject);
    };
    let mut tagged = Map::with_capacity(fields.len() + 1);
    tagged.insert("type".to_string(), Value::String(kind.as_str().to_string()));
    for (key, value) in fields {
        if key != "type" {
            tagged.insert(key.clone(), value.clone());
        }
    }
    let check: Check = serde_json::from_value(Value::Object(tagged))
        .map_err(|err| CheckDraftError::Malformed(err.to_string()))?;

    match &check {
        Check::PatternMatch(inner) if inner.pattern.trim().is_empty() => {
            return Err(CheckDraftError::MissingField("pattern"));
        }
        Check::FieldExistence(inner) if inner.fields.iter().all(|field| field.trim().is_empty()) => {
            return Err(CheckDraftError::MissingField("fields"));
        }
        Check::ValueMatch(inner)
            if !inner.operator.is_unary()
                && inner.expected.as_ref().is_none_or(Expected::is_empty) =>
        {
            return Err(CheckDraftError::MissingField("expected"));
        }
        _ => {}
    }

    let mut warnings = Vec::new();
    if check.kind() != CheckKind::FieldExistence && check.path().trim().is_empty() {
        warnings.push(DraftWarning::EmptyPath);
    }
    Ok(CheckDraft {
        check,
        warnings,
    })
}
