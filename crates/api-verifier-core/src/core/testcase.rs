// crates/api-verifier-core/src/core/testcase.rs
// ============================================================================
// Module: API Verifier Test Case Entity
// Description: Request definitions with checks, precheck, and dependencies.
// Purpose: Model test cases with normalized parent and requirement fields.
// Dependencies: crate::core::{check, identifiers}, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`TestCase`] bundles one request definition (endpoint, method, expected
//! status) with its checks, an optional precheck reference, and dependency
//! declarations.
//!
//! `parentId` accepts `null`, a single id, or an array of ids on input and
//! always normalizes to a [`ParentRef`] set. It serializes back as a scalar
//! when it holds one id and as an array otherwise, so single and multi
//! parent forms round-trip to the same internal set.
//!
//! `requires` entries accept either a bare string `s` (normalized to
//! `{name: s, path: s}`) or a `{name, path}` object. Unknown top-level keys
//! are kept in [`TestCase::extra`] so hand-written fields survive edits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;
use serde_json::Value;
use thiserror::Error;

use crate::core::check::Check;
use crate::core::identifiers::PrecheckName;
use crate::core::identifiers::SuitePath;
use crate::core::identifiers::TestCaseId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default expected HTTP status.
pub const DEFAULT_EXPECTED_STATUS: u16 = 200;
/// Placeholder id carried by drafts that still need an assigned id.
pub const UNASSIGNED_ID: TestCaseId = TestCaseId::new(-1);

// ============================================================================
// SECTION: HTTP Method
// ============================================================================

/// HTTP method of a request definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    /// GET.
    #[default]
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// PATCH.
    Patch,
    /// DELETE.
    Delete,
    /// HEAD.
    Head,
    /// OPTIONS.
    Options,
}

impl HttpMethod {
    /// Returns the uppercase method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "" | "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(format!("unsupported HTTP method `{value}`")),
        }
    }
}

impl From<HttpMethod> for String {
    fn from(value: HttpMethod) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Parent References
// ============================================================================

/// Normalized set of parent test-case ids.
///
/// # Invariants
/// - Ids are unique and ordered; the wire form (scalar or array) is not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParentRef(BTreeSet<TestCaseId>);

impl ParentRef {
    /// Returns an empty parent set.
    #[must_use]
    pub const fn none() -> Self {
        Self(BTreeSet::new())
    }

    /// Builds a parent set from ids.
    pub fn from_ids(ids: impl IntoIterator<Item = TestCaseId>) -> Self {
        Self(ids.into_iter().collect())
    }

    /// Returns true when no parent is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of parents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when `id` is one of the parents.
    #[must_use]
    pub fn contains(&self, id: TestCaseId) -> bool {
        self.0.contains(&id)
    }

    /// Iterates the parent ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = TestCaseId> + '_ {
        self.0.iter().copied()
    }
}

impl Serialize for ParentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut ids = self.0.iter();
        match (ids.next(), ids.next()) {
            (None, _) => serializer.serialize_none(),
            (Some(id), None) => id.serialize(serializer),
            _ => serializer.collect_seq(self.0.iter()),
        }
    }
}

/// Accepted wire forms of a single parent id.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawParentId {
    /// Integer id.
    Int(i64),
    /// Numeric string id.
    Text(String),
}

/// Accepted wire forms of `parentId`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawParent {
    /// Array of ids.
    Many(Vec<RawParentId>),
    /// Single id.
    One(RawParentId),
}

impl RawParentId {
    /// Converts to an id; blank strings mean "no parent".
    fn into_id<E: serde::de::Error>(self) -> Result<Option<TestCaseId>, E> {
        match self {
            Self::Int(raw) => Ok(Some(TestCaseId::new(raw))),
            Self::Text(text) if text.trim().is_empty() => Ok(None),
            Self::Text(text) => text
                .trim()
                .parse::<i64>()
                .map(|raw| Some(TestCaseId::new(raw)))
                .map_err(|_| E::custom(format!("invalid parentId `{text}`"))),
        }
    }
}

impl<'de> Deserialize<'de> for ParentRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<RawParent>::deserialize(deserializer)
            .map_err(|_| D::Error::custom("parentId must be null, an integer, or an array of integers"))?;
        let raw_ids = match raw {
            None => Vec::new(),
            Some(RawParent::One(id)) => vec![id],
            Some(RawParent::Many(ids)) => ids,
        };
        let mut ids = BTreeSet::new();
        for raw_id in raw_ids {
            if let Some(id) = raw_id.into_id::<D::Error>()? {
                ids.insert(id);
            }
        }
        Ok(Self(ids))
    }
}

// ============================================================================
// SECTION: Requirements
// ============================================================================

/// A value the test case extracts from its response for dependents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawRequirement")]
pub struct Requirement {
    /// Name under which the value is published.
    pub name: String,
    /// JSON path the value is read from.
    pub path: String,
}

impl Requirement {
    /// Creates a requirement.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Accepted wire forms of a requirement.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRequirement {
    /// Bare name; the path equals the name.
    Name(String),
    /// Explicit object.
    Full {
        /// Published name.
        name: String,
        /// Source path; defaults to the name.
        #[serde(default)]
        path: Option<String>,
    },
}

impl From<RawRequirement> for Requirement {
    fn from(raw: RawRequirement) -> Self {
        match raw {
            RawRequirement::Name(name) => Self::new(name.clone(), name),
            RawRequirement::Full {
                name,
                path,
            } => {
                let path = path.unwrap_or_else(|| name.clone());
                Self::new(name, path)
            }
        }
    }
}

// ============================================================================
// SECTION: Test Case
// ============================================================================

/// Returns the default expected status for serde.
const fn default_expected_status() -> u16 {
    DEFAULT_EXPECTED_STATUS
}

/// Returns the placeholder id for serde.
const fn default_id() -> TestCaseId {
    UNASSIGNED_ID
}

/// Treats blank precheck names as absent.
fn blank_precheck_as_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<PrecheckName>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|name| !name.trim().is_empty()).map(PrecheckName::new))
}

/// One request definition.
///
/// # Invariants
/// - `id` is unique within the owning suite once persisted.
/// - `parent_id` references ids in the same suite (best-effort, enforced by authoring).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Suite-unique id; negative on drafts awaiting assignment.
    #[serde(default = "default_id")]
    pub id: TestCaseId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Endpoint path or URL.
    #[serde(default)]
    pub endpoint: String,
    /// HTTP method.
    #[serde(default)]
    pub method: HttpMethod,
    /// Expected HTTP status.
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
    /// Ordered checks.
    #[serde(default)]
    pub checks: Vec<Check>,
    /// Optional gating precheck.
    #[serde(
        default,
        deserialize_with = "blank_precheck_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub precheck: Option<PrecheckName>,
    /// Parent test cases that must run first.
    #[serde(default, skip_serializing_if = "ParentRef::is_empty")]
    pub parent_id: ParentRef,
    /// Values published for dependents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Requirement>,
    /// Unrecognized fields preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Errors raised when a test case definition is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TestCaseError {
    /// The definition failed to deserialize.
    #[error("malformed test case: {0}")]
    Malformed(String),
    /// A required field is missing or blank.
    #[error("test case field `{0}` is required")]
    MissingField(&'static str),
    /// The expected status is not an HTTP status code.
    #[error("expectedStatus {0} is not a valid HTTP status")]
    InvalidStatus(u16),
    /// The test case lists itself as a parent.
    #[error("test case {0} cannot be its own parent")]
    SelfParent(TestCaseId),
}

impl TestCase {
    /// Creates a draft with the given name and endpoint and default fields.
    #[must_use]
    pub fn draft(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED_ID,
            name: name.into(),
            endpoint: endpoint.into(),
            method: HttpMethod::default(),
            expected_status: DEFAULT_EXPECTED_STATUS,
            checks: Vec::new(),
            precheck: None,
            parent_id: ParentRef::none(),
            requires: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Parses a test case from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TestCaseError::Malformed`] when the bytes are not a valid
    /// test case document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TestCaseError> {
        serde_json::from_slice(bytes).map_err(|err| TestCaseError::Malformed(err.to_string()))
    }

    /// Validates authoring invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TestCaseError`] when the name or endpoint is blank, the
    /// expected status is out of range, or the test case is its own parent.
    pub fn validate(&self) -> Result<(), TestCaseError> {
        if self.name.trim().is_empty() {
            return Err(TestCaseError::MissingField("name"));
        }
        if self.endpoint.trim().is_empty() {
            return Err(TestCaseError::MissingField("endpoint"));
        }
        if !(100 ..= 599).contains(&self.expected_status) {
            return Err(TestCaseError::InvalidStatus(self.expected_status));
        }
        if !self.id.is_unassigned() && self.parent_id.contains(self.id) {
            return Err(TestCaseError::SelfParent(self.id));
        }
        Ok(())
    }

    /// Returns true when the test case declares a requirement with `name`.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.requires.iter().any(|requirement| requirement.name == name)
    }
}

// ============================================================================
// SECTION: Cookie Validator
// ============================================================================

/// Designated test case used to pre-validate uploaded credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieValidator {
    /// Store-relative path of the test case.
    pub path: SuitePath,
    /// Endpoint copied from the test case.
    pub endpoint: String,
    /// Method copied from the test case.
    pub method: HttpMethod,
}
