// crates/api-verifier-core/src/core/identifiers.rs
// ============================================================================
// Module: API Verifier Identifiers
// Description: Canonical identifiers for test cases, suites, accounts, and paths.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde, sha2, thiserror
// ============================================================================

//! ## Overview
//! This module defines the identifiers used throughout the API verifier.
//! Test-case identifiers are suite-unique integers; suite keys, account ids,
//! and precheck names are opaque strings. [`SuitePath`] is the only validated
//! identifier: it addresses files and folders relative to the store root and
//! rejects traversal components at construction time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fmt::Write as _;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File extension used by persisted test-case definitions.
pub const TEST_CASE_EXTENSION: &str = ".json";
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Number of hex characters of the cookie digest embedded in account ids.
const ACCOUNT_DIGEST_HEX_CHARS: usize = 16;

// ============================================================================
// SECTION: Test Case Identifier
// ============================================================================

/// Test-case identifier, unique within its owning suite.
///
/// # Invariants
/// - Persisted test cases carry non-negative identifiers; negative values only
///   appear in drafts and mean "assign one for me".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestCaseId(i64);

impl TestCaseId {
    /// Creates a test-case identifier from a raw value.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Returns true when the identifier is a draft placeholder.
    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for TestCaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for TestCaseId {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: String Identifiers
// ============================================================================

/// Suite key naming a top-level suite (the root folder of a suite tree).
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuiteKey(String);

impl SuiteKey {
    /// Creates a new suite key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SuiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SuiteKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Stable identifier of one account (credential set) within a run.
///
/// # Invariants
/// - Opaque UTF-8 string; use [`AccountId::derive`] to build one from a credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Creates an account identifier from an existing value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives a stable account identifier from the account name and cookie.
    ///
    /// The cookie itself never appears in the identifier; only a truncated
    /// SHA-256 digest does. Rows without a cookie fall back to their index.
    #[must_use]
    pub fn derive(cookie_name: &str, cookie: Option<&str>, row_index: usize) -> Self {
        match cookie {
            Some(cookie) => {
                let digest = Sha256::digest(cookie.as_bytes());
                let mut hex = String::with_capacity(ACCOUNT_DIGEST_HEX_CHARS);
                for byte in digest.iter().take(ACCOUNT_DIGEST_HEX_CHARS / 2) {
                    let _ = write!(hex, "{byte:02x}");
                }
                Self(format!("{cookie_name}_{hex}"))
            }
            None => Self(format!("{cookie_name}_r{row_index}")),
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Unique name of a registered precheck rule.
///
/// # Invariants
/// - Opaque UTF-8 string; emptiness is rejected by precheck validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrecheckName(String);

impl PrecheckName {
    /// Creates a new precheck name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrecheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PrecheckName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Suite Paths
// ============================================================================

/// Errors raised when a suite-relative path is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path is empty.
    #[error("path must not be empty")]
    Empty,
    /// The path exceeds the total length limit.
    #[error("path exceeds {MAX_TOTAL_PATH_LENGTH} bytes")]
    TooLong,
    /// A component is empty, a traversal marker, or too long.
    #[error("invalid path component `{0}`")]
    InvalidComponent(String),
}

/// Suite-relative path of a test-case file or folder (`Suite/Folder/name.json`).
///
/// # Invariants
/// - Components are non-empty, never `.` or `..`, and contain no backslashes.
/// - The first component is the suite key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SuitePath(String);

impl SuitePath {
    /// Parses and validates a suite-relative path.
    ///
    /// Leading and trailing slashes are stripped before validation.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] when the path is empty, too long, or contains an
    /// invalid component.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }
        if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(PathError::TooLong);
        }
        for component in trimmed.split('/') {
            if component.is_empty()
                || component == "."
                || component == ".."
                || component.contains('\\')
                || component.len() > MAX_PATH_COMPONENT_LENGTH
            {
                return Err(PathError::InvalidComponent(component.to_string()));
            }
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the suite key (first component).
    #[must_use]
    pub fn suite(&self) -> SuiteKey {
        SuiteKey::new(self.components().next().unwrap_or_default())
    }

    /// Returns the path components in order.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Returns the final component.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Returns the containing folder, or `None` for a top-level entry.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.rsplit_once('/').map(|(parent, _)| Self(parent.to_string()))
    }

    /// Returns true when the path names a test-case file.
    #[must_use]
    pub fn is_test_file(&self) -> bool {
        self.0.ends_with(TEST_CASE_EXTENSION)
    }

    /// Returns true when `self` equals `ancestor` or lies beneath it.
    #[must_use]
    pub fn starts_with(&self, ancestor: &Self) -> bool {
        self.0 == ancestor.0
            || (self.0.starts_with(&ancestor.0) && self.0[ancestor.0.len() ..].starts_with('/'))
    }

    /// Appends a single validated component.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] when the component is invalid.
    pub fn join(&self, component: &str) -> Result<Self, PathError> {
        if component.contains('/') {
            return Err(PathError::InvalidComponent(component.to_string()));
        }
        Self::parse(&format!("{}/{component}", self.0))
    }

    /// Replaces the final component, keeping the containing folder.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] when the new name is invalid.
    pub fn with_file_name(&self, name: &str) -> Result<Self, PathError> {
        match self.parent() {
            Some(parent) => parent.join(name),
            None => Self::parse(name),
        }
    }

    /// Returns the folder chain below the suite, as suite-relative prefixes.
    ///
    /// `Suite/A/B/case.json` yields `["A", "A/B"]`; a folder path includes
    /// itself (`Suite/A` yields `["A"]`).
    #[must_use]
    pub fn folder_chain(&self) -> Vec<String> {
        let mut parts: Vec<&str> = self.components().skip(1).collect();
        if self.is_test_file() {
            parts.pop();
        }
        let mut chain = Vec::with_capacity(parts.len());
        let mut current = String::new();
        for part in parts {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(part);
            chain.push(current.clone());
        }
        chain
    }
}

impl fmt::Display for SuitePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for SuitePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SuitePath> for String {
    fn from(value: SuitePath) -> Self {
        value.0
    }
}
