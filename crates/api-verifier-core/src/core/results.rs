// crates/api-verifier-core/src/core/results.rs
// ============================================================================
// Module: API Verifier Raw Results
// Description: Raw execution records handed back by the external runner.
// Purpose: Model per-test-case result streams grouped by suite and account.
// Dependencies: crate::core::{identifiers, testcase}, serde
// ============================================================================

//! ## Overview
//! The request runner is external; these types fix the shape of what it
//! returns. Each test case yields a flat ordered stream of [`ResultEntry`]
//! values: `EXECUTION` markers (`message = "Endpoint: <url>"`) start one
//! physical call and every following check entry belongs to the most recent
//! marker.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AccountId;
use crate::core::identifiers::SuiteKey;
use crate::core::identifiers::TestCaseId;
use crate::core::testcase::ParentRef;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Entry type of execution markers.
pub const EXECUTION_MARKER_TYPE: &str = "EXECUTION";
/// Message prefix of execution markers.
pub const EXECUTION_ENDPOINT_PREFIX: &str = "Endpoint: ";

// ============================================================================
// SECTION: Entries
// ============================================================================

/// Status of one raw result entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntryStatus {
    /// Check passed.
    Pass,
    /// Check failed.
    Fail,
    /// Check skipped.
    Skipped,
    /// Informational entry.
    Info,
    /// Any other status, kept verbatim.
    Other(String),
}

impl From<String> for EntryStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "PASS" => Self::Pass,
            "FAIL" => Self::Fail,
            "SKIPPED" => Self::Skipped,
            "INFO" => Self::Info,
            _ => Self::Other(value),
        }
    }
}

impl From<EntryStatus> for String {
    fn from(value: EntryStatus) -> Self {
        match value {
            EntryStatus::Pass => "PASS".to_string(),
            EntryStatus::Fail => "FAIL".to_string(),
            EntryStatus::Skipped => "SKIPPED".to_string(),
            EntryStatus::Info => "INFO".to_string(),
            EntryStatus::Other(other) => other,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from(self.clone()))
    }
}

/// One raw result entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Check type, or `EXECUTION` for markers.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Entry status; absent on some markers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

impl ResultEntry {
    /// Builds a check entry.
    #[must_use]
    pub fn check(kind: impl Into<String>, status: EntryStatus, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Builds an execution marker for `endpoint`.
    #[must_use]
    pub fn execution(endpoint: &str) -> Self {
        Self {
            kind: EXECUTION_MARKER_TYPE.to_string(),
            status: Some(EntryStatus::Info),
            message: format!("{EXECUTION_ENDPOINT_PREFIX}{endpoint}"),
        }
    }

    /// Returns true for execution markers.
    #[must_use]
    pub fn is_execution_marker(&self) -> bool {
        self.kind.eq_ignore_ascii_case(EXECUTION_MARKER_TYPE)
    }

    /// Returns the endpoint named by an execution marker.
    #[must_use]
    pub fn marker_endpoint(&self) -> Option<&str> {
        if !self.is_execution_marker() {
            return None;
        }
        Some(self.message.strip_prefix(EXECUTION_ENDPOINT_PREFIX).unwrap_or(&self.message))
    }

    /// Returns true when the entry carries `status`.
    #[must_use]
    pub fn has_status(&self, status: &EntryStatus) -> bool {
        self.status.as_ref() == Some(status)
    }
}

// ============================================================================
// SECTION: Test Case Results
// ============================================================================

/// Per-test-case check counts reported by the runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultCounts {
    /// Number of checks evaluated.
    #[serde(default)]
    pub total_checks: u64,
    /// Checks passed.
    #[serde(default)]
    pub passed: u64,
    /// Checks failed.
    #[serde(default)]
    pub failed: u64,
}

impl ResultCounts {
    /// Tallies check entries (markers and informational entries excluded).
    #[must_use]
    pub fn tally(entries: &[ResultEntry]) -> Self {
        let mut counts = Self::default();
        for entry in entries.iter().filter(|entry| !entry.is_execution_marker()) {
            match entry.status {
                Some(EntryStatus::Pass) => {
                    counts.total_checks += 1;
                    counts.passed += 1;
                }
                Some(EntryStatus::Fail) => {
                    counts.total_checks += 1;
                    counts.failed += 1;
                }
                _ => {}
            }
        }
        counts
    }
}

/// Raw result of one test case for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    /// Test-case id.
    pub id: TestCaseId,
    /// Test-case name.
    #[serde(default)]
    pub name: String,
    /// Endpoint as defined.
    #[serde(default)]
    pub endpoint: String,
    /// Fully resolved URL of the last call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,
    /// Store-relative path of the definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Declared parents.
    #[serde(default, skip_serializing_if = "ParentRef::is_empty")]
    pub parent_id: ParentRef,
    /// Owning suite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite: Option<SuiteKey>,
    /// Check counts.
    #[serde(default)]
    pub summary: ResultCounts,
    /// Ordered raw entries.
    #[serde(default)]
    pub results: Vec<ResultEntry>,
    /// True when the runner skipped the test case.
    #[serde(default)]
    pub skipped: bool,
    /// Reason the test case was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl TestCaseResult {
    /// Builds a result with counts tallied from `results`.
    #[must_use]
    pub fn new(id: TestCaseId, name: impl Into<String>, results: Vec<ResultEntry>) -> Self {
        let summary = ResultCounts::tally(&results);
        Self {
            id,
            name: name.into(),
            endpoint: String::new(),
            full_url: None,
            path: None,
            parent_id: ParentRef::none(),
            suite: None,
            summary,
            results,
            skipped: false,
            skip_reason: None,
        }
    }

    /// Builds a skipped result with a reason.
    #[must_use]
    pub fn skipped(id: TestCaseId, name: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let mut result = Self::new(
            id,
            name,
            vec![ResultEntry::check("SKIPPED", EntryStatus::Skipped, reason.clone())],
        );
        result.skipped = true;
        result.skip_reason = Some(reason);
        result
    }

    /// Returns the folder chain below the suite (`["A", "A/B"]`).
    ///
    /// Derived from `path` (`Suite/A/B/case.json`); empty when unknown.
    #[must_use]
    pub fn folder_chain(&self) -> Vec<String> {
        let Some(path) = self.path.as_deref() else {
            return Vec::new();
        };
        let mut parts: Vec<&str> = path.trim_matches('/').split('/').collect();
        parts.pop();
        let mut chain = Vec::new();
        let mut current = String::new();
        for part in parts.into_iter().skip(1).filter(|part| !part.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(part);
            chain.push(current.clone());
        }
        chain
    }
}

// ============================================================================
// SECTION: Run Details
// ============================================================================

/// Results of every selected test case for one account in one suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRun {
    /// Stable account id.
    pub unique_id: AccountId,
    /// Account display name.
    #[serde(default)]
    pub cookie_name: String,
    /// Per-test-case results.
    #[serde(default)]
    pub results: Vec<TestCaseResult>,
    /// Wall time spent on this account's suite run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_sec: Option<f64>,
}

/// Per-suite account bundles.
pub type RunDetails = BTreeMap<SuiteKey, Vec<AccountRun>>;

/// Raw run document consumed by aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRun {
    /// Per-suite account bundles.
    #[serde(default)]
    pub details: RunDetails,
    /// Total run wall time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_sec: Option<f64>,
}
