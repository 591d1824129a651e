// crates/api-verifier-core/src/core/summary.rs
// ============================================================================
// Module: API Verifier Run Summary
// Description: Aggregated statuses and counters at every rollup level.
// Purpose: Define the summary document produced from raw run results.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! Summary types mirror the rollup hierarchy: execution, test case,
//! account, folder, suite, and overall. Every counter defaults to zero so a
//! suite, folder, or account missing from the raw results renders as "no
//! data" rather than failing.

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

// ============================================================================
// SECTION: Statuses
// ============================================================================

/// Derived status with precedence FAIL > SKIPPED > PASS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    /// Everything passed.
    Pass,
    /// Nothing failed but something was skipped or never ran.
    Skipped,
    /// Something failed.
    Fail,
}

impl TestStatus {
    /// Combines two statuses, keeping the higher-precedence one.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    /// Returns the uppercase wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Skipped => "SKIPPED",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a whole run, as shown in run history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    /// Every execution passed.
    Passed,
    /// Nothing failed but something was skipped.
    Partial,
    /// Some execution failed.
    Failed,
}

impl RunStatus {
    /// Derives the run status from execution counters.
    #[must_use]
    pub const fn from_counts(counts: &ExecutionCounts) -> Self {
        if counts.failed_executions_observed > 0 {
            Self::Failed
        } else if counts.skipped_executions_observed > 0 {
            Self::Partial
        } else {
            Self::Passed
        }
    }

    /// Returns the wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "Passed",
            Self::Partial => "Partial",
            Self::Failed => "Failed",
        }
    }

    /// Parses the wire spelling.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Passed" => Some(Self::Passed),
            "Partial" => Some(Self::Partial),
            "Failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Counters
// ============================================================================

/// Execution counters shared by every rollup level.
///
/// # Invariants
/// - `total_executions_observed` equals the sum of the three other counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionCounts {
    /// Total executions observed.
    #[serde(default)]
    pub total_executions_observed: u64,
    /// Executions that passed.
    #[serde(default)]
    pub passed_executions_observed: u64,
    /// Executions that failed.
    #[serde(default)]
    pub failed_executions_observed: u64,
    /// Executions that were skipped.
    #[serde(default)]
    pub skipped_executions_observed: u64,
}

impl ExecutionCounts {
    /// Records one execution with the given status.
    pub const fn record(&mut self, status: TestStatus) {
        self.total_executions_observed += 1;
        match status {
            TestStatus::Pass => self.passed_executions_observed += 1,
            TestStatus::Fail => self.failed_executions_observed += 1,
            TestStatus::Skipped => self.skipped_executions_observed += 1,
        }
    }

    /// Returns `passed / (passed + failed)`, or 0 when nothing passed or failed.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "Counters stay far below 2^52.")]
    pub fn pass_rate(&self) -> f64 {
        let denominator = self.passed_executions_observed + self.failed_executions_observed;
        if denominator == 0 {
            0.0
        } else {
            self.passed_executions_observed as f64 / denominator as f64
        }
    }
}

// ============================================================================
// SECTION: Folder and Suite Summaries
// ============================================================================

/// Rollup of one folder (or a whole suite).
///
/// `child_folders` is keyed by the folder path relative to the suite
/// (`A`, then `A/B` nested under it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSummary {
    /// Accounts with results under this folder.
    #[serde(default)]
    pub total_cookies: u64,
    /// Accounts whose every result here is PASS.
    #[serde(default)]
    pub passed_cookies: u64,
    /// Accounts with at least one non-PASS result here.
    #[serde(default)]
    pub failed_cookies: u64,
    /// Distinct test-case ids under this folder.
    #[serde(default)]
    pub unique_testcases: u64,
    /// Execution counters.
    #[serde(flatten)]
    pub executions: ExecutionCounts,
    /// Nested folders.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub child_folders: BTreeMap<String, FolderSummary>,
}

/// Suite rollups share the folder shape.
pub type SuiteSummary = FolderSummary;

// ============================================================================
// SECTION: Account Summaries
// ============================================================================

/// Rollup of one account across the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    /// Account display name.
    pub cookie_name: String,
    /// Distinct test cases run (by id and name).
    #[serde(default)]
    pub tests_run: u64,
    /// Distinct test cases whose first observation passed.
    #[serde(default)]
    pub passed: u64,
    /// Distinct test cases whose first observation failed.
    #[serde(default)]
    pub failed: u64,
    /// Distinct test cases whose first observation was skipped.
    #[serde(default)]
    pub skipped: u64,
    /// Suites the account ran.
    #[serde(default)]
    pub suites: Vec<SuiteKey>,
    /// Account-level status per suite.
    #[serde(default)]
    pub suite_status: BTreeMap<SuiteKey, TestStatus>,
    /// Account-level status across all suites.
    pub status: Option<TestStatus>,
    /// Execution counters.
    #[serde(flatten)]
    pub executions: ExecutionCounts,
    /// Execution counters per suite-relative folder (`Suite/A`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub child_folders: BTreeMap<String, ExecutionCounts>,
}

// ============================================================================
// SECTION: Overall Summary
// ============================================================================

/// Global verdict for one test case across every account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestcaseRollup {
    /// Owning suite.
    pub suite: SuiteKey,
    /// Test-case id.
    pub id: TestCaseId,
    /// Test-case name (first observed).
    pub name: String,
    /// FAIL if any account failed it, else SKIPPED if any skipped it, else PASS.
    pub status: TestStatus,
}

/// Run-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallSummary {
    /// Suites with results.
    #[serde(default)]
    pub total_suites: u64,
    /// Distinct accounts.
    #[serde(default)]
    pub total_cookies: u64,
    /// Distinct test cases (per suite).
    #[serde(default)]
    pub unique_testcases: u64,
    /// Execution counters.
    #[serde(flatten)]
    pub executions: ExecutionCounts,
    /// `passed / (passed + failed)` over executions, 0 when undefined.
    #[serde(default)]
    pub execution_pass_rate_observed: f64,
    /// Test cases green everywhere.
    #[serde(default)]
    pub passed_testcases: u64,
    /// Test cases failed by at least one account.
    #[serde(default)]
    pub failed_testcases: u64,
    /// Test cases skipped somewhere and failed nowhere.
    #[serde(default)]
    pub skipped_testcases: u64,
    /// Total run wall time, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_sec: Option<f64>,
}

/// Complete aggregation output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Suite rollups keyed by suite.
    #[serde(default)]
    pub suites: BTreeMap<SuiteKey, SuiteSummary>,
    /// Account rollups keyed by account id.
    #[serde(default)]
    pub cookies: BTreeMap<AccountId, AccountSummary>,
    /// Global per-test-case verdicts in suite/id order.
    #[serde(default)]
    pub testcases: Vec<TestcaseRollup>,
    /// Run-wide counters.
    #[serde(default)]
    pub overall: OverallSummary,
}

impl RunSummary {
    /// Returns the run status derived from overall execution counters.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        RunStatus::from_counts(&self.overall.executions)
    }
}
