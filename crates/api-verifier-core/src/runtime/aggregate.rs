// crates/api-verifier-core/src/runtime/aggregate.rs
// ============================================================================
// Module: API Verifier Result Aggregation
// Description: Bottom-up status derivation over raw run results.
// Purpose: Fold execution records into test-case, account, folder, suite,
//          and overall summaries.
// Dependencies: crate::{audit, core}
// ============================================================================

//! ## Overview
//! Aggregation is a pure pass over an already-fetched [`RawRun`]. Every
//! level applies the precedence FAIL > SKIPPED > PASS, but the levels use
//! different strictness:
//!
//! - Test case: FAIL on any failed check, else SKIPPED when flagged skipped,
//!   when any check was skipped, or when nothing ran; else PASS.
//! - Account: FAIL if any test case failed, SKIPPED if every test case was
//!   skipped, else PASS.
//! - Folder and suite cookie counts: an account passes only when it has
//!   results there and every one of them is PASS.
//! - Global per-test-case verdict: FAIL if any account failed it, else
//!   SKIPPED if any account skipped it, else PASS.
//!
//! Missing suites, accounts, or test cases simply contribute nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::audit::AggregationAuditEvent;
use crate::audit::AggregationAuditEventParams;
use crate::core::AccountId;
use crate::core::AccountRun;
use crate::core::AccountSummary;
use crate::core::EntryStatus;
use crate::core::ExecutionCounts;
use crate::core::FolderSummary;
use crate::core::OverallSummary;
use crate::core::RawRun;
use crate::core::RunDetails;
use crate::core::RunSummary;
use crate::core::SuiteKey;
use crate::core::SuiteSummary;
use crate::core::TestCaseId;
use crate::core::TestCaseResult;
use crate::core::TestStatus;
use crate::core::TestcaseRollup;

// ============================================================================
// SECTION: Status Rules
// ============================================================================

/// Derives the status of one test-case result.
#[must_use]
pub fn test_case_status(result: &TestCaseResult) -> TestStatus {
    let checks = || result.results.iter().filter(|entry| !entry.is_execution_marker());
    if result.summary.failed > 0 || checks().any(|entry| entry.has_status(&EntryStatus::Fail)) {
        return TestStatus::Fail;
    }
    let ran = checks().any(|entry| entry.has_status(&EntryStatus::Pass));
    if result.skipped || !ran || checks().any(|entry| entry.has_status(&EntryStatus::Skipped)) {
        return TestStatus::Skipped;
    }
    TestStatus::Pass
}

/// Account-level rollup: FAIL if any failed, SKIPPED if all skipped
/// (including none), else PASS.
#[must_use]
pub fn account_status(statuses: impl IntoIterator<Item = TestStatus>) -> TestStatus {
    let mut any_fail = false;
    let mut all_skipped = true;
    for status in statuses {
        match status {
            TestStatus::Fail => any_fail = true,
            TestStatus::Pass => all_skipped = false,
            TestStatus::Skipped => {}
        }
    }
    if any_fail {
        TestStatus::Fail
    } else if all_skipped {
        TestStatus::Skipped
    } else {
        TestStatus::Pass
    }
}

/// Folder-level rule: true only when there is at least one status and all are PASS.
#[must_use]
pub fn account_passes_folder(statuses: impl IntoIterator<Item = TestStatus>) -> bool {
    let mut seen = false;
    for status in statuses {
        if status != TestStatus::Pass {
            return false;
        }
        seen = true;
    }
    seen
}

/// Global rule: the worst status observed across accounts; SKIPPED when none.
#[must_use]
pub fn global_status(statuses: impl IntoIterator<Item = TestStatus>) -> TestStatus {
    statuses.into_iter().reduce(TestStatus::worst).unwrap_or(TestStatus::Skipped)
}

// ============================================================================
// SECTION: Accumulators
// ============================================================================

/// Per-folder accumulation for one suite.
#[derive(Debug, Default)]
struct FolderAcc {
    /// Distinct ids under the folder.
    ids: BTreeSet<TestCaseId>,
    /// Execution counters.
    executions: ExecutionCounts,
    /// Statuses per account.
    accounts: BTreeMap<AccountId, Vec<TestStatus>>,
}

impl FolderAcc {
    /// Records one execution of `id` by `account`.
    fn record(&mut self, account: &AccountId, id: TestCaseId, status: TestStatus) {
        self.ids.insert(id);
        self.executions.record(status);
        self.accounts.entry(account.clone()).or_default().push(status);
    }

    /// Converts the accumulator into a summary without child folders.
    fn finish(&self) -> FolderSummary {
        let total = self.accounts.len() as u64;
        let passed = self
            .accounts
            .values()
            .filter(|statuses| account_passes_folder(statuses.iter().copied()))
            .count() as u64;
        FolderSummary {
            total_cookies: total,
            passed_cookies: passed,
            failed_cookies: total - passed,
            unique_testcases: self.ids.len() as u64,
            executions: self.executions,
            child_folders: BTreeMap::new(),
        }
    }
}

/// Per-account accumulation across suites.
#[derive(Debug, Default)]
struct AccountAcc {
    /// Summary under construction.
    summary: AccountSummary,
    /// Distinct `id::name` keys already counted.
    seen: BTreeSet<(SuiteKey, TestCaseId, String)>,
    /// Every test-case status observed.
    statuses: Vec<TestStatus>,
    /// Statuses per suite.
    per_suite: BTreeMap<SuiteKey, Vec<TestStatus>>,
}

/// Running global verdict of one test case.
#[derive(Debug)]
struct RollupAcc {
    /// First observed name.
    name: String,
    /// Worst status so far.
    status: TestStatus,
}

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Aggregates a raw run into a complete summary.
#[must_use]
pub fn aggregate(raw: &RawRun) -> RunSummary {
    let mut suites = BTreeMap::new();
    let mut accounts: BTreeMap<AccountId, AccountAcc> = BTreeMap::new();
    let mut rollups: BTreeMap<(SuiteKey, TestCaseId), RollupAcc> = BTreeMap::new();
    let mut overall = ExecutionCounts::default();

    for (suite, runs) in &raw.details {
        suites.insert(suite.clone(), summarize_suite(runs));
        for run in runs {
            let account = accounts.entry(run.unique_id.clone()).or_default();
            if account.summary.cookie_name.is_empty() {
                account.summary.cookie_name = run.cookie_name.clone();
            }
            if !account.summary.suites.contains(suite) {
                account.summary.suites.push(suite.clone());
            }
            account.per_suite.entry(suite.clone()).or_default();
            for result in &run.results {
                let status = test_case_status(result);
                overall.record(status);
                record_account(account, suite, result, status);
                rollups
                    .entry((suite.clone(), result.id))
                    .and_modify(|acc| acc.status = acc.status.worst(status))
                    .or_insert_with(|| RollupAcc {
                        name: result.name.clone(),
                        status,
                    });
            }
        }
    }

    let cookies: BTreeMap<AccountId, AccountSummary> = accounts
        .into_iter()
        .map(|(id, acc)| {
            let mut summary = acc.summary;
            summary.status = Some(account_status(acc.statuses));
            summary.suite_status = acc
                .per_suite
                .into_iter()
                .map(|(suite, statuses)| (suite, account_status(statuses)))
                .collect();
            (id, summary)
        })
        .collect();

    let testcases: Vec<TestcaseRollup> = rollups
        .into_iter()
        .map(|((suite, id), acc)| TestcaseRollup {
            suite,
            id,
            name: acc.name,
            status: acc.status,
        })
        .collect();

    let count = |wanted: TestStatus| testcases.iter().filter(|rollup| rollup.status == wanted).count() as u64;
    let overall = OverallSummary {
        total_suites: raw.details.len() as u64,
        total_cookies: cookies.len() as u64,
        unique_testcases: testcases.len() as u64,
        executions: overall,
        execution_pass_rate_observed: overall.pass_rate(),
        passed_testcases: count(TestStatus::Pass),
        failed_testcases: count(TestStatus::Fail),
        skipped_testcases: count(TestStatus::Skipped),
        execution_time_sec: raw.execution_time_sec,
    };

    RunSummary {
        suites,
        cookies,
        testcases,
        overall,
    }
}

/// Folds one test-case result into an account accumulator.
fn record_account(account: &mut AccountAcc, suite: &SuiteKey, result: &TestCaseResult, status: TestStatus) {
    account.summary.executions.record(status);
    account.statuses.push(status);
    account.per_suite.entry(suite.clone()).or_default().push(status);
    if account.seen.insert((suite.clone(), result.id, result.name.clone())) {
        account.summary.tests_run += 1;
        match status {
            TestStatus::Pass => account.summary.passed += 1,
            TestStatus::Fail => account.summary.failed += 1,
            TestStatus::Skipped => account.summary.skipped += 1,
        }
    }
    for folder in result.folder_chain() {
        account.summary.child_folders.entry(format!("{suite}/{folder}")).or_default().record(status);
    }
}

/// Builds the summary of one suite from its account bundles.
fn summarize_suite(runs: &[AccountRun]) -> SuiteSummary {
    let mut ids = BTreeSet::new();
    let mut executions = ExecutionCounts::default();
    let mut passed_cookies = 0_u64;
    let mut folders: BTreeMap<String, FolderAcc> = BTreeMap::new();
    for run in runs {
        let mut statuses = Vec::with_capacity(run.results.len());
        for result in &run.results {
            let status = test_case_status(result);
            ids.insert(result.id);
            executions.record(status);
            statuses.push(status);
            for folder in result.folder_chain() {
                folders.entry(folder).or_default().record(&run.unique_id, result.id, status);
            }
        }
        if account_passes_folder(statuses) {
            passed_cookies += 1;
        }
    }
    let total_cookies = runs.len() as u64;
    SuiteSummary {
        total_cookies,
        passed_cookies,
        failed_cookies: total_cookies - passed_cookies,
        unique_testcases: ids.len() as u64,
        executions,
        child_folders: nest_folders(&folders, None),
    }
}

/// Nests flat folder accumulators under their parent paths.
fn nest_folders(folders: &BTreeMap<String, FolderAcc>, parent: Option<&str>) -> BTreeMap<String, FolderSummary> {
    folders
        .iter()
        .filter(|(path, _)| parent_of(path) == parent)
        .map(|(path, acc)| {
            let mut summary = acc.finish();
            summary.child_folders = nest_folders(folders, Some(path.as_str()));
            (path.clone(), summary)
        })
        .collect()
}

/// Returns the parent folder of a suite-relative folder path.
fn parent_of(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

// ============================================================================
// SECTION: Ordering and Audit
// ============================================================================

/// Sorts every account's results by the suite tree's file order.
///
/// Results whose path is unknown keep their relative order after known ones.
pub fn sort_by_file_order(details: &mut RunDetails, file_order: &[String]) {
    let rank: BTreeMap<&str, usize> =
        file_order.iter().enumerate().map(|(index, path)| (path.as_str(), index)).collect();
    for runs in details.values_mut() {
        for run in runs.iter_mut() {
            run.results.sort_by_key(|result| {
                result.path.as_deref().and_then(|path| rank.get(path).copied()).unwrap_or(usize::MAX)
            });
        }
    }
}

/// Builds the audit event describing an aggregation pass.
#[must_use]
pub fn aggregation_event(summary: &RunSummary, run_id: Option<&str>) -> AggregationAuditEvent {
    AggregationAuditEvent::new(AggregationAuditEventParams {
        run_id: run_id.map(str::to_string),
        suites: summary.overall.total_suites,
        accounts: summary.overall.total_cookies,
        executions: summary.overall.executions.total_executions_observed,
        failed_executions: summary.overall.executions.failed_executions_observed,
    })
}
