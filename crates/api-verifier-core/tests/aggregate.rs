// crates/api-verifier-core/tests/aggregate.rs
// ============================================================================
// Module: Result Aggregation Tests
// Description: Rollups from raw run results to every summary level.
// Purpose: Validate status precedence and per-level counting rules.
// Dependencies: api-verifier-core
// ============================================================================
//! ## Overview
//! Builds a two-suite, two-account run and checks the test-case, folder,
//! suite, account, and overall rollups, then the display grouping of
//! multi-call results and file-order sorting.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use api_verifier_core::AccountId;
use api_verifier_core::AccountRun;
use api_verifier_core::EntryStatus;
use api_verifier_core::RawRun;
use api_verifier_core::ResultEntry;
use api_verifier_core::RunDetails;
use api_verifier_core::RunStatus;
use api_verifier_core::SuiteKey;
use api_verifier_core::TestCaseId;
use api_verifier_core::TestCaseResult;
use api_verifier_core::TestStatus;
use api_verifier_core::aggregate;
use api_verifier_core::runtime::ExecutionBlock;
use api_verifier_core::runtime::GroupedResults;
use api_verifier_core::runtime::aggregation_event;
use api_verifier_core::runtime::group_executions;
use api_verifier_core::runtime::sort_by_file_order;
use api_verifier_core::runtime::test_case_status;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a passing or failing single-check result at `path`.
fn result(id: i64, path: &str, status: EntryStatus) -> TestCaseResult {
    let mut result = TestCaseResult::new(
        TestCaseId::new(id),
        format!("case {id}"),
        vec![ResultEntry::execution("/x"), ResultEntry::check("keyValue", status, "m")],
    );
    result.path = Some(path.to_string());
    result
}

/// Builds a skipped result at `path`.
fn skipped(id: i64, path: &str) -> TestCaseResult {
    let mut result = TestCaseResult::skipped(TestCaseId::new(id), format!("case {id}"), "parent failed");
    result.path = Some(path.to_string());
    result
}

/// Builds an account bundle.
fn account(id: &str, results: Vec<TestCaseResult>) -> AccountRun {
    AccountRun {
        unique_id: AccountId::new(id),
        cookie_name: format!("{id}-cookie"),
        results,
        execution_time_sec: None,
    }
}

/// Shop: alice passes everything, bob fails checkout in cart/pay.
/// Admin: alice has one skipped test case.
fn raw_run() -> RawRun {
    let mut details = RunDetails::new();
    details.insert(
        SuiteKey::new("Shop"),
        vec![
            account(
                "alice",
                vec![
                    result(1, "Shop/login.json", EntryStatus::Pass),
                    result(2, "Shop/cart/add.json", EntryStatus::Pass),
                    result(3, "Shop/cart/pay/checkout.json", EntryStatus::Pass),
                ],
            ),
            account(
                "bob",
                vec![
                    result(1, "Shop/login.json", EntryStatus::Pass),
                    result(2, "Shop/cart/add.json", EntryStatus::Pass),
                    result(3, "Shop/cart/pay/checkout.json", EntryStatus::Fail),
                ],
            ),
        ],
    );
    details.insert(SuiteKey::new("Admin"), vec![account("alice", vec![skipped(1, "Admin/users.json")])]);
    RawRun {
        details,
        execution_time_sec: Some(4.5),
    }
}

// ============================================================================
// SECTION: Status Rules
// ============================================================================

/// Verifies the test-case rule: FAIL beats SKIPPED beats PASS.
#[test]
fn test_case_status_precedence() {
    assert_eq!(test_case_status(&result(1, "S/a.json", EntryStatus::Pass)), TestStatus::Pass);
    assert_eq!(test_case_status(&result(1, "S/a.json", EntryStatus::Fail)), TestStatus::Fail);
    assert_eq!(test_case_status(&skipped(1, "S/a.json")), TestStatus::Skipped);

    let empty = TestCaseResult::new(TestCaseId::new(1), "empty", vec![ResultEntry::execution("/x")]);
    assert_eq!(test_case_status(&empty), TestStatus::Skipped);

    let mut mixed = result(1, "S/a.json", EntryStatus::Pass);
    mixed.results.push(ResultEntry::check("valueMatch", EntryStatus::Skipped, "gated"));
    assert_eq!(test_case_status(&mixed), TestStatus::Skipped);
    mixed.results.push(ResultEntry::check("valueMatch", EntryStatus::Fail, "bad"));
    assert_eq!(test_case_status(&mixed), TestStatus::Fail);

    let mut counted = result(1, "S/a.json", EntryStatus::Pass);
    counted.summary.failed = 1;
    assert_eq!(test_case_status(&counted), TestStatus::Fail);
}

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Verifies suite and nested folder rollups.
#[test]
fn suite_and_folder_rollups() {
    let summary = aggregate(&raw_run());
    let shop = &summary.suites[&SuiteKey::new("Shop")];
    assert_eq!(shop.total_cookies, 2);
    assert_eq!(shop.passed_cookies, 1);
    assert_eq!(shop.failed_cookies, 1);
    assert_eq!(shop.unique_testcases, 3);
    assert_eq!(shop.executions.total_executions_observed, 6);
    assert_eq!(shop.executions.failed_executions_observed, 1);

    let cart = &shop.child_folders["cart"];
    assert_eq!(cart.total_cookies, 2);
    assert_eq!(cart.passed_cookies, 1);
    assert_eq!(cart.unique_testcases, 2);
    let pay = &cart.child_folders["cart/pay"];
    assert_eq!(pay.unique_testcases, 1);
    assert_eq!(pay.passed_cookies, 1);
    assert!(!shop.child_folders.contains_key("cart/pay"));

    let admin = &summary.suites[&SuiteKey::new("Admin")];
    assert_eq!(admin.passed_cookies, 0);
    assert_eq!(admin.executions.skipped_executions_observed, 1);
}

/// Verifies account summaries count distinct test cases and roll up per suite.
#[test]
fn account_rollups() {
    let summary = aggregate(&raw_run());
    let alice = &summary.cookies[&AccountId::new("alice")];
    assert_eq!(alice.cookie_name, "alice-cookie");
    assert_eq!(alice.tests_run, 4);
    assert_eq!(alice.passed, 3);
    assert_eq!(alice.skipped, 1);
    assert_eq!(alice.status, Some(TestStatus::Pass));
    assert_eq!(alice.suite_status[&SuiteKey::new("Admin")], TestStatus::Skipped);
    assert_eq!(alice.suite_status[&SuiteKey::new("Shop")], TestStatus::Pass);
    assert_eq!(alice.child_folders["Shop/cart"].total_executions_observed, 2);

    let bob = &summary.cookies[&AccountId::new("bob")];
    assert_eq!(bob.failed, 1);
    assert_eq!(bob.status, Some(TestStatus::Fail));
}

/// Verifies an account with passed and skipped test cases passes overall
/// while being excluded from the suite's and folder's passing accounts.
#[test]
fn skipped_test_case_keeps_account_passing_but_not_folder() {
    let mut run = raw_run();
    run.details.get_mut(&SuiteKey::new("Shop")).unwrap().push(account(
        "carol",
        vec![result(4, "Shop/cart/view.json", EntryStatus::Pass), skipped(5, "Shop/cart/coupon.json")],
    ));
    let summary = aggregate(&run);

    let carol = &summary.cookies[&AccountId::new("carol")];
    assert_eq!(carol.status, Some(TestStatus::Pass));
    assert_eq!(carol.suite_status[&SuiteKey::new("Shop")], TestStatus::Pass);
    assert_eq!(carol.passed, 1);
    assert_eq!(carol.skipped, 1);

    let shop = &summary.suites[&SuiteKey::new("Shop")];
    assert_eq!(shop.total_cookies, 3);
    assert_eq!(shop.passed_cookies, 1);
    assert_eq!(shop.failed_cookies, 2);

    let cart = &shop.child_folders["cart"];
    assert_eq!(cart.total_cookies, 3);
    assert_eq!(cart.passed_cookies, 1);
    assert_eq!(cart.failed_cookies, 2);
}

/// Verifies global per-test-case verdicts and overall counters.
#[test]
fn overall_rollups() {
    let summary = aggregate(&raw_run());
    let checkout = summary
        .testcases
        .iter()
        .find(|rollup| rollup.suite == SuiteKey::new("Shop") && rollup.id == TestCaseId::new(3))
        .unwrap();
    assert_eq!(checkout.status, TestStatus::Fail);

    let overall = &summary.overall;
    assert_eq!(overall.total_suites, 2);
    assert_eq!(overall.total_cookies, 2);
    assert_eq!(overall.unique_testcases, 4);
    assert_eq!(overall.passed_testcases, 2);
    assert_eq!(overall.failed_testcases, 1);
    assert_eq!(overall.skipped_testcases, 1);
    assert_eq!(overall.executions.total_executions_observed, 7);
    assert!((overall.execution_pass_rate_observed - 5.0 / 6.0).abs() < 1e-9);
    assert_eq!(overall.execution_time_sec, Some(4.5));
    assert_eq!(RunStatus::from_counts(&overall.executions), RunStatus::Failed);

    let event = aggregation_event(&summary, Some("run-1"));
    assert_eq!(event.failed_executions, 1);
}

/// Verifies an empty run aggregates to zeros.
#[test]
fn empty_run_aggregates_to_zero() {
    let summary = aggregate(&RawRun::default());
    assert!(summary.suites.is_empty());
    assert_eq!(summary.overall.unique_testcases, 0);
    assert!(summary.overall.execution_pass_rate_observed.abs() < f64::EPSILON);
}

// ============================================================================
// SECTION: Display
// ============================================================================

/// Verifies multi-call results are grouped per execution marker.
#[test]
fn executions_are_grouped() {
    let check = |message: &str| ResultEntry::check("keyValue", EntryStatus::Pass, message);
    let single = vec![ResultEntry::execution("/a"), check("one")];
    assert_eq!(group_executions(&single), GroupedResults::Flat(vec![check("one")]));

    let multi = vec![
        check("stray"),
        ResultEntry::execution("/a"),
        check("one"),
        ResultEntry::execution("/b"),
        check("two"),
    ];
    assert_eq!(
        group_executions(&multi),
        GroupedResults::Blocks(vec![
            ExecutionBlock {
                endpoint: None,
                entries: vec![check("stray")],
            },
            ExecutionBlock {
                endpoint: Some("/a".to_string()),
                entries: vec![check("one")],
            },
            ExecutionBlock {
                endpoint: Some("/b".to_string()),
                entries: vec![check("two")],
            },
        ])
    );
}

/// Verifies results follow the suite tree's file order.
#[test]
fn results_follow_file_order() {
    let mut details = raw_run().details;
    let order = vec![
        "Shop/cart/pay/checkout.json".to_string(),
        "Shop/login.json".to_string(),
        "Shop/cart/add.json".to_string(),
    ];
    sort_by_file_order(&mut details, &order);
    let ids: Vec<i64> =
        details[&SuiteKey::new("Shop")][0].results.iter().map(|result| result.id.get()).collect();
    assert_eq!(ids, vec![3, 1, 2]);
}
