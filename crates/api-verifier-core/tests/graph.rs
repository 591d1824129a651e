// crates/api-verifier-core/tests/graph.rs
// ============================================================================
// Module: Dependency Graph Tests
// Description: Parent/child traversal, consistency issues, and cascades.
// Purpose: Validate graph semantics over hand-edited suite data.
// Dependencies: api-verifier-core
// ============================================================================
//! ## Overview
//! Suites may contain cycles, dangling parents, and duplicate ids. These
//! tests check that traversal terminates, issues are reported, and cascade
//! plans delete the right files and clean the right parents.

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

use api_verifier_core::DependencyGraph;
use api_verifier_core::GraphIssue;
use api_verifier_core::ParentRef;
use api_verifier_core::Requirement;
use api_verifier_core::Selection;
use api_verifier_core::SelectionMode;
use api_verifier_core::SuiteKey;
use api_verifier_core::SuitePath;
use api_verifier_core::SuiteSnapshot;
use api_verifier_core::TestCase;
use api_verifier_core::TestCaseId;
use api_verifier_core::runtime::SelectionError;
use api_verifier_core::runtime::compute_descendants;
use api_verifier_core::runtime::plan_cascade;

/// Builds a test case with an id, parents, and published names.
fn case(path: &str, id: i64, parents: &[i64], requires: &[&str]) -> (SuitePath, TestCase) {
    let mut test = TestCase::draft(format!("case {id}"), format!("/case/{id}"));
    test.id = TestCaseId::new(id);
    test.parent_id = ParentRef::from_ids(parents.iter().copied().map(TestCaseId::new));
    test.requires = requires.iter().map(|name| Requirement::new(*name, *name)).collect();
    (SuitePath::parse(path).unwrap(), test)
}

/// Shorthand id constructor.
const fn id(raw: i64) -> TestCaseId {
    TestCaseId::new(raw)
}

/// Builds the shared fixture: 1 -> {2, 3}, 2 -> 4, plus another suite.
fn snapshot() -> SuiteSnapshot {
    SuiteSnapshot::from_entries([
        case("Shop/login.json", 1, &[], &[]),
        case("Shop/cart/add.json", 2, &[1], &["token"]),
        case("Shop/cart/view.json", 3, &[1], &[]),
        case("Shop/cart/checkout.json", 4, &[2], &["cartId"]),
        case("Admin/login.json", 1, &[], &[]),
        case("Admin/users.json", 2, &[1], &[]),
    ])
}

/// Verifies descendants are breadth first and scoped to one suite.
#[test]
fn descendants_are_breadth_first_per_suite() {
    let shop = DependencyGraph::build(&snapshot(), &SuiteKey::new("Shop"));
    assert_eq!(shop.descendants(id(1)), vec![id(2), id(3), id(4)]);
    assert_eq!(shop.ancestors(id(4)), vec![id(2), id(1)]);
    let admin = DependencyGraph::build(&snapshot(), &SuiteKey::new("Admin"));
    assert_eq!(admin.descendants(id(1)), vec![id(2)]);
    assert!(shop.issues().is_empty());

    let found = compute_descendants(&snapshot(), &SuiteKey::new("Shop"), id(2));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].0.as_str(), "Shop/cart/checkout.json");
}

/// Verifies cycles terminate and are reported.
#[test]
fn cycles_terminate_and_are_reported() {
    let snapshot = SuiteSnapshot::from_entries([
        case("S/a.json", 1, &[3], &[]),
        case("S/b.json", 2, &[1], &[]),
        case("S/c.json", 3, &[2], &[]),
        case("S/d.json", 4, &[], &[]),
    ]);
    let graph = DependencyGraph::build(&snapshot, &SuiteKey::new("S"));
    assert_eq!(graph.descendants(id(1)), vec![id(2), id(3)]);
    assert!(graph.on_cycle(id(2)));
    assert!(!graph.on_cycle(id(4)));
    let members: Vec<TestCaseId> = graph
        .issues()
        .into_iter()
        .filter_map(|issue| match issue {
            GraphIssue::Cycle {
                member,
            } => Some(member),
            _ => None,
        })
        .collect();
    assert_eq!(members, vec![id(1), id(2), id(3)]);
}

/// Verifies dangling parents and duplicate ids are reported.
#[test]
fn dangling_and_duplicate_ids_are_reported() {
    let snapshot = SuiteSnapshot::from_entries([
        case("S/a.json", 1, &[99], &[]),
        case("S/b.json", 2, &[], &[]),
        case("S/z.json", 2, &[], &[]),
    ]);
    let graph = DependencyGraph::build(&snapshot, &SuiteKey::new("S"));
    let issues = graph.issues();
    assert!(issues.contains(&GraphIssue::DanglingParent {
        child: id(1),
        parent: id(99),
    }));
    assert!(issues.contains(&GraphIssue::DuplicateId {
        id: id(2),
        paths: vec![SuitePath::parse("S/b.json").unwrap(), SuitePath::parse("S/z.json").unwrap()],
    }));
    assert_eq!(graph.node(id(2)).unwrap().path.as_str(), "S/b.json");
}

/// Verifies cascade plans order deletions and clean surviving parents only.
#[test]
fn cascade_plan_cleans_surviving_parents() {
    let snapshot = SuiteSnapshot::from_entries([
        case("S/root.json", 1, &[], &[]),
        case("S/mid.json", 2, &[1], &[]),
        case("S/leaf.json", 3, &[2, 5], &["session"]),
        case("S/other.json", 5, &[], &[]),
    ]);
    let graph = DependencyGraph::build(&snapshot, &SuiteKey::new("S"));
    let plan = plan_cascade(&graph, id(2)).unwrap();
    let order: Vec<TestCaseId> = plan.steps.iter().map(|step| step.id).collect();
    assert_eq!(order, vec![id(2), id(3)]);
    let leaf = &plan.steps[1];
    assert_eq!(leaf.cleanups.len(), 1);
    assert_eq!(leaf.cleanups[0].parent, id(5));
    assert!(leaf.cleanups[0].names.contains("session"));
    assert!(plan_cascade(&graph, id(42)).is_none());
}

/// Verifies selecting a child pulls in its ancestors with notices.
#[test]
fn selection_adds_parents() {
    let graph = DependencyGraph::build(&snapshot(), &SuiteKey::new("Shop"));
    let mut selection = Selection::new();
    let notices = selection.select(&graph, id(4), SelectionMode::Interactive).unwrap();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].parent, id(2));
    assert_eq!(notices[1].parent, id(1));
    assert_eq!(notices[1].parent_name, "case 1");
    assert!(selection.is_selected(id(1)));

    let again = selection.select(&graph, id(3), SelectionMode::Interactive).unwrap();
    assert!(again.is_empty());

    let mut bulk = Selection::new();
    assert!(bulk.select(&graph, id(4), SelectionMode::Bulk).unwrap().is_empty());
    assert_eq!(bulk.ids().len(), 3);
    assert_eq!(
        bulk.select(&graph, id(77), SelectionMode::Bulk),
        Err(SelectionError::UnknownTestCase(id(77)))
    );
    assert!(bulk.deselect(id(4)));
    assert!(!bulk.deselect(id(4)));
}

/// Verifies bulk selection reports ids missing from the graph.
#[test]
fn select_all_reports_unknown_ids() {
    let graph = DependencyGraph::build(&snapshot(), &SuiteKey::new("Shop"));
    let mut selection = Selection::new();
    let unknown = selection.select_all(&graph, [id(4), id(77), id(88)]);
    assert_eq!(unknown, vec![id(77), id(88)]);
    assert_eq!(selection.ids().len(), 3);
    assert!(!selection.is_selected(id(77)));
}
