// crates/api-verifier-store-fs/tests/fs_store.rs
// ============================================================================
// Module: Filesystem Suite Store Tests
// Description: Directory layout, ordering, and shared-config persistence.
// Purpose: Validate the on-disk mapping and its fail-closed checks.
// Dependencies: api-verifier-core, api-verifier-store-fs, tempfile
// ============================================================================

//! ## Overview
//! Exercises [`FsSuiteStore`] against temporary directories, both directly
//! and through the authoring service.

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

use std::fs;
use std::sync::Arc;

use api_verifier_core::Authoring;
use api_verifier_core::AuthoringSession;
use api_verifier_core::NoopAuditSink;
use api_verifier_core::ParentRef;
use api_verifier_core::PrecheckStore;
use api_verifier_core::Requirement;
use api_verifier_core::StoreError;
use api_verifier_core::SuitePath;
use api_verifier_core::SuiteStore;
use api_verifier_core::TestCase;
use api_verifier_core::TestCaseId;
use api_verifier_core::ValidatorStore;
use api_verifier_store_fs::FsStoreConfig;
use api_verifier_store_fs::FsSuiteStore;
use api_verifier_store_fs::PRECHECKS_FILE_NAME;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Parses a suite path.
fn path(raw: &str) -> SuitePath {
    SuitePath::parse(raw).unwrap()
}

/// Opens a store rooted in `dir`.
fn open(dir: &TempDir) -> FsSuiteStore {
    FsSuiteStore::new(FsStoreConfig::new(dir.path().join("testcases"), dir.path().join("config"))).unwrap()
}

/// Builds a test case with an explicit id.
fn case(id: i64, name: &str) -> TestCase {
    let mut test = TestCase::draft(name, format!("/{name}"));
    test.id = TestCaseId::new(id);
    test
}

// ============================================================================
// SECTION: Test Cases
// ============================================================================

/// Verifies test cases map onto JSON files and read back unchanged.
#[test]
fn write_then_read_uses_json_files() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let test = case(100, "login");
    store.write_test_case(&path("Shop/auth/login.json"), &test).unwrap();
    let on_disk = dir.path().join("testcases/Shop/auth/login.json");
    let value: serde_json::Value = serde_json::from_slice(&fs::read(on_disk).unwrap()).unwrap();
    assert_eq!(value["id"], json!(100));
    assert_eq!(value["name"], json!("login"));
    assert_eq!(store.read_test_case(&path("Shop/auth/login.json")).unwrap(), Some(test));
    assert_eq!(store.read_test_case(&path("Shop/absent.json")).unwrap(), None);
}

/// Verifies hand-written files with legacy shapes are accepted.
#[test]
fn reads_hand_written_definitions() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let folder = dir.path().join("testcases/Shop");
    fs::create_dir_all(&folder).unwrap();
    fs::write(
        folder.join("cart.json"),
        r#"{"id": 7, "name": "cart", "endpoint": "/cart", "parentId": ["3", 4], "notes": "kept"}"#,
    )
    .unwrap();
    let test = store.read_test_case(&path("Shop/cart.json")).unwrap().unwrap();
    assert_eq!(test.id, TestCaseId::new(7));
    assert_eq!(test.parent_id, ParentRef::from_ids([TestCaseId::new(3), TestCaseId::new(4)]));
    assert_eq!(test.extra.get("notes"), Some(&json!("kept")));
}

/// Verifies unparsable and oversized files fail closed.
#[test]
fn corrupt_and_oversized_files_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = FsStoreConfig::new(dir.path().join("testcases"), dir.path().join("config"));
    config.max_testcase_bytes = 64;
    let store = FsSuiteStore::new(config).unwrap();
    let folder = dir.path().join("testcases/Shop");
    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("bad.json"), "{not json").unwrap();
    assert!(matches!(store.read_test_case(&path("Shop/bad.json")), Err(StoreError::Corrupt(_))));
    fs::write(folder.join("big.json"), format!("{{\"name\": \"{}\"}}", "x".repeat(100))).unwrap();
    assert!(matches!(store.read_test_case(&path("Shop/big.json")), Err(StoreError::Invalid(_))));
    let mut big = case(1, "big");
    big.endpoint = "/".repeat(200);
    assert!(matches!(store.write_test_case(&path("Shop/big2.json"), &big), Err(StoreError::Invalid(_))));
}

/// Verifies non-test paths are rejected for test-case operations.
#[test]
fn folder_paths_rejected_for_test_cases() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    assert!(matches!(store.read_test_case(&path("Shop/auth")), Err(StoreError::Invalid(_))));
    assert!(matches!(store.write_test_case(&path("Shop/auth"), &case(1, "x")), Err(StoreError::Invalid(_))));
    assert!(matches!(store.create_folder(&path("Shop/x.json")), Err(StoreError::Invalid(_))));
}

/// Verifies deletes report whether anything was removed.
#[test]
fn delete_reports_presence() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.write_test_case(&path("Shop/a.json"), &case(1, "a")).unwrap();
    assert!(store.delete_test_case(&path("Shop/a.json")).unwrap());
    assert!(!store.delete_test_case(&path("Shop/a.json")).unwrap());
}

// ============================================================================
// SECTION: Tree and Ordering
// ============================================================================

/// Verifies the tree honours order files and ignores foreign files.
#[test]
fn tree_uses_order_files() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    for (raw, id) in [("Shop/b.json", 1), ("Shop/a.json", 2), ("Shop/Z.json", 3), ("Shop/pay/x.json", 4)] {
        store.write_test_case(&path(raw), &case(id, raw)).unwrap();
    }
    store.create_folder(&path("Blog")).unwrap();
    let shop = dir.path().join("testcases/Shop");
    fs::write(shop.join("order.txt"), "# pinned first\nb.json\n\npay\n").unwrap();
    fs::write(shop.join("README.md"), "ignored").unwrap();
    fs::write(shop.join(".hidden.json"), "{}").unwrap();

    let tree = store.tree().unwrap();
    let names: Vec<&str> = tree.folders.iter().map(|folder| folder.name.as_str()).collect();
    assert_eq!(names, vec!["Blog", "Shop"]);
    let shop_node = tree.child("Shop").unwrap();
    assert_eq!(shop_node.tests, vec!["b.json", "a.json", "Z.json"]);
    assert_eq!(shop_node.folders[0].path, "Shop/pay");
    assert_eq!(
        tree.file_order(),
        vec!["Shop/b.json", "Shop/a.json", "Shop/Z.json", "Shop/pay/x.json"]
    );
    assert_eq!(store.list_test_paths().unwrap().len(), 4);
}

/// Verifies order round-trips through `order.txt`.
#[test]
fn order_round_trips_through_file() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let order = vec!["Shop".to_string(), "Blog".to_string()];
    store.write_order(None, &order).unwrap();
    assert_eq!(store.read_order(None).unwrap(), order);
    assert_eq!(fs::read_to_string(dir.path().join("testcases/order.txt")).unwrap(), "Shop\nBlog\n");
    assert!(store.read_order(Some(&path("Shop"))).unwrap().is_empty());
}

/// Verifies moves and folder deletes operate on whole subtrees.
#[test]
fn move_and_delete_folders() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.write_test_case(&path("Shop/cart/add.json"), &case(1, "add")).unwrap();
    store.write_test_case(&path("Shop/cart/pay/card.json"), &case(2, "card")).unwrap();
    store.move_entry(&path("Shop/cart"), &path("Shop/basket")).unwrap();
    assert_eq!(
        store.list_test_paths().unwrap(),
        vec![path("Shop/basket/add.json"), path("Shop/basket/pay/card.json")]
    );
    assert!(matches!(
        store.move_entry(&path("Shop/cart"), &path("Shop/other")),
        Err(StoreError::NotFound(_))
    ));
    store.write_test_case(&path("Shop/x.json"), &case(3, "x")).unwrap();
    assert!(matches!(
        store.move_entry(&path("Shop/x.json"), &path("Shop/basket/add.json")),
        Err(StoreError::Conflict(_))
    ));
    store.delete_folder(&path("Shop/basket")).unwrap();
    assert_eq!(store.list_test_paths().unwrap(), vec![path("Shop/x.json")]);
    assert!(matches!(store.delete_folder(&path("Shop/basket")), Err(StoreError::NotFound(_))));
}

// ============================================================================
// SECTION: Shared Config
// ============================================================================

/// Verifies prechecks and the cookie validator persist in the config dir.
#[test]
fn shared_config_documents_persist() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    assert!(store.load_prechecks().unwrap().is_empty());
    assert!(store.load_validator().unwrap().is_none());

    let authoring = Authoring::new(store.clone(), Arc::new(NoopAuditSink));
    authoring
        .create_precheck("isAdmin", &json!({"endpoint": "/me", "extractPath": "role", "value": "admin"}))
        .unwrap();
    store.write_test_case(&path("Shop/login.json"), &case(100, "login")).unwrap();
    authoring.set_cookie_validator(&path("Shop/login.json")).unwrap();

    let reopened = open(&dir);
    assert_eq!(reopened.load_prechecks().unwrap().len(), 1);
    let validator = reopened.load_validator().unwrap().unwrap();
    assert_eq!(validator.endpoint, "/login");
    assert!(dir.path().join("config").join(PRECHECKS_FILE_NAME).is_file());
}

/// Verifies a corrupt precheck registry fails closed.
#[test]
fn corrupt_prechecks_rejected() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    fs::create_dir_all(dir.path().join("config")).unwrap();
    fs::write(dir.path().join("config").join(PRECHECKS_FILE_NAME), "[1, 2").unwrap();
    assert!(matches!(store.load_prechecks(), Err(StoreError::Corrupt(_))));
}

// ============================================================================
// SECTION: Authoring Integration
// ============================================================================

/// Verifies create, requires merge, and cascade delete on disk.
#[test]
fn authoring_cascade_on_disk() {
    let dir = TempDir::new().unwrap();
    let authoring = Authoring::new(open(&dir), Arc::new(NoopAuditSink));
    let session = AuthoringSession::new("Shop");
    let login = authoring.create(&session, &path("Shop/login.json"), TestCase::draft("login", "/login")).unwrap();
    assert_eq!(login.id, TestCaseId::new(100));
    let mut profile = TestCase::draft("profile", "/profile");
    profile.parent_id = ParentRef::from_ids([login.id]);
    profile.requires = vec![Requirement::new("token", "token")];
    let profile = authoring.create(&session, &path("Shop/profile.json"), profile).unwrap();
    assert_eq!(profile.id, TestCaseId::new(101));
    assert_eq!(
        authoring.read(&path("Shop/login.json")).unwrap().requires,
        vec![Requirement::new("token", "token")]
    );

    let report = authoring.delete_with_cascade(&session, login.id).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.deleted(), 2);
    assert!(authoring.store().list_test_paths().unwrap().is_empty());
}
