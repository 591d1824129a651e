// crates/api-verifier-store-sqlite/tests/sqlite_run_store.rs
// ============================================================================
// Module: SQLite Run Store Tests
// Description: Persistence, listing, and integrity tests for run history.
// Purpose: Validate replace-on-save, SQL-side filtering and paging, schema
//          versioning, path safety, and corruption detection.
// Dependencies: api-verifier-core, api-verifier-store-sqlite, rusqlite
// ============================================================================

//! ## Overview
//! The `SQLite` store must answer every history query exactly like the
//! in-memory reference store. These tests pin that equivalence and the
//! fail-closed integrity checks.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;

use api_verifier_core::InMemoryRunHistoryStore;
use api_verifier_core::RunFilter;
use api_verifier_core::RunHistoryStore;
use api_verifier_core::RunQuery;
use api_verifier_core::RunRecord;
use api_verifier_core::RunStatus;
use api_verifier_core::SortOrder;
use api_verifier_core::StoreError;
use api_verifier_store_sqlite::SqliteRunStore;
use api_verifier_store_sqlite::SqliteStoreConfig;
use api_verifier_store_sqlite::SqliteStoreError;
use api_verifier_store_sqlite::SqliteStoreMode;
use api_verifier_store_sqlite::SqliteSyncMode;
use proptest::prelude::*;
use rusqlite::Connection;
use rusqlite::params;
use serde_json::json;
use tempfile::TempDir;
use time::OffsetDateTime;
use time::macros::datetime;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Milliseconds per day.
const DAY: i64 = 86_400_000;

/// Fixed clock used by every query.
fn now() -> OffsetDateTime {
    datetime!(2026-03-10 15:00 UTC)
}

/// Opens a store inside `dir`.
fn open(dir: &Path) -> SqliteRunStore {
    SqliteRunStore::new(&SqliteStoreConfig::new(dir.join("history.db"))).unwrap()
}

/// Builds a record started `days_back` days before the fixed clock.
fn record(id: &str, name: &str, days_back: i64, status: RunStatus, counts: (u64, u64, u64)) -> RunRecord {
    let started = now().unix_timestamp() * 1000 - days_back * DAY;
    RunRecord {
        run_id: id.to_string(),
        run_name: name.to_string(),
        started_at_ms: started,
        ended_at_ms: Some(started + 2_000),
        status,
        passed: counts.0,
        failed: counts.1,
        skipped: counts.2,
        document: json!({"summary": {"overall": {"totalSuites": 1}}, "details": {"cart": []}}),
    }
}

/// Returns a fixture set of runs spread over a month.
fn fixture() -> Vec<RunRecord> {
    vec![
        record("r1", "nightly", 0, RunStatus::Passed, (10, 0, 0)),
        record("r2", "smoke_100%", 1, RunStatus::Failed, (3, 1, 0)),
        record("r3", "Nightly", 5, RunStatus::Partial, (4, 0, 2)),
        record("r4", "release", 20, RunStatus::Failed, (0, 5, 0)),
        record("r5", "empty", 40, RunStatus::Passed, (0, 0, 0)),
    ]
}

/// Lists run ids for a query.
fn ids(store: &dyn RunHistoryStore, query: &RunQuery) -> Vec<String> {
    store.list_runs(query, now()).unwrap().into_iter().map(|row| row.run_id).collect()
}

// ============================================================================
// SECTION: Persistence
// ============================================================================

/// Verifies records round-trip, including the document.
#[test]
fn save_then_load_preserves_record() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());
    let run = record("r1", "nightly", 0, RunStatus::Partial, (4, 0, 1));
    store.save_run(&run).unwrap();
    assert_eq!(store.load_run("r1").unwrap(), Some(run));
    assert_eq!(store.load_run("missing").unwrap(), None);
}

/// Verifies saving an existing id replaces the row.
#[test]
fn save_replaces_existing_run() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());
    store.save_run(&record("r1", "first", 0, RunStatus::Failed, (1, 1, 0))).unwrap();
    store.save_run(&record("r1", "second", 0, RunStatus::Passed, (2, 0, 0))).unwrap();
    let rows = store.list_runs(&RunQuery::default(), now()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].run_name, "second");
    assert_eq!(rows[0].status, RunStatus::Passed);
    assert!((rows[0].pass_rate - 100.0).abs() < f64::EPSILON);
}

/// Verifies runs survive reopening the database.
#[test]
fn runs_persist_across_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = open(dir.path());
        store.save_run(&record("r1", "nightly", 0, RunStatus::Passed, (1, 0, 0))).unwrap();
    }
    let store = open(dir.path());
    assert!(store.load_run("r1").unwrap().is_some());
}

/// Verifies explicit pragmas are accepted.
#[test]
fn delete_journal_and_normal_sync_open() {
    let dir = TempDir::new().unwrap();
    let config = SqliteStoreConfig {
        path: dir.path().join("nested").join("history.db"),
        busy_timeout_ms: 250,
        journal_mode: SqliteStoreMode::Delete,
        sync_mode: SqliteSyncMode::Normal,
    };
    let store = SqliteRunStore::new(&config).unwrap();
    store.save_run(&record("r1", "nightly", 0, RunStatus::Passed, (1, 0, 0))).unwrap();
    assert_eq!(ids(&store, &RunQuery::default()), vec!["r1"]);
}

/// Verifies empty run ids are rejected.
#[test]
fn empty_run_id_rejected() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());
    let err = store.save_run(&record(" ", "x", 0, RunStatus::Passed, (0, 0, 0))).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

// ============================================================================
// SECTION: Listing
// ============================================================================

/// Verifies date windows match the in-memory store.
#[test]
fn filters_select_date_windows() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());
    for run in fixture() {
        store.save_run(&run).unwrap();
    }
    let query = |filter| RunQuery {
        filter,
        ..RunQuery::default()
    };
    assert_eq!(ids(&store, &query(RunFilter::Today)), vec!["r1"]);
    assert_eq!(ids(&store, &query(RunFilter::Yesterday)), vec!["r2"]);
    assert_eq!(ids(&store, &query(RunFilter::Last7)), vec!["r1", "r2", "r3"]);
    assert_eq!(ids(&store, &query(RunFilter::Last30)), vec!["r1", "r2", "r3", "r4"]);
    assert_eq!(ids(&store, &query(RunFilter::All)).len(), 5);
    let range = RunFilter::parse("2026-02-18..2026-03-05").unwrap();
    assert_eq!(ids(&store, &query(range)), vec!["r3", "r4"]);
}

/// Verifies search is case-insensitive and treats wildcards literally.
#[test]
fn search_matches_id_name_and_status() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());
    for run in fixture() {
        store.save_run(&run).unwrap();
    }
    let search = |needle: &str| RunQuery {
        search: Some(needle.to_string()),
        sort: SortOrder::Asc,
        ..RunQuery::default()
    };
    assert_eq!(ids(&store, &search("NIGHTLY")), vec!["r3", "r1"]);
    assert_eq!(ids(&store, &search("failed")), vec!["r4", "r2"]);
    assert_eq!(ids(&store, &search("100%")), vec!["r2"]);
    assert_eq!(ids(&store, &search("_1")), vec!["r2"]);
    assert_eq!(ids(&store, &search("  ")).len(), 5);
}

/// Verifies ordering and paging.
#[test]
fn sort_and_paging() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());
    for run in fixture() {
        store.save_run(&run).unwrap();
    }
    let page = RunQuery {
        limit: Some(2),
        offset: 1,
        ..RunQuery::default()
    };
    assert_eq!(ids(&store, &page), vec!["r2", "r3"]);
    let asc = RunQuery {
        sort: SortOrder::Asc,
        limit: Some(2),
        ..RunQuery::default()
    };
    assert_eq!(ids(&store, &asc), vec!["r5", "r4"]);
}

/// Verifies list rows carry totals and percentage pass rates.
#[test]
fn list_rows_carry_pass_rate() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());
    for run in fixture() {
        store.save_run(&run).unwrap();
    }
    let rows = store.list_runs(&RunQuery::default(), now()).unwrap();
    let r2 = rows.iter().find(|row| row.run_id == "r2").unwrap();
    assert_eq!(r2.total, 4);
    assert!((r2.pass_rate - 75.0).abs() < 1e-9);
    let r5 = rows.iter().find(|row| row.run_id == "r5").unwrap();
    assert!(r5.pass_rate.abs() < f64::EPSILON);
}

// ============================================================================
// SECTION: Integrity
// ============================================================================

/// Verifies a tampered document fails closed.
#[test]
fn tampered_document_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());
    store.save_run(&record("r1", "nightly", 0, RunStatus::Passed, (1, 0, 0))).unwrap();
    let connection = Connection::open(dir.path().join("history.db")).unwrap();
    connection
        .execute("UPDATE runs SET document = ?1 WHERE run_id = 'r1'", params![b"{}".to_vec()])
        .unwrap();
    let err = store.load_run("r1").unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}

/// Verifies an unknown stored status fails closed on listing.
#[test]
fn unknown_status_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());
    store.save_run(&record("r1", "nightly", 0, RunStatus::Passed, (1, 0, 0))).unwrap();
    let connection = Connection::open(dir.path().join("history.db")).unwrap();
    connection.execute("UPDATE runs SET status = 'Exploded'", params![]).unwrap();
    let err = store.list_runs(&RunQuery::default(), now()).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}

/// Verifies an unsupported schema version is rejected on open.
#[test]
fn schema_version_mismatch_rejected() {
    let dir = TempDir::new().unwrap();
    drop(open(dir.path()));
    let connection = Connection::open(dir.path().join("history.db")).unwrap();
    connection.execute("UPDATE store_meta SET version = 99", params![]).unwrap();
    drop(connection);
    let result = SqliteRunStore::new(&SqliteStoreConfig::new(dir.path().join("history.db")));
    assert!(matches!(result, Err(SqliteStoreError::VersionMismatch(_))));
}

/// Verifies directory paths and overlong components are rejected.
#[test]
fn unsafe_paths_rejected() {
    let dir = TempDir::new().unwrap();
    let result = SqliteRunStore::new(&SqliteStoreConfig::new(dir.path()));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
    let long = dir.path().join("a".repeat(300));
    let result = SqliteRunStore::new(&SqliteStoreConfig::new(long));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

// ============================================================================
// SECTION: Properties
// ============================================================================

/// Strategy over history filters.
fn filter_strategy() -> impl Strategy<Value = RunFilter> {
    prop_oneof![
        Just(RunFilter::All),
        Just(RunFilter::Today),
        Just(RunFilter::Yesterday),
        Just(RunFilter::Last7),
        Just(RunFilter::Last30),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Verifies SQL-side listing matches the in-memory reference store.
    #[test]
    fn listing_matches_in_memory_reference(
        filter in filter_strategy(),
        search in prop::option::of(prop_oneof![Just("night"), Just("FAIL"), Just("r"), Just("zzz")]),
        asc in any::<bool>(),
        limit in prop::option::of(1_u32 .. 6),
        offset in 0_u32 .. 6,
    ) {
        let dir = TempDir::new().unwrap();
        let sqlite = open(dir.path());
        let memory = InMemoryRunHistoryStore::new();
        for run in fixture() {
            sqlite.save_run(&run).unwrap();
            memory.save_run(&run).unwrap();
        }
        let query = RunQuery {
            filter,
            search: search.map(str::to_string),
            sort: if asc { SortOrder::Asc } else { SortOrder::Desc },
            limit,
            offset,
        };
        prop_assert_eq!(ids(&sqlite, &query), ids(&memory, &query));
    }
}
