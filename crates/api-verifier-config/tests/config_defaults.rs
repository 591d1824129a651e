//! Config defaults and validation tests for api-verifier-config.
// crates/api-verifier-config/tests/config_defaults.rs
// =============================================================================
// Module: Config Defaults and Validation Tests
// Description: Validate default behavior and section invariants.
// Purpose: Ensure an empty config is valid and each section fails closed.
// =============================================================================

use std::path::PathBuf;

use api_verifier_config::ApiVerifierConfig;
use api_verifier_config::AuditSinkKind;
use api_verifier_config::RunStoreType;
use api_verifier_store_sqlite::SqliteStoreMode;
use api_verifier_store_sqlite::SqliteSyncMode;

mod common;

use common::TestResult;
use common::assert_invalid;

#[test]
fn default_config_validates() -> TestResult {
    let config = common::minimal_config()?;
    config.validate().map_err(|err| err.to_string())?;
    if config.storage.testcases_dir != PathBuf::from("testcases") {
        return Err("storage.testcases_dir should default to testcases".to_string());
    }
    if config.storage.config_dir != PathBuf::from("config") {
        return Err("storage.config_dir should default to config".to_string());
    }
    if config.run_store.store_type != RunStoreType::Memory || config.run_store.sqlite_config().is_some() {
        return Err("run_store should default to memory".to_string());
    }
    if config.audit.sink != AuditSinkKind::Stderr {
        return Err("audit.sink should default to stderr".to_string());
    }
    if config.ids.first_id != 100 {
        return Err("ids.first_id should default to 100".to_string());
    }
    Ok(())
}

#[test]
fn full_config_parses() -> TestResult {
    let config = ApiVerifierConfig::from_toml(
        r#"
        [storage]
        testcases_dir = "suites"
        config_dir = "shared"

        [run_store]
        type = "sqlite"
        path = "data/history.db"
        busy_timeout_ms = 250
        journal_mode = "delete"
        sync_mode = "normal"

        [audit]
        sink = "file"
        path = "logs/audit.jsonl"

        [limits]
        max_testcase_bytes = 2048
        max_results_bytes = 4096
        max_csv_bytes = 1024

        [ids]
        first_id = 1
        "#,
    )
    .map_err(|err| err.to_string())?;
    let sqlite = config.run_store.sqlite_config().ok_or("sqlite config missing")?;
    if sqlite.path != PathBuf::from("data/history.db")
        || sqlite.busy_timeout_ms != 250
        || sqlite.journal_mode != SqliteStoreMode::Delete
        || sqlite.sync_mode != SqliteSyncMode::Normal
    {
        return Err("sqlite config did not carry run_store settings".to_string());
    }
    if config.audit.sink != AuditSinkKind::File || config.limits.max_csv_bytes != 1024 {
        return Err("audit or limits not parsed".to_string());
    }
    Ok(())
}

#[test]
fn audit_sink_none_parses() -> TestResult {
    let config = ApiVerifierConfig::from_toml("[audit]\nsink = \"none\"\n").map_err(|err| err.to_string())?;
    if config.audit.sink != AuditSinkKind::Disabled {
        return Err("audit.sink none should disable auditing".to_string());
    }
    Ok(())
}

#[test]
fn unknown_fields_rejected() -> TestResult {
    match ApiVerifierConfig::from_toml("[storage]\nsuites = \"x\"\n") {
        Err(err) if err.to_string().contains("config parse error") => Ok(()),
        Err(err) => Err(format!("unexpected error: {err}")),
        Ok(_) => Err("unknown field should be rejected".to_string()),
    }
}

#[test]
fn empty_storage_paths_rejected() -> TestResult {
    let mut config = common::minimal_config()?;
    config.storage.testcases_dir = PathBuf::from("  ");
    assert_invalid(config.validate(), "storage.testcases_dir must be non-empty")?;
    let mut config = common::minimal_config()?;
    config.storage.config_dir = PathBuf::from("a".repeat(300));
    assert_invalid(config.validate(), "storage.config_dir path component too long")
}

#[test]
fn sqlite_run_store_requires_path() -> TestResult {
    let mut config = common::minimal_config()?;
    config.run_store.store_type = RunStoreType::Sqlite;
    assert_invalid(config.validate(), "sqlite run_store requires path")
}

#[test]
fn memory_run_store_rejects_path() -> TestResult {
    let mut config = common::minimal_config()?;
    config.run_store.path = Some(PathBuf::from("history.db"));
    assert_invalid(config.validate(), "memory run_store must not set path")
}

#[test]
fn busy_timeout_bounded() -> TestResult {
    let mut config = common::minimal_config()?;
    config.run_store.busy_timeout_ms = 120_000;
    assert_invalid(config.validate(), "run_store.busy_timeout_ms")
}

#[test]
fn audit_file_requires_path() -> TestResult {
    let mut config = common::minimal_config()?;
    config.audit.sink = AuditSinkKind::File;
    assert_invalid(config.validate(), "audit.sink=file requires audit.path")?;
    config.audit.path = Some(String::new());
    assert_invalid(config.validate(), "audit.path must be non-empty")
}

#[test]
fn audit_path_only_for_file_sink() -> TestResult {
    let mut config = common::minimal_config()?;
    config.audit.path = Some("audit.jsonl".to_string());
    assert_invalid(config.validate(), "audit.path only allowed")
}

#[test]
fn limits_bounded() -> TestResult {
    let mut config = common::minimal_config()?;
    config.limits.max_testcase_bytes = 0;
    assert_invalid(config.validate(), "limits.max_testcase_bytes must be between")?;
    let mut config = common::minimal_config()?;
    config.limits.max_results_bytes = usize::MAX;
    assert_invalid(config.validate(), "limits.max_results_bytes must be between")?;
    let mut config = common::minimal_config()?;
    config.limits.max_csv_bytes = 65 * 1024 * 1024;
    assert_invalid(config.validate(), "limits.max_csv_bytes must be between")
}

#[test]
fn first_id_must_be_positive() -> TestResult {
    let mut config = common::minimal_config()?;
    config.ids.first_id = 0;
    assert_invalid(config.validate(), "ids.first_id must be positive")
}
