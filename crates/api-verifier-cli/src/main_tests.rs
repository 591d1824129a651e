// crates/api-verifier-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for bounded reads and argument parsing helpers.
// Purpose: Ensure CLI inputs fail closed on oversized or malformed values.
// Dependencies: api-verifier-cli main helpers, tempfile
// ============================================================================

//! ## Overview
//! Validates `read_bytes_with_limit`, inline JSON bounds, and run-query
//! construction from list arguments.

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use api_verifier_core::RunFilter;
use api_verifier_core::SortOrder;
use tempfile::TempDir;

use super::MAX_INLINE_JSON_BYTES;
use super::ReadLimitError;
use super::RunsListCommand;
use super::build_run_query;
use super::parse_inline_json;
use super::read_bytes_with_limit;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds list arguments with defaults matching the CLI.
fn list_command(filter: &str, sort: &str) -> RunsListCommand {
    RunsListCommand {
        filter: filter.to_string(),
        search: None,
        limit: None,
        offset: 0,
        sort: sort.to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Verifies files within the limit are read in full.
#[test]
fn read_bytes_with_limit_allows_small_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("small.bin");
    fs::write(&path, b"ok").expect("write temp file");
    let bytes = read_bytes_with_limit(&path, 4).expect("read small file");
    assert_eq!(bytes, b"ok");
}

/// Verifies a file exactly at the limit is accepted.
#[test]
fn read_bytes_with_limit_allows_exact_limit() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("exact.bin");
    fs::write(&path, b"abcd").expect("write temp file");
    assert_eq!(read_bytes_with_limit(&path, 4).expect("read exact file").len(), 4);
}

/// Verifies oversized files are rejected with their size.
#[test]
fn read_bytes_with_limit_rejects_large_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("large.bin");
    fs::write(&path, b"toolarge").expect("write temp file");
    match read_bytes_with_limit(&path, 4) {
        Err(ReadLimitError::TooLarge {
            size,
            limit,
        }) => {
            assert_eq!(size, 8);
            assert_eq!(limit, 4);
        }
        other => panic!("expected TooLarge, got {other:?}"),
    }
}

/// Verifies missing files surface as I/O errors.
#[test]
fn read_bytes_with_limit_reports_missing_file() {
    let dir = TempDir::new().expect("temp dir");
    let result = read_bytes_with_limit(&dir.path().join("missing.bin"), 4);
    assert!(matches!(result, Err(ReadLimitError::Io(_))));
}

/// Verifies inline JSON is parsed and malformed input is rejected.
#[test]
fn parse_inline_json_accepts_objects_and_rejects_garbage() {
    let value = parse_inline_json("check fields", r#"{"path":"data.id"}"#).expect("valid json");
    assert_eq!(value["path"], "data.id");
    let err = parse_inline_json("check fields", "{not json").expect_err("invalid json");
    assert!(err.to_string().starts_with("Invalid JSON for check fields"));
}

/// Verifies oversized inline JSON fails before parsing.
#[test]
fn parse_inline_json_rejects_oversized_argument() {
    let raw = format!("\"{}\"", "x".repeat(MAX_INLINE_JSON_BYTES));
    let err = parse_inline_json("precheck rule", &raw).expect_err("oversized");
    assert!(err.to_string().contains("Refusing to read precheck rule"));
}

/// Verifies list arguments map onto a history query.
#[test]
fn build_run_query_maps_arguments() {
    let mut command = list_command("last7", "asc");
    command.search = Some("  smoke ".to_string());
    command.limit = Some(10);
    command.offset = 5;
    let query = build_run_query(&command).expect("query");
    assert_eq!(query.filter, RunFilter::Last7);
    assert_eq!(query.sort, SortOrder::Asc);
    assert_eq!(query.search.as_deref(), Some("smoke"));
    assert_eq!(query.limit, Some(10));
    assert_eq!(query.offset, 5);
}

/// Verifies blank search text is treated as no search.
#[test]
fn build_run_query_drops_blank_search() {
    let mut command = list_command("all", "desc");
    command.search = Some("   ".to_string());
    let query = build_run_query(&command).expect("query");
    assert_eq!(query.search, None);
    assert_eq!(query.sort, SortOrder::Desc);
}

/// Verifies unknown filters and sort orders are rejected.
#[test]
fn build_run_query_rejects_unknown_values() {
    let err = build_run_query(&list_command("lastyear", "desc")).expect_err("bad filter");
    assert!(err.to_string().starts_with("Invalid run filter"));
    let err = build_run_query(&list_command("all", "sideways")).expect_err("bad sort");
    assert!(err.to_string().contains("sideways"));
}
