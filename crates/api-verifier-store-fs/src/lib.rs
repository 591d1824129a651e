// crates/api-verifier-store-fs/src/lib.rs
// ============================================================================
// Module: Filesystem Suite Store
// Description: SuiteStore, PrecheckStore, and ValidatorStore over a directory.
// Purpose: Persist suites as one JSON file per test case.
// Dependencies: api-verifier-core, serde_json
// ============================================================================

//! ## Overview
//! Suites live under a test-case root directory: each top-level directory is
//! a suite, nested directories are folders, and every `.json` file is one
//! test case. A folder's `order.txt` pins its sibling order. Shared
//! configuration (`prechecks.json`, `cookie-validator.json`) lives in a
//! separate config directory. Security posture: every path is validated and
//! symlinks are never followed while walking the tree.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::COOKIE_VALIDATOR_FILE_NAME;
pub use store::FsStoreConfig;
pub use store::FsSuiteStore;
pub use store::PRECHECKS_FILE_NAME;
