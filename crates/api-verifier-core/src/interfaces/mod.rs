// crates/api-verifier-core/src/interfaces/mod.rs
// ============================================================================
// Module: API Verifier Interfaces
// Description: Backend-agnostic persistence interfaces.
// Purpose: Define the contracts between the core and its storage collaborators.
// Dependencies: crate::core, thiserror, time
// ============================================================================

//! ## Overview
//! Interfaces decouple the core from storage. Suite definitions live behind
//! [`SuiteStore`], named prechecks behind [`PrecheckStore`], the cookie
//! validator reference behind [`ValidatorStore`], and completed runs behind
//! [`RunHistoryStore`]. Implementations must be deterministic for a given
//! store state and must report failures instead of silently skipping data.
//!
//! Security posture: store contents are untrusted; implementations validate
//! paths and sizes before touching the backing medium.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use time::OffsetDateTime;

use crate::core::CookieValidator;
use crate::core::FolderNode;
use crate::core::PrecheckSet;
use crate::core::RunListEntry;
use crate::core::RunQuery;
use crate::core::RunRecord;
use crate::core::SuitePath;
use crate::core::TestCase;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Errors raised by store implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backing medium I/O failure.
    #[error("store io error: {0}")]
    Io(String),
    /// Stored data is corrupted or fails to parse.
    #[error("store corruption: {0}")]
    Corrupt(String),
    /// Stored data version is incompatible.
    #[error("store version mismatch: {0}")]
    VersionMismatch(String),
    /// Requested entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Entry already exists.
    #[error("already exists: {0}")]
    Conflict(String),
    /// Request is invalid (bad path, oversized payload).
    #[error("invalid store request: {0}")]
    Invalid(String),
    /// Store-internal failure (poisoned lock, backend error).
    #[error("store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Suite Store
// ============================================================================

/// Persistence of suite folders and test-case definitions.
///
/// Folder arguments of `None` address the store root (the list of suites).
pub trait SuiteStore: Send + Sync {
    /// Returns the ordered folder tree of the whole store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the tree cannot be read.
    fn tree(&self) -> Result<FolderNode, StoreError>;

    /// Returns the path of every stored test case.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the listing fails.
    fn list_test_paths(&self) -> Result<Vec<SuitePath>, StoreError>;

    /// Reads one test case; `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the entry cannot be read or parsed.
    fn read_test_case(&self, path: &SuitePath) -> Result<Option<TestCase>, StoreError>;

    /// Writes one test case, creating parent folders as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn write_test_case(&self, path: &SuitePath, test_case: &TestCase) -> Result<(), StoreError>;

    /// Deletes one test case; returns false when it was already absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete_test_case(&self, path: &SuitePath) -> Result<bool, StoreError>;

    /// Moves a test case or folder to a new path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the source is absent and
    /// [`StoreError::Conflict`] when the target exists.
    fn move_entry(&self, from: &SuitePath, to: &SuitePath) -> Result<(), StoreError>;

    /// Creates a folder (and missing parents).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when creation fails.
    fn create_folder(&self, path: &SuitePath) -> Result<(), StoreError>;

    /// Deletes a folder and everything beneath it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the folder is absent.
    fn delete_folder(&self, path: &SuitePath) -> Result<(), StoreError>;

    /// Reads the explicit sibling order of a folder.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the order cannot be read.
    fn read_order(&self, folder: Option<&SuitePath>) -> Result<Vec<String>, StoreError>;

    /// Persists the explicit sibling order of a folder.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the order cannot be written.
    fn write_order(&self, folder: Option<&SuitePath>, names: &[String]) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Precheck and Validator Stores
// ============================================================================

/// Persistence of the named precheck registry.
pub trait PrecheckStore: Send + Sync {
    /// Loads every registered precheck.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load_prechecks(&self) -> Result<PrecheckSet, StoreError>;

    /// Replaces the registry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when saving fails.
    fn save_prechecks(&self, prechecks: &PrecheckSet) -> Result<(), StoreError>;
}

/// Persistence of the cookie validator reference.
pub trait ValidatorStore: Send + Sync {
    /// Loads the current reference, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load_validator(&self) -> Result<Option<CookieValidator>, StoreError>;

    /// Saves the reference.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when saving fails.
    fn save_validator(&self, validator: &CookieValidator) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Run History Store
// ============================================================================

/// Persistence of completed runs.
pub trait RunHistoryStore: Send + Sync {
    /// Saves a run, replacing any run with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when saving fails.
    fn save_run(&self, record: &RunRecord) -> Result<(), StoreError>;

    /// Loads one run by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load_run(&self, run_id: &str) -> Result<Option<RunRecord>, StoreError>;

    /// Lists runs matching `query`; relative date filters use `now`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the listing fails.
    fn list_runs(&self, query: &RunQuery, now: OffsetDateTime) -> Result<Vec<RunListEntry>, StoreError>;
}
