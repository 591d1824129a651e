// crates/api-verifier-core/src/runtime/store.rs
// ============================================================================
// Module: API Verifier In-Memory Stores
// Description: In-memory suite, precheck, validator, and run-history stores.
// Purpose: Provide deterministic store implementations without external deps.
// Dependencies: crate::core, crate::interfaces, time
// ============================================================================

//! ## Overview
//! This module provides in-memory implementations of every store interface
//! for tests and local demos. State lives in mutex-guarded maps shared by
//! clones of the same store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use time::OffsetDateTime;

use crate::core::CookieValidator;
use crate::core::FolderNode;
use crate::core::PrecheckSet;
use crate::core::RunListEntry;
use crate::core::RunQuery;
use crate::core::RunRecord;
use crate::core::SortOrder;
use crate::core::SuitePath;
use crate::core::TestCase;
use crate::core::build_tree;
use crate::interfaces::PrecheckStore;
use crate::interfaces::RunHistoryStore;
use crate::interfaces::StoreError;
use crate::interfaces::SuiteStore;
use crate::interfaces::ValidatorStore;

// ============================================================================
// SECTION: Suite Store
// ============================================================================

/// Mutable contents of an in-memory suite store.
#[derive(Debug, Default)]
struct SuiteState {
    /// Test cases keyed by path.
    tests: BTreeMap<SuitePath, TestCase>,
    /// Explicitly created folders.
    folders: BTreeSet<SuitePath>,
    /// Explicit orders keyed by folder path (`""` for the root).
    orders: BTreeMap<String, Vec<String>>,
    /// Registered prechecks.
    prechecks: PrecheckSet,
    /// Cookie validator reference.
    validator: Option<CookieValidator>,
}

impl SuiteState {
    /// Returns true when `path` names an existing folder (explicit or implied).
    fn folder_exists(&self, path: &SuitePath) -> bool {
        self.folders.iter().any(|folder| folder.starts_with(path))
            || self.tests.keys().any(|test| test != path && test.starts_with(path))
    }
}

/// In-memory suite store implementing every authoring store interface.
#[derive(Debug, Default, Clone)]
pub struct InMemorySuiteStore {
    /// Shared state protected by a mutex.
    state: Arc<Mutex<SuiteState>>,
}

impl InMemorySuiteStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the shared state.
    fn lock(&self) -> Result<MutexGuard<'_, SuiteState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Store("suite store mutex poisoned".to_string()))
    }
}

/// Returns the order-map key of a folder.
fn order_key(folder: Option<&SuitePath>) -> String {
    folder.map_or_else(String::new, |path| path.as_str().to_string())
}

/// Rebases `path` from `from` onto `to`.
fn rebase(path: &SuitePath, from: &SuitePath, to: &SuitePath) -> Result<SuitePath, StoreError> {
    let suffix = &path.as_str()[from.as_str().len() ..];
    SuitePath::parse(&format!("{to}{suffix}")).map_err(|err| StoreError::Invalid(err.to_string()))
}

impl SuiteStore for InMemorySuiteStore {
    fn tree(&self) -> Result<FolderNode, StoreError> {
        let state = self.lock()?;
        Ok(build_tree(state.folders.iter().cloned(), state.tests.keys().cloned(), &state.orders))
    }

    fn list_test_paths(&self) -> Result<Vec<SuitePath>, StoreError> {
        Ok(self.lock()?.tests.keys().cloned().collect())
    }

    fn read_test_case(&self, path: &SuitePath) -> Result<Option<TestCase>, StoreError> {
        Ok(self.lock()?.tests.get(path).cloned())
    }

    fn write_test_case(&self, path: &SuitePath, test_case: &TestCase) -> Result<(), StoreError> {
        if !path.is_test_file() {
            return Err(StoreError::Invalid(format!("not a test-case path: {path}")));
        }
        self.lock()?.tests.insert(path.clone(), test_case.clone());
        Ok(())
    }

    fn delete_test_case(&self, path: &SuitePath) -> Result<bool, StoreError> {
        Ok(self.lock()?.tests.remove(path).is_some())
    }

    fn move_entry(&self, from: &SuitePath, to: &SuitePath) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.tests.contains_key(to) || state.folder_exists(to) {
            return Err(StoreError::Conflict(to.to_string()));
        }
        if let Some(test) = state.tests.remove(from) {
            state.tests.insert(to.clone(), test);
            return Ok(());
        }
        if !state.folder_exists(from) {
            return Err(StoreError::NotFound(from.to_string()));
        }
        let moved_tests: Vec<SuitePath> =
            state.tests.keys().filter(|path| path.starts_with(from)).cloned().collect();
        for path in moved_tests {
            if let Some(test) = state.tests.remove(&path) {
                state.tests.insert(rebase(&path, from, to)?, test);
            }
        }
        let moved_folders: Vec<SuitePath> =
            state.folders.iter().filter(|path| path.starts_with(from)).cloned().collect();
        for path in moved_folders {
            state.folders.remove(&path);
            state.folders.insert(rebase(&path, from, to)?);
        }
        let moved_orders: Vec<String> = state
            .orders
            .keys()
            .filter(|key| SuitePath::parse(key).is_ok_and(|path| path.starts_with(from)))
            .cloned()
            .collect();
        for key in moved_orders {
            if let Some(order) = state.orders.remove(&key) {
                let path = SuitePath::parse(&key).map_err(|err| StoreError::Invalid(err.to_string()))?;
                state.orders.insert(rebase(&path, from, to)?.as_str().to_string(), order);
            }
        }
        Ok(())
    }

    fn create_folder(&self, path: &SuitePath) -> Result<(), StoreError> {
        self.lock()?.folders.insert(path.clone());
        Ok(())
    }

    fn delete_folder(&self, path: &SuitePath) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if !state.folder_exists(path) {
            return Err(StoreError::NotFound(path.to_string()));
        }
        state.tests.retain(|test, _| !test.starts_with(path));
        state.folders.retain(|folder| !folder.starts_with(path));
        state.orders.retain(|key, _| SuitePath::parse(key).map_or(true, |folder| !folder.starts_with(path)));
        Ok(())
    }

    fn read_order(&self, folder: Option<&SuitePath>) -> Result<Vec<String>, StoreError> {
        Ok(self.lock()?.orders.get(&order_key(folder)).cloned().unwrap_or_default())
    }

    fn write_order(&self, folder: Option<&SuitePath>, names: &[String]) -> Result<(), StoreError> {
        self.lock()?.orders.insert(order_key(folder), names.to_vec());
        Ok(())
    }
}

impl PrecheckStore for InMemorySuiteStore {
    fn load_prechecks(&self) -> Result<PrecheckSet, StoreError> {
        Ok(self.lock()?.prechecks.clone())
    }

    fn save_prechecks(&self, prechecks: &PrecheckSet) -> Result<(), StoreError> {
        self.lock()?.prechecks = prechecks.clone();
        Ok(())
    }
}

impl ValidatorStore for InMemorySuiteStore {
    fn load_validator(&self) -> Result<Option<CookieValidator>, StoreError> {
        Ok(self.lock()?.validator.clone())
    }

    fn save_validator(&self, validator: &CookieValidator) -> Result<(), StoreError> {
        self.lock()?.validator = Some(validator.clone());
        Ok(())
    }
}

// ============================================================================
// SECTION: Run History Store
// ============================================================================

/// In-memory run history for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRunHistoryStore {
    /// Runs keyed by id.
    runs: Arc<Mutex<BTreeMap<String, RunRecord>>>,
}

impl InMemoryRunHistoryStore {
    /// Creates an empty history store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunHistoryStore for InMemoryRunHistoryStore {
    fn save_run(&self, record: &RunRecord) -> Result<(), StoreError> {
        self.runs
            .lock()
            .map_err(|_| StoreError::Store("run history mutex poisoned".to_string()))?
            .insert(record.run_id.clone(), record.clone());
        Ok(())
    }

    fn load_run(&self, run_id: &str) -> Result<Option<RunRecord>, StoreError> {
        let guard =
            self.runs.lock().map_err(|_| StoreError::Store("run history mutex poisoned".to_string()))?;
        Ok(guard.get(run_id).cloned())
    }

    fn list_runs(&self, query: &RunQuery, now: OffsetDateTime) -> Result<Vec<RunListEntry>, StoreError> {
        let guard =
            self.runs.lock().map_err(|_| StoreError::Store("run history mutex poisoned".to_string()))?;
        let window = query.filter.bounds(now);
        let mut rows: Vec<RunListEntry> = guard
            .values()
            .filter(|record| {
                window.is_none_or(|(from, to)| record.started_at_ms >= from && record.started_at_ms < to)
            })
            .map(RunRecord::list_entry)
            .filter(|row| query.search.as_deref().is_none_or(|needle| row.matches_search(needle)))
            .collect();
        rows.sort_by(|left, right| {
            left.started_at_ms.cmp(&right.started_at_ms).then_with(|| left.run_id.cmp(&right.run_id))
        });
        if query.sort == SortOrder::Desc {
            rows.reverse();
        }
        let limit = query.limit.map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }
}
