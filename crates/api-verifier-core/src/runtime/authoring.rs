// crates/api-verifier-core/src/runtime/authoring.rs
// ============================================================================
// Module: API Verifier Authoring Service
// Description: Validated mutations of suites, test cases, and prechecks.
// Purpose: Apply authoring operations with id assignment and cascade rules.
// Dependencies: crate::{audit, core, interfaces, runtime::graph}, serde, thiserror
// ============================================================================

//! ## Overview
//! [`Authoring`] is the single entry point for mutating stored definitions.
//! Operations take an explicit [`AuthoringSession`] naming the suite being
//! edited; no ambient "current suite" state exists.
//!
//! - Creating or updating a test case assigns an id when the draft has
//!   none, checks suite-level id uniqueness and parent existence, and merges
//!   the test case's `requires` into each parent's `requires`.
//! - Deleting a test case cascades to every descendant. Each step is
//!   applied independently and reported in a [`CascadeReport`]; a failed
//!   step never rolls back earlier ones.
//! - Every mutation emits an audit event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::audit::AuditOutcome;
use crate::audit::AuditSink;
use crate::audit::AuthoringAuditEvent;
use crate::audit::AuthoringAuditEventParams;
use crate::audit::CascadeAuditEvent;
use crate::audit::CascadeAuditEventParams;
use crate::core::CookieValidator;
use crate::core::PathError;
use crate::core::PrecheckDraftError;
use crate::core::PrecheckName;
use crate::core::PrecheckRule;
use crate::core::PrecheckSet;
use crate::core::Requirement;
use crate::core::SuiteKey;
use crate::core::SuitePath;
use crate::core::SuiteSnapshot;
use crate::core::TEST_CASE_EXTENSION;
use crate::core::TestCase;
use crate::core::TestCaseError;
use crate::core::TestCaseId;
use crate::core::validate_precheck_draft;
use crate::interfaces::PrecheckStore;
use crate::interfaces::StoreError;
use crate::interfaces::SuiteStore;
use crate::interfaces::ValidatorStore;
use crate::runtime::graph::DependencyGraph;
use crate::runtime::graph::plan_cascade;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default first id assigned in an empty store.
pub const DEFAULT_FIRST_ID: i64 = 100;

// ============================================================================
// SECTION: Session and Errors
// ============================================================================

/// Explicit authoring context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthoringSession {
    /// Suite being edited; parent lookups are scoped to it.
    pub suite: SuiteKey,
}

impl AuthoringSession {
    /// Creates a session for `suite`.
    #[must_use]
    pub fn new(suite: impl Into<SuiteKey>) -> Self {
        Self {
            suite: suite.into(),
        }
    }

    /// Creates a session for the suite owning `path`.
    #[must_use]
    pub fn for_path(path: &SuitePath) -> Self {
        Self {
            suite: path.suite(),
        }
    }
}

/// Errors raised by authoring operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthoringError {
    /// Target entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Target entry already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Path is invalid or of the wrong kind.
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// Path lies outside the session suite.
    #[error("path {path} is outside suite {suite}")]
    CrossSuite {
        /// Offending path.
        path: String,
        /// Session suite.
        suite: String,
    },
    /// Id already used by another test case of the suite.
    #[error("test case id {id} is already used by {path}")]
    DuplicateId {
        /// Conflicting id.
        id: TestCaseId,
        /// Path already using it.
        path: String,
    },
    /// A declared parent does not exist in the suite.
    #[error("parent test case {0} does not exist in this suite")]
    UnknownParent(TestCaseId),
    /// Test-case definition is invalid.
    #[error(transparent)]
    TestCase(#[from] TestCaseError),
    /// Precheck draft is invalid.
    #[error(transparent)]
    Precheck(#[from] PrecheckDraftError),
    /// Cookie validator reference is unusable.
    #[error("cookie validator rejected: {0}")]
    Validator(String),
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PathError> for AuthoringError {
    fn from(err: PathError) -> Self {
        Self::InvalidPath(err.to_string())
    }
}

// ============================================================================
// SECTION: Cascade Reports
// ============================================================================

/// Kind of step performed during a cascade delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeAction {
    /// Deleting a test case.
    Delete,
    /// Removing names from a surviving parent's `requires`.
    CleanupRequires,
}

/// Outcome of one cascade step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// The step was applied.
    Succeeded,
    /// The step failed; later steps still ran.
    Failed(String),
}

/// One reported cascade step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeItem {
    /// Path touched by the step.
    pub path: SuitePath,
    /// Id of the test case at `path`.
    pub id: TestCaseId,
    /// Step kind.
    pub action: CascadeAction,
    /// Step outcome.
    pub outcome: ItemOutcome,
}

/// Per-item report of a cascade delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    /// Root id requested.
    pub root: TestCaseId,
    /// Steps in execution order; empty when the root was absent.
    pub items: Vec<CascadeItem>,
}

impl CascadeReport {
    /// Returns the number of test cases deleted.
    #[must_use]
    pub fn deleted(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.action == CascadeAction::Delete && item.outcome == ItemOutcome::Succeeded)
            .count()
    }

    /// Returns the number of failed steps.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.items.iter().filter(|item| matches!(item.outcome, ItemOutcome::Failed(_))).count()
    }

    /// Returns true when every step succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }

    /// Returns the paths of failed steps.
    #[must_use]
    pub fn failed_paths(&self) -> Vec<&SuitePath> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Failed(_)))
            .map(|item| &item.path)
            .collect()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Stores usable by the authoring service.
pub trait AuthoringStore: SuiteStore + PrecheckStore + ValidatorStore {}

impl<T: SuiteStore + PrecheckStore + ValidatorStore> AuthoringStore for T {}

/// Loads every stored test case into a snapshot.
///
/// # Errors
///
/// Returns [`StoreError`] when listing or reading fails.
pub fn load_snapshot<S: SuiteStore + ?Sized>(store: &S) -> Result<SuiteSnapshot, StoreError> {
    let mut entries = Vec::new();
    for path in store.list_test_paths()? {
        if let Some(test) = store.read_test_case(&path)? {
            entries.push((path, test));
        }
    }
    Ok(SuiteSnapshot::from_entries(entries))
}

/// Returns the next id: one past the largest assigned id, never below `first_id`.
#[must_use]
pub fn next_id_in(snapshot: &SuiteSnapshot, first_id: i64) -> TestCaseId {
    let floor = first_id.saturating_sub(1);
    let max = snapshot.max_id().map_or(floor, |id| id.get().max(floor));
    TestCaseId::new(max.saturating_add(1))
}

/// Appends the child's requirements the parent does not already declare.
///
/// Returns true when the parent changed. Order is preserved.
pub fn merge_requires(parent: &mut TestCase, child_requires: &[Requirement]) -> bool {
    let mut changed = false;
    for requirement in child_requires {
        if !parent.declares(&requirement.name) {
            parent.requires.push(requirement.clone());
            changed = true;
        }
    }
    changed
}

/// Appends `.json` when `name` lacks it.
fn with_test_extension(name: &str) -> String {
    let name = name.trim();
    if name.ends_with(TEST_CASE_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}{TEST_CASE_EXTENSION}")
    }
}

// ============================================================================
// SECTION: Authoring Service
// ============================================================================

/// Authoring service over a store.
pub struct Authoring<S> {
    /// Backing store.
    store: S,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
    /// Smallest id assigned to new test cases.
    first_id: i64,
}

impl<S: AuthoringStore> Authoring<S> {
    /// Creates a service with the default first id.
    #[must_use]
    pub fn new(store: S, audit: Arc<dyn AuditSink>) -> Self {
        Self::with_first_id(store, audit, DEFAULT_FIRST_ID)
    }

    /// Creates a service with an explicit first id.
    #[must_use]
    pub fn with_first_id(store: S, audit: Arc<dyn AuditSink>, first_id: i64) -> Self {
        Self {
            store,
            audit,
            first_id,
        }
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Loads a snapshot of every stored test case.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::Store`] when loading fails.
    pub fn snapshot(&self) -> Result<SuiteSnapshot, AuthoringError> {
        Ok(load_snapshot(&self.store)?)
    }

    /// Returns the id the next created test case will receive.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::Store`] when loading fails.
    pub fn next_id(&self) -> Result<TestCaseId, AuthoringError> {
        Ok(next_id_in(&self.snapshot()?, self.first_id))
    }

    // ------------------------------------------------------------------------
    // Test cases
    // ------------------------------------------------------------------------

    /// Reads one test case.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::NotFound`] when absent.
    pub fn read(&self, path: &SuitePath) -> Result<TestCase, AuthoringError> {
        self.store.read_test_case(path)?.ok_or_else(|| AuthoringError::NotFound(path.to_string()))
    }

    /// Creates a test case at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError`] when the path is outside the session suite
    /// or occupied, the draft is invalid, the id collides, a parent is
    /// unknown, or the store fails.
    pub fn create(
        &self,
        session: &AuthoringSession,
        path: &SuitePath,
        draft: TestCase,
    ) -> Result<TestCase, AuthoringError> {
        let result = self.create_inner(session, path, draft);
        self.audit_result("create", path.as_str(), &result);
        result
    }

    /// Performs [`Authoring::create`] without auditing.
    fn create_inner(
        &self,
        session: &AuthoringSession,
        path: &SuitePath,
        draft: TestCase,
    ) -> Result<TestCase, AuthoringError> {
        ensure_test_path(session, path)?;
        if self.store.read_test_case(path)?.is_some() {
            return Err(AuthoringError::AlreadyExists(path.to_string()));
        }
        self.persist(session, path, draft)
    }

    /// Replaces the test case at `path`; an unassigned draft id keeps the stored id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::NotFound`] when absent, plus every error
    /// [`Authoring::create`] can raise.
    pub fn update(
        &self,
        session: &AuthoringSession,
        path: &SuitePath,
        mut draft: TestCase,
    ) -> Result<TestCase, AuthoringError> {
        let result = (|| {
            ensure_test_path(session, path)?;
            let existing = self.read(path)?;
            if draft.id.is_unassigned() {
                draft.id = existing.id;
            }
            self.persist(session, path, draft)
        })();
        self.audit_result("update", path.as_str(), &result);
        result
    }

    /// Assigns the id, validates, writes, and merges requirements into parents.
    fn persist(
        &self,
        session: &AuthoringSession,
        path: &SuitePath,
        mut draft: TestCase,
    ) -> Result<TestCase, AuthoringError> {
        let snapshot = self.snapshot()?;
        if draft.id.is_unassigned() {
            draft.id = next_id_in(&snapshot, self.first_id);
        }
        draft.validate()?;
        if let Some((other, _)) = snapshot
            .suite(&session.suite)
            .find(|(other, test)| test.id == draft.id && *other != path)
        {
            return Err(AuthoringError::DuplicateId {
                id: draft.id,
                path: other.to_string(),
            });
        }
        for parent in draft.parent_id.iter() {
            if snapshot.find(&session.suite, parent).is_none() {
                return Err(AuthoringError::UnknownParent(parent));
            }
        }
        self.store.write_test_case(path, &draft)?;
        if !draft.requires.is_empty() {
            for parent in draft.parent_id.iter() {
                if let Some((parent_path, parent_test)) = snapshot.find(&session.suite, parent) {
                    let mut parent_test = parent_test.clone();
                    if merge_requires(&mut parent_test, &draft.requires) {
                        self.store.write_test_case(parent_path, &parent_test)?;
                    }
                }
            }
        }
        Ok(draft)
    }

    /// Renames a test case within its folder; `.json` is appended when missing.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError`] when the source is absent, the target
    /// exists, or the name is invalid.
    pub fn rename(&self, path: &SuitePath, new_name: &str) -> Result<SuitePath, AuthoringError> {
        let result = (|| {
            let target = path.with_file_name(&with_test_extension(new_name))?;
            self.move_checked(path, &target)?;
            self.rename_in_order(path, &target)?;
            Ok(target)
        })();
        self.audit_result("rename", path.as_str(), &result);
        result
    }

    /// Moves a test case to another path in the same suite.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError`] when either path is not a test file, the
    /// move crosses suites, the source is absent, or the target exists.
    pub fn move_test(&self, from: &SuitePath, to: &SuitePath) -> Result<(), AuthoringError> {
        let result = (|| {
            if from.suite() != to.suite() {
                return Err(AuthoringError::CrossSuite {
                    path: to.to_string(),
                    suite: from.suite().to_string(),
                });
            }
            self.move_checked(from, to)
        })();
        self.audit_result("move", from.as_str(), &result);
        result
    }

    /// Moves a test file after kind and existence checks.
    fn move_checked(&self, from: &SuitePath, to: &SuitePath) -> Result<(), AuthoringError> {
        if !from.is_test_file() || !to.is_test_file() {
            return Err(AuthoringError::InvalidPath(format!("{from} -> {to}")));
        }
        if self.store.read_test_case(from)?.is_none() {
            return Err(AuthoringError::NotFound(from.to_string()));
        }
        if self.store.read_test_case(to)?.is_some() {
            return Err(AuthoringError::AlreadyExists(to.to_string()));
        }
        self.store.move_entry(from, to)?;
        Ok(())
    }

    /// Replaces a renamed entry in its folder's explicit order.
    fn rename_in_order(&self, from: &SuitePath, to: &SuitePath) -> Result<(), AuthoringError> {
        let folder = from.parent();
        let mut order = self.store.read_order(folder.as_ref())?;
        let mut changed = false;
        for name in &mut order {
            if name == from.file_name() {
                *name = to.file_name().to_string();
                changed = true;
            }
        }
        if changed {
            self.store.write_order(folder.as_ref(), &order)?;
        }
        Ok(())
    }

    /// Deletes the test case at `path` and its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::NotFound`] when nothing is stored at `path`.
    pub fn delete_path(
        &self,
        session: &AuthoringSession,
        path: &SuitePath,
    ) -> Result<CascadeReport, AuthoringError> {
        ensure_test_path(session, path)?;
        let test = self.read(path)?;
        self.delete_with_cascade(session, test.id)
    }

    /// Deletes `root` and every descendant, cleaning surviving parents.
    ///
    /// Deleting an absent id is a no-op with an empty report. Each deletion
    /// and each parent cleanup is attempted independently; a cleanup only
    /// runs after its deletion succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::Store`] only when the snapshot cannot be
    /// loaded; per-item failures are reported in the [`CascadeReport`].
    pub fn delete_with_cascade(
        &self,
        session: &AuthoringSession,
        root: TestCaseId,
    ) -> Result<CascadeReport, AuthoringError> {
        let snapshot = self.snapshot()?;
        let graph = DependencyGraph::build(&snapshot, &session.suite);
        let mut report = CascadeReport {
            root,
            items: Vec::new(),
        };
        if let Some(plan) = plan_cascade(&graph, root) {
            for step in plan.steps {
                let deleted = self.store.delete_test_case(&step.path);
                let delete_ok = deleted.is_ok();
                report.items.push(CascadeItem {
                    path: step.path.clone(),
                    id: step.id,
                    action: CascadeAction::Delete,
                    outcome: outcome_of(deleted.map(|_| ())),
                });
                if !delete_ok {
                    continue;
                }
                for cleanup in step.cleanups {
                    let outcome = self.cleanup_parent(&cleanup.parent_path, &cleanup.names);
                    report.items.push(CascadeItem {
                        path: cleanup.parent_path,
                        id: cleanup.parent,
                        action: CascadeAction::CleanupRequires,
                        outcome: outcome_of(outcome),
                    });
                }
            }
        }
        self.audit.record_cascade(&CascadeAuditEvent::new(CascadeAuditEventParams {
            suite: session.suite.to_string(),
            root_id: root.get(),
            deleted: report.deleted(),
            failed: report.failed(),
        }));
        Ok(report)
    }

    /// Drops `names` from the parent's `requires`, writing only on change.
    fn cleanup_parent(
        &self,
        parent_path: &SuitePath,
        names: &BTreeSet<String>,
    ) -> Result<(), AuthoringError> {
        let Some(mut parent) = self.store.read_test_case(parent_path)? else {
            return Ok(());
        };
        let before = parent.requires.len();
        parent.requires.retain(|requirement| !names.contains(&requirement.name));
        if parent.requires.len() != before {
            self.store.write_test_case(parent_path, &parent)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Folders and ordering
    // ------------------------------------------------------------------------

    /// Creates a folder (a suite when `path` has one component).
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError`] when the path names a test file or the store fails.
    pub fn create_folder(&self, path: &SuitePath) -> Result<(), AuthoringError> {
        let result = (|| {
            if path.is_test_file() {
                return Err(AuthoringError::InvalidPath(path.to_string()));
            }
            Ok(self.store.create_folder(path)?)
        })();
        self.audit_result("create_folder", path.as_str(), &result);
        result
    }

    /// Renames a folder in place.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError`] when the name is invalid or the store fails.
    pub fn rename_folder(&self, path: &SuitePath, new_name: &str) -> Result<SuitePath, AuthoringError> {
        let result = (|| {
            let target = path.with_file_name(new_name.trim())?;
            if target.is_test_file() {
                return Err(AuthoringError::InvalidPath(target.to_string()));
            }
            self.store.move_entry(path, &target)?;
            self.rename_in_order(path, &target)?;
            Ok(target)
        })();
        self.audit_result("rename_folder", path.as_str(), &result);
        result
    }

    /// Deletes a folder and everything beneath it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError`] when the folder is absent or the store fails.
    pub fn delete_folder(&self, path: &SuitePath) -> Result<(), AuthoringError> {
        let result = self.store.delete_folder(path).map_err(AuthoringError::from);
        self.audit_result("delete_folder", path.as_str(), &result);
        result
    }

    /// Persists the explicit sibling order of a folder (`None` for the root).
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::Store`] when the write fails.
    pub fn set_order(&self, folder: Option<&SuitePath>, names: &[String]) -> Result<(), AuthoringError> {
        let cleaned: Vec<String> = names
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty() && !name.starts_with('#'))
            .collect();
        let result = self.store.write_order(folder, &cleaned).map_err(AuthoringError::from);
        self.audit_result("set_order", folder.map_or("", SuitePath::as_str), &result);
        result
    }

    /// Returns the explicit sibling order of a folder.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::Store`] when the read fails.
    pub fn get_order(&self, folder: Option<&SuitePath>) -> Result<Vec<String>, AuthoringError> {
        Ok(self.store.read_order(folder)?)
    }

    // ------------------------------------------------------------------------
    // Prechecks
    // ------------------------------------------------------------------------

    /// Lists registered prechecks.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::Store`] when loading fails.
    pub fn list_prechecks(&self) -> Result<PrecheckSet, AuthoringError> {
        Ok(self.store.load_prechecks()?)
    }

    /// Registers a new precheck.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::AlreadyExists`] for duplicate names and
    /// [`AuthoringError::Precheck`] for invalid drafts.
    pub fn create_precheck(&self, name: &str, rule: &Value) -> Result<PrecheckRule, AuthoringError> {
        let result = (|| {
            let (name, rule) = validate_precheck_draft(name, rule)?;
            let mut prechecks = self.store.load_prechecks()?;
            if prechecks.contains_key(&name) {
                return Err(AuthoringError::AlreadyExists(name.to_string()));
            }
            prechecks.insert(name, rule.clone());
            self.store.save_prechecks(&prechecks)?;
            Ok(rule)
        })();
        self.audit_result("create_precheck", name, &result);
        result
    }

    /// Replaces an existing precheck.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::NotFound`] for unknown names and
    /// [`AuthoringError::Precheck`] for invalid drafts.
    pub fn update_precheck(&self, name: &str, rule: &Value) -> Result<PrecheckRule, AuthoringError> {
        let result = (|| {
            let (name, rule) = validate_precheck_draft(name, rule)?;
            let mut prechecks = self.store.load_prechecks()?;
            if !prechecks.contains_key(&name) {
                return Err(AuthoringError::NotFound(name.to_string()));
            }
            prechecks.insert(name, rule.clone());
            self.store.save_prechecks(&prechecks)?;
            Ok(rule)
        })();
        self.audit_result("update_precheck", name, &result);
        result
    }

    /// Removes a precheck.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::NotFound`] for unknown names.
    pub fn delete_precheck(&self, name: &str) -> Result<(), AuthoringError> {
        let result = (|| {
            let mut prechecks = self.store.load_prechecks()?;
            if prechecks.remove(&PrecheckName::new(name.trim())).is_none() {
                return Err(AuthoringError::NotFound(name.to_string()));
            }
            Ok(self.store.save_prechecks(&prechecks)?)
        })();
        self.audit_result("delete_precheck", name, &result);
        result
    }

    // ------------------------------------------------------------------------
    // Cookie validator
    // ------------------------------------------------------------------------

    /// Designates the test case at `path` as the cookie validator.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::Validator`] when the test case is missing
    /// or has an empty endpoint.
    pub fn set_cookie_validator(&self, path: &SuitePath) -> Result<CookieValidator, AuthoringError> {
        let result = (|| {
            let test = self
                .store
                .read_test_case(path)?
                .ok_or_else(|| AuthoringError::Validator(format!("test case not found: {path}")))?;
            if test.endpoint.trim().is_empty() {
                return Err(AuthoringError::Validator(format!("test case {path} has no endpoint")));
            }
            let validator = CookieValidator {
                path: path.clone(),
                endpoint: test.endpoint,
                method: test.method,
            };
            self.store.save_validator(&validator)?;
            Ok(validator)
        })();
        self.audit_result("set_cookie_validator", path.as_str(), &result);
        result
    }

    /// Returns the current cookie validator reference.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::Store`] when loading fails.
    pub fn get_cookie_validator(&self) -> Result<Option<CookieValidator>, AuthoringError> {
        Ok(self.store.load_validator()?)
    }

    // ------------------------------------------------------------------------
    // Audit
    // ------------------------------------------------------------------------

    /// Emits an authoring audit event for an operation result.
    fn audit_result<T: AuditId>(&self, operation: &'static str, target: &str, result: &Result<T, AuthoringError>) {
        let (outcome, error, id) = match result {
            Ok(value) => (AuditOutcome::Success, None, value.audit_id()),
            Err(err) => (AuditOutcome::Failure, Some(err.to_string()), None),
        };
        self.audit.record_authoring(&AuthoringAuditEvent::new(AuthoringAuditEventParams {
            operation,
            target: target.to_string(),
            id,
            outcome,
            error,
        }));
    }
}

/// Extracts the test-case id recorded on audit events.
trait AuditId {
    /// Returns the id, when the value carries one.
    fn audit_id(&self) -> Option<i64> {
        None
    }
}

impl AuditId for TestCase {
    fn audit_id(&self) -> Option<i64> {
        Some(self.id.get())
    }
}

impl AuditId for () {}
impl AuditId for SuitePath {}
impl AuditId for PrecheckRule {}
impl AuditId for CookieValidator {}

/// Rejects paths outside the session suite or not naming a test file.
fn ensure_test_path(session: &AuthoringSession, path: &SuitePath) -> Result<(), AuthoringError> {
    if path.suite() != session.suite {
        return Err(AuthoringError::CrossSuite {
            path: path.to_string(),
            suite: session.suite.to_string(),
        });
    }
    if !path.is_test_file() || path.parent().is_none() {
        return Err(AuthoringError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Maps a step result to its reported outcome.
fn outcome_of<E: fmt::Display>(result: Result<(), E>) -> ItemOutcome {
    match result {
        Ok(()) => ItemOutcome::Succeeded,
        Err(err) => ItemOutcome::Failed(err.to_string()),
    }
}
