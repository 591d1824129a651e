// crates/api-verifier-core/src/runtime/selection.rs
// ============================================================================
// Module: API Verifier Test Selection
// Description: Run selection with automatic parent inclusion.
// Purpose: Keep a selection closed under parent dependencies.
// Dependencies: crate::{core, runtime::graph}, serde, thiserror
// ============================================================================

//! ## Overview
//! Selecting a test case also selects every unselected parent, transitively.
//! Parent presence treats single and multi `parentId` forms alike because
//! both normalize to a set. In [`SelectionMode::Interactive`] every
//! auto-added parent yields a [`SelectionNotice`]; [`SelectionMode::Bulk`]
//! adds them silently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::VecDeque;

use serde::Serialize;
use thiserror::Error;

use crate::core::TestCaseId;
use crate::runtime::graph::DependencyGraph;

// ============================================================================
// SECTION: Types
// ============================================================================

/// How a selection request was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Select-all or similar batch action; notices are suppressed.
    Bulk,
    /// Single user action; notices are surfaced.
    Interactive,
}

/// Notice that a required parent was selected automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionNotice {
    /// Test case that needed the parent.
    pub child: TestCaseId,
    /// Parent that was added.
    pub parent: TestCaseId,
    /// Parent display name.
    pub parent_name: String,
}

/// Selection errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The id is not part of the suite.
    #[error("test case {0} does not exist in this suite")]
    UnknownTestCase(TestCaseId),
}

/// Set of selected test-case ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Selected ids.
    ids: BTreeSet<TestCaseId>,
}

// ============================================================================
// SECTION: Operations
// ============================================================================

impl Selection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `id` and every unselected ancestor.
    ///
    /// Returns notices for auto-added parents in interactive mode; bulk mode
    /// always returns an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownTestCase`] when `id` is not in the graph.
    pub fn select(
        &mut self,
        graph: &DependencyGraph,
        id: TestCaseId,
        mode: SelectionMode,
    ) -> Result<Vec<SelectionNotice>, SelectionError> {
        if !graph.contains(id) {
            return Err(SelectionError::UnknownTestCase(id));
        }
        self.ids.insert(id);
        let mut notices = Vec::new();
        let mut visited = BTreeSet::from([id]);
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            let Some(node) = graph.node(current) else {
                continue;
            };
            for parent in node.parents.iter() {
                let Some(parent_node) = graph.node(parent) else {
                    continue;
                };
                if !visited.insert(parent) {
                    continue;
                }
                if self.ids.insert(parent) && mode == SelectionMode::Interactive {
                    notices.push(SelectionNotice {
                        child: current,
                        parent,
                        parent_name: parent_node.name.clone(),
                    });
                }
                queue.push_back(parent);
            }
        }
        Ok(notices)
    }

    /// Selects every listed test case silently.
    ///
    /// Returns the ids that are not in the graph; those are left unselected.
    pub fn select_all(
        &mut self,
        graph: &DependencyGraph,
        ids: impl IntoIterator<Item = TestCaseId>,
    ) -> Vec<TestCaseId> {
        let mut unknown = Vec::new();
        for id in ids {
            if let Err(SelectionError::UnknownTestCase(id)) = self.select(graph, id, SelectionMode::Bulk) {
                unknown.push(id);
            }
        }
        unknown
    }

    /// Removes `id`; returns false when it was not selected.
    pub fn deselect(&mut self, id: TestCaseId) -> bool {
        self.ids.remove(&id)
    }

    /// Returns true when `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: TestCaseId) -> bool {
        self.ids.contains(&id)
    }

    /// Returns the selected ids.
    #[must_use]
    pub const fn ids(&self) -> &BTreeSet<TestCaseId> {
        &self.ids
    }
}
