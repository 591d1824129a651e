// crates/api-verifier-core/src/runtime/graph.rs
// ============================================================================
// Module: API Verifier Dependency Graph
// Description: Parent/child relationships among test cases of one suite.
// Purpose: Compute descendants, ancestors, consistency issues, and cascades.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! The graph is an adjacency map over test-case ids, built from a read-only
//! [`SuiteSnapshot`] and scoped to one suite. Edges run from parent to
//! child: a test case is a child of every id in its `parentId` set.
//!
//! Source data is hand-editable, so the graph tolerates dangling parents,
//! duplicate ids, and cycles. Every traversal keeps an explicit visited set
//! and terminates; inconsistencies are reported by
//! [`DependencyGraph::issues`] and never repaired.
//!
//! [`plan_cascade`] turns a delete request into an ordered plan: the root,
//! then every descendant, each followed by cleanup of the `requires` lists
//! of its surviving parents.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;

use serde::Serialize;

use crate::core::ParentRef;
use crate::core::SuiteKey;
use crate::core::SuitePath;
use crate::core::SuiteSnapshot;
use crate::core::TestCase;
use crate::core::TestCaseId;

// ============================================================================
// SECTION: Graph
// ============================================================================

/// One test case as seen by the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    /// Store path of the definition.
    pub path: SuitePath,
    /// Display name.
    pub name: String,
    /// Declared parents.
    pub parents: ParentRef,
    /// Names the test case publishes for dependents.
    pub requires: BTreeSet<String>,
}

/// Consistency issue found in suite data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphIssue {
    /// A `parentId` references an id absent from the suite.
    DanglingParent {
        /// Child declaring the parent.
        child: TestCaseId,
        /// Missing parent id.
        parent: TestCaseId,
    },
    /// The test case is its own ancestor.
    Cycle {
        /// Test case on the cycle.
        member: TestCaseId,
    },
    /// Several files share one id; the first path wins.
    DuplicateId {
        /// Shared id.
        id: TestCaseId,
        /// Every path using the id.
        paths: Vec<SuitePath>,
    },
}

/// Parent/child adjacency over one suite.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Suite the graph covers.
    suite: Option<SuiteKey>,
    /// Nodes keyed by id.
    nodes: BTreeMap<TestCaseId, GraphNode>,
    /// Child ids keyed by parent id (parents may be dangling).
    children: BTreeMap<TestCaseId, BTreeSet<TestCaseId>>,
    /// Ids used by more than one path.
    duplicates: BTreeMap<TestCaseId, Vec<SuitePath>>,
}

impl DependencyGraph {
    /// Builds the graph of `suite` from a snapshot.
    #[must_use]
    pub fn build(snapshot: &SuiteSnapshot, suite: &SuiteKey) -> Self {
        let mut nodes = BTreeMap::new();
        let mut children: BTreeMap<TestCaseId, BTreeSet<TestCaseId>> = BTreeMap::new();
        for (path, test) in snapshot.suite(suite) {
            if nodes.contains_key(&test.id) {
                continue;
            }
            for parent in test.parent_id.iter() {
                children.entry(parent).or_default().insert(test.id);
            }
            nodes.insert(test.id, node_from(path, test));
        }
        Self {
            suite: Some(suite.clone()),
            nodes,
            children,
            duplicates: snapshot.duplicate_ids(suite),
        }
    }

    /// Returns the suite this graph covers.
    #[must_use]
    pub const fn suite(&self) -> Option<&SuiteKey> {
        self.suite.as_ref()
    }

    /// Returns the node for `id`.
    #[must_use]
    pub fn node(&self, id: TestCaseId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    /// Returns true when `id` exists in the suite.
    #[must_use]
    pub fn contains(&self, id: TestCaseId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true when the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates the direct children of `id` that exist in the suite.
    pub fn children(&self, id: TestCaseId) -> impl Iterator<Item = TestCaseId> + '_ {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .copied()
            .filter(|child| self.nodes.contains_key(child))
    }

    /// Returns every transitive descendant of `root` in breadth-first order.
    ///
    /// The root itself is never included, even when a cycle leads back to it.
    #[must_use]
    pub fn descendants(&self, root: TestCaseId) -> Vec<TestCaseId> {
        let mut visited = BTreeSet::from([root]);
        let mut queue = VecDeque::from([root]);
        let mut out = Vec::new();
        while let Some(current) = queue.pop_front() {
            for child in self.children(current) {
                if visited.insert(child) {
                    out.push(child);
                    queue.push_back(child);
                }
            }
        }
        out
    }

    /// Returns every transitive ancestor of `id` present in the suite.
    #[must_use]
    pub fn ancestors(&self, id: TestCaseId) -> Vec<TestCaseId> {
        let mut visited = BTreeSet::from([id]);
        let mut queue = VecDeque::from([id]);
        let mut out = Vec::new();
        while let Some(current) = queue.pop_front() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            for parent in node.parents.iter() {
                if self.nodes.contains_key(&parent) && visited.insert(parent) {
                    out.push(parent);
                    queue.push_back(parent);
                }
            }
        }
        out
    }

    /// Returns true when `id` can reach itself through parent edges.
    #[must_use]
    pub fn on_cycle(&self, id: TestCaseId) -> bool {
        let mut visited = BTreeSet::new();
        let mut queue: VecDeque<TestCaseId> = self.children(id).collect();
        while let Some(current) = queue.pop_front() {
            if current == id {
                return true;
            }
            if visited.insert(current) {
                queue.extend(self.children(current));
            }
        }
        false
    }

    /// Reports dangling parents, cycle members, and duplicate ids.
    #[must_use]
    pub fn issues(&self) -> Vec<GraphIssue> {
        let mut issues = Vec::new();
        for (id, paths) in &self.duplicates {
            issues.push(GraphIssue::DuplicateId {
                id: *id,
                paths: paths.clone(),
            });
        }
        for (id, node) in &self.nodes {
            for parent in node.parents.iter() {
                if !self.nodes.contains_key(&parent) {
                    issues.push(GraphIssue::DanglingParent {
                        child: *id,
                        parent,
                    });
                }
            }
        }
        for id in self.nodes.keys() {
            if self.on_cycle(*id) {
                issues.push(GraphIssue::Cycle {
                    member: *id,
                });
            }
        }
        issues
    }
}

/// Builds a graph node from a stored test case.
fn node_from(path: &SuitePath, test: &TestCase) -> GraphNode {
    GraphNode {
        path: path.clone(),
        name: test.name.clone(),
        parents: test.parent_id.clone(),
        requires: test.requires.iter().map(|requirement| requirement.name.clone()).collect(),
    }
}

/// Returns the descendants of `root` in `suite` as stored test cases.
#[must_use]
pub fn compute_descendants(
    snapshot: &SuiteSnapshot,
    suite: &SuiteKey,
    root: TestCaseId,
) -> Vec<(SuitePath, TestCase)> {
    let graph = DependencyGraph::build(snapshot, suite);
    graph
        .descendants(root)
        .into_iter()
        .filter_map(|id| {
            let node = graph.node(id)?;
            snapshot.get(&node.path).map(|test| (node.path.clone(), test.clone()))
        })
        .collect()
}

// ============================================================================
// SECTION: Cascade Planning
// ============================================================================

/// Requires cleanup applied to one surviving parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiresCleanup {
    /// Surviving parent id.
    pub parent: TestCaseId,
    /// Surviving parent path.
    pub parent_path: SuitePath,
    /// Names to drop from the parent's `requires`.
    pub names: BTreeSet<String>,
}

/// One deletion in a cascade and the cleanups that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeStep {
    /// Deleted id.
    pub id: TestCaseId,
    /// Deleted path.
    pub path: SuitePath,
    /// Cleanups to apply once the deletion succeeded.
    pub cleanups: Vec<RequiresCleanup>,
}

/// Ordered cascade: the root first, then its descendants breadth first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadePlan {
    /// Root id.
    pub root: TestCaseId,
    /// Ordered steps.
    pub steps: Vec<CascadeStep>,
}

/// Plans the cascade delete of `root`; `None` when the root is absent.
#[must_use]
pub fn plan_cascade(graph: &DependencyGraph, root: TestCaseId) -> Option<CascadePlan> {
    graph.node(root)?;
    let mut order = vec![root];
    order.extend(graph.descendants(root));
    let doomed: BTreeSet<TestCaseId> = order.iter().copied().collect();
    let steps = order
        .into_iter()
        .filter_map(|id| {
            let node = graph.node(id)?;
            let cleanups = if node.requires.is_empty() {
                Vec::new()
            } else {
                node.parents
                    .iter()
                    .filter(|parent| !doomed.contains(parent))
                    .filter_map(|parent| {
                        let parent_node = graph.node(parent)?;
                        Some(RequiresCleanup {
                            parent,
                            parent_path: parent_node.path.clone(),
                            names: node.requires.clone(),
                        })
                    })
                    .collect()
            };
            Some(CascadeStep {
                id,
                path: node.path.clone(),
                cleanups,
            })
        })
        .collect();
    Some(CascadePlan {
        root,
        steps,
    })
}
