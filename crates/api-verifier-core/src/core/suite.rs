// crates/api-verifier-core/src/core/suite.rs
// ============================================================================
// Module: API Verifier Suite Tree
// Description: Folder trees, sibling ordering, and read-only suite snapshots.
// Purpose: Provide deterministic views over stored test cases.
// Dependencies: crate::core::{identifiers, testcase}, serde
// ============================================================================

//! ## Overview
//! Suites are folder trees. Each folder lists child folders and `.json`
//! test files; siblings named in the folder's explicit order come first (in
//! that order) and the rest follow sorted case-insensitively.
//!
//! [`SuiteSnapshot`] freezes a fetched set of test cases for one graph or
//! aggregation pass. It is built from entries that may arrive in any order
//! and always yields the same view.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::SuiteKey;
use crate::core::identifiers::SuitePath;
use crate::core::identifiers::TestCaseId;
use crate::core::testcase::TestCase;

// ============================================================================
// SECTION: Ordering
// ============================================================================

/// Name of the per-folder ordering file.
pub const ORDER_FILE_NAME: &str = "order.txt";

/// Parses an ordering file: one name per line, blank lines and `#` comments ignored.
#[must_use]
pub fn parse_order_file(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

/// Renders names as an ordering file.
#[must_use]
pub fn render_order_file(names: &[String]) -> String {
    let mut out = String::new();
    for name in names {
        out.push_str(name.trim());
        out.push('\n');
    }
    out
}

/// Compares two sibling names against an explicit order.
fn compare_by_order(left: &str, right: &str, order: &[String]) -> Ordering {
    let position = |name: &str| order.iter().position(|entry| entry == name);
    match (position(left), position(right)) {
        (Some(left_idx), Some(right_idx)) => left_idx.cmp(&right_idx),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left
            .to_lowercase()
            .cmp(&right.to_lowercase())
            .then_with(|| left.cmp(right)),
    }
}

/// Sorts sibling names: explicitly ordered names first, the rest case-insensitively.
pub fn sort_siblings(names: &mut [String], order: &[String]) {
    names.sort_by(|left, right| compare_by_order(left, right, order));
}

// ============================================================================
// SECTION: Folder Tree
// ============================================================================

/// One folder of a suite tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    /// Folder name (empty for the store root).
    pub name: String,
    /// Store-relative folder path (empty for the store root).
    pub path: String,
    /// Ordered child folders.
    pub folders: Vec<FolderNode>,
    /// Ordered test-case file names.
    pub tests: Vec<String>,
}

impl FolderNode {
    /// Returns the direct child folder named `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.folders.iter().find(|folder| folder.name == name)
    }

    /// Returns the store-relative paths of every test file, in tree order.
    ///
    /// A folder's own tests precede its child folders' tests.
    #[must_use]
    pub fn file_order(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            for test in &node.tests {
                if node.path.is_empty() {
                    out.push(test.clone());
                } else {
                    out.push(format!("{}/{test}", node.path));
                }
            }
            stack.extend(node.folders.iter().rev());
        }
        out
    }

    /// Returns the number of test files in the subtree.
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.tests.len() + self.folders.iter().map(Self::test_count).sum::<usize>()
    }
}

/// Builds an ordered folder tree from folder paths, test paths, and
/// per-folder explicit orders keyed by folder path (`""` for the root).
///
/// Ancestors of every listed path are implied.
#[must_use]
pub fn build_tree(
    folders: impl IntoIterator<Item = SuitePath>,
    tests: impl IntoIterator<Item = SuitePath>,
    orders: &BTreeMap<String, Vec<String>>,
) -> FolderNode {
    let mut children: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut files: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut register = |components: &[&str]| {
        for depth in 0 .. components.len() {
            let parent = components[.. depth].join("/");
            children.entry(parent).or_default().insert(components[depth].to_string());
        }
    };
    for folder in folders {
        let components: Vec<&str> = folder.components().collect();
        register(&components);
    }
    for test in tests {
        let components: Vec<&str> = test.components().collect();
        let Some((file, parents)) = components.split_last() else {
            continue;
        };
        register(parents);
        files.entry(parents.join("/")).or_default().push((*file).to_string());
    }
    assemble_node("", "", &children, &files, orders)
}

/// Recursively assembles one folder node.
fn assemble_node(
    path: &str,
    name: &str,
    children: &BTreeMap<String, BTreeSet<String>>,
    files: &BTreeMap<String, Vec<String>>,
    orders: &BTreeMap<String, Vec<String>>,
) -> FolderNode {
    let order = orders.get(path).map_or(&[][..], Vec::as_slice);
    let mut folder_names: Vec<String> =
        children.get(path).map(|names| names.iter().cloned().collect()).unwrap_or_default();
    sort_siblings(&mut folder_names, order);
    let mut tests = files.get(path).cloned().unwrap_or_default();
    sort_siblings(&mut tests, order);
    let folders = folder_names
        .iter()
        .map(|child| {
            let child_path = if path.is_empty() { child.clone() } else { format!("{path}/{child}") };
            assemble_node(&child_path, child, children, files, orders)
        })
        .collect();
    FolderNode {
        name: name.to_string(),
        path: path.to_string(),
        folders,
        tests,
    }
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Read-only view over fetched test cases, keyed by path.
///
/// # Invariants
/// - Contents are independent of the order entries were inserted in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuiteSnapshot {
    /// Test cases keyed by suite-relative path.
    entries: BTreeMap<SuitePath, TestCase>,
}

impl SuiteSnapshot {
    /// Builds a snapshot from fetched entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (SuitePath, TestCase)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Returns the number of test cases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates every entry in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&SuitePath, &TestCase)> {
        self.entries.iter()
    }

    /// Returns the test case stored at `path`.
    #[must_use]
    pub fn get(&self, path: &SuitePath) -> Option<&TestCase> {
        self.entries.get(path)
    }

    /// Iterates the entries of one suite in path order.
    pub fn suite<'a>(
        &'a self,
        suite: &SuiteKey,
    ) -> impl Iterator<Item = (&'a SuitePath, &'a TestCase)> + 'a + use<'a> {
        let suite = suite.clone();
        self.entries.iter().filter(move |(path, _)| path.suite() == suite)
    }

    /// Returns the suite keys present in the snapshot.
    #[must_use]
    pub fn suites(&self) -> BTreeSet<SuiteKey> {
        self.entries.keys().map(SuitePath::suite).collect()
    }

    /// Finds a test case by id within a suite; the first path wins on duplicates.
    #[must_use]
    pub fn find(&self, suite: &SuiteKey, id: TestCaseId) -> Option<(&SuitePath, &TestCase)> {
        self.entries.iter().find(|(path, test)| path.suite() == *suite && test.id == id)
    }

    /// Returns the largest assigned id across all suites.
    #[must_use]
    pub fn max_id(&self) -> Option<TestCaseId> {
        self.entries.values().map(|test| test.id).filter(|id| !id.is_unassigned()).max()
    }

    /// Returns ids used by more than one test case within a suite.
    #[must_use]
    pub fn duplicate_ids(&self, suite: &SuiteKey) -> BTreeMap<TestCaseId, Vec<SuitePath>> {
        let mut by_id: BTreeMap<TestCaseId, Vec<SuitePath>> = BTreeMap::new();
        for (path, test) in self.suite(suite) {
            by_id.entry(test.id).or_default().push(path.clone());
        }
        by_id.retain(|_, paths| paths.len() > 1);
        by_id
    }
}
