// crates/api-verifier-core/src/runtime/grouping.rs
// ============================================================================
// Module: API Verifier Execution Grouping
// Description: Reshape raw result streams into execution blocks.
// Purpose: Group check entries under the execution marker that owns them.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! Grouping is display-only and never changes a status. With more than one
//! execution marker, entries are split into blocks; with one or none the
//! checks stay flat. Entries preceding the first marker form a leading block
//! with no endpoint.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::ResultEntry;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Check entries owned by one physical call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionBlock {
    /// Endpoint named by the marker; `None` for entries before any marker.
    pub endpoint: Option<String>,
    /// Check entries in stream order.
    pub entries: Vec<ResultEntry>,
}

/// Display shape of one test case's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", content = "items", rename_all = "snake_case")]
pub enum GroupedResults {
    /// Zero or one execution: check entries without markers.
    Flat(Vec<ResultEntry>),
    /// Several executions: one block per marker.
    Blocks(Vec<ExecutionBlock>),
}

// ============================================================================
// SECTION: Grouping
// ============================================================================

/// Groups a raw result stream by execution marker.
#[must_use]
pub fn group_executions(entries: &[ResultEntry]) -> GroupedResults {
    let markers = entries.iter().filter(|entry| entry.is_execution_marker()).count();
    if markers <= 1 {
        return GroupedResults::Flat(
            entries.iter().filter(|entry| !entry.is_execution_marker()).cloned().collect(),
        );
    }
    let mut blocks: Vec<ExecutionBlock> = Vec::new();
    for entry in entries {
        if let Some(endpoint) = entry.marker_endpoint() {
            blocks.push(ExecutionBlock {
                endpoint: Some(endpoint.to_string()),
                entries: Vec::new(),
            });
            continue;
        }
        match blocks.last_mut() {
            Some(block) => block.entries.push(entry.clone()),
            None => blocks.push(ExecutionBlock {
                endpoint: None,
                entries: vec![entry.clone()],
            }),
        }
    }
    GroupedResults::Blocks(blocks)
}
