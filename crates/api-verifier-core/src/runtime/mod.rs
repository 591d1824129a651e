// crates/api-verifier-core/src/runtime/mod.rs
// ============================================================================
// Module: API Verifier Runtime
// Description: Evaluation, graph, authoring, and aggregation engines.
// Purpose: Execute the deterministic operations over core types.
// Dependencies: crate::{audit, core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime evaluates checks and prechecks against response documents,
//! maintains the parent/child dependency graph, applies authoring mutations
//! through the store interfaces, and folds raw run results into summaries.
//! Every engine except [`Authoring`] is a pure function over fetched data.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod aggregate;
pub mod authoring;
pub mod check_eval;
pub mod comparator;
pub mod graph;
pub mod grouping;
pub mod json_path;
pub mod precheck_eval;
pub mod selection;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregate::account_passes_folder;
pub use aggregate::account_status;
pub use aggregate::aggregate;
pub use aggregate::aggregation_event;
pub use aggregate::global_status;
pub use aggregate::sort_by_file_order;
pub use aggregate::test_case_status;
pub use authoring::Authoring;
pub use authoring::AuthoringError;
pub use authoring::AuthoringSession;
pub use authoring::AuthoringStore;
pub use authoring::CascadeAction;
pub use authoring::CascadeItem;
pub use authoring::CascadeReport;
pub use authoring::DEFAULT_FIRST_ID;
pub use authoring::ItemOutcome;
pub use authoring::load_snapshot;
pub use authoring::merge_requires;
pub use authoring::next_id_in;
pub use check_eval::CheckOutcome;
pub use check_eval::Evaluate;
pub use check_eval::evaluate_checks;
pub use check_eval::evaluate_response;
pub use comparator::Comparison;
pub use comparator::compare;
pub use comparator::compare_text;
pub use graph::CascadePlan;
pub use graph::CascadeStep;
pub use graph::DependencyGraph;
pub use graph::GraphIssue;
pub use graph::GraphNode;
pub use graph::RequiresCleanup;
pub use graph::compute_descendants;
pub use graph::plan_cascade;
pub use grouping::ExecutionBlock;
pub use grouping::GroupedResults;
pub use grouping::group_executions;
pub use precheck_eval::GateVerdict;
pub use precheck_eval::evaluate_precheck;
pub use precheck_eval::gate;
pub use selection::Selection;
pub use selection::SelectionError;
pub use selection::SelectionMode;
pub use selection::SelectionNotice;
pub use store::InMemoryRunHistoryStore;
pub use store::InMemorySuiteStore;
