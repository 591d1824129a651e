// crates/api-verifier-core/src/lib.rs
// ============================================================================
// Module: API Verifier Core Library
// Description: Public API surface for the API verifier core.
// Purpose: Expose core types, interfaces, audit sinks, and runtime engines.
// Dependencies: crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! API verifier core defines API test cases organized into suites, links
//! them through parent/child run-order dependencies, evaluates checks and
//! prechecks against response documents, and aggregates raw execution
//! records into a multi-level pass/fail/skip rollup. It is backend-agnostic:
//! storage is reached through explicit interfaces and request execution is
//! left to an external runner.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use audit::AuditOutcome;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::InMemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use interfaces::PrecheckStore;
pub use interfaces::RunHistoryStore;
pub use interfaces::StoreError;
pub use interfaces::SuiteStore;
pub use interfaces::ValidatorStore;
pub use runtime::Authoring;
pub use runtime::AuthoringError;
pub use runtime::AuthoringSession;
pub use runtime::CascadeReport;
pub use runtime::DependencyGraph;
pub use runtime::GraphIssue;
pub use runtime::InMemoryRunHistoryStore;
pub use runtime::InMemorySuiteStore;
pub use runtime::Selection;
pub use runtime::SelectionMode;
pub use runtime::aggregate;
