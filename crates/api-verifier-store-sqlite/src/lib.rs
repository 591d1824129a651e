// crates/api-verifier-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Run History Store
// Description: Durable RunHistoryStore backend using SQLite.
// Purpose: Persist completed API verification runs for later listing.
// Dependencies: api-verifier-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`RunHistoryStore`] implementation
//! that persists one row per completed run: counters, status, and the full
//! summary/details document. Listings filter, search, sort, and page inside
//! `SQLite`. Security posture: database contents are untrusted; documents are
//! hash-checked on load.
//!
//! [`RunHistoryStore`]: api_verifier_core::RunHistoryStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_DOCUMENT_BYTES;
pub use store::SqliteRunStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
