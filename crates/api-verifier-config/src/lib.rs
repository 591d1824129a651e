// crates/api-verifier-config/src/lib.rs
// ============================================================================
// Module: API Verifier Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for api-verifier.toml semantics.
// Dependencies: api-verifier-core, api-verifier-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `api-verifier-config` defines the configuration model for the API
//! verifier: where suites and shared config live, how run history is
//! stored, where audit events go, and the hard input limits. Validation is
//! strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
