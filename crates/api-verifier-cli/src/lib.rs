// crates/api-verifier-cli/src/lib.rs
// ============================================================================
// Module: API Verifier CLI Library
// Description: Shared helpers for the API verifier command-line interface.
// Purpose: Provide reusable components (i18n) for the CLI binary and tests.
// Dependencies: Standard library.
// ============================================================================

//! ## Overview
//! This library houses shared CLI utilities, including the message catalog.
//! The binary entry point (`src/main.rs`) imports these helpers to keep all
//! user-facing output consistent.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Message catalog and translation helpers.
pub mod i18n;
