// crates/api-verifier-cli/src/i18n.rs
// ============================================================================
// Module: CLI Message Catalog
// Description: Message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings for consistent messaging.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The API verifier CLI keeps user-facing strings in a small catalog so that
//! every message is phrased in one place. All runtime output should be routed
//! through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself.
//! - Placeholders are substituted in argument order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static catalog entries.
const CATALOG_ITEMS: &[(&str, &str)] = &[
    ("main.version", "api-verifier {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("output.serialize_failed", "Failed to serialize output: {error}"),
    (
        "input.read_too_large",
        "Refusing to read {kind} at {path} because it is {size} bytes (limit {limit}).",
    ),
    ("input.read_failed", "Failed to read {kind} at {path}: {error}"),
    ("input.parse_failed", "Failed to parse {kind} at {path}: {error}"),
    ("input.json_invalid", "Invalid JSON for {kind}: {error}"),
    ("input.kind.testcase", "test case"),
    ("input.kind.results", "results document"),
    ("input.kind.csv", "credentials CSV"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config valid."),
    ("store.open_failed", "Failed to open {store}: {error}"),
    ("store.kind.suite", "suite store"),
    ("store.kind.history", "run history store"),
    ("audit.open_failed", "Failed to open audit log {path}: {error}"),
    ("path.invalid", "Invalid suite path {path}: {error}"),
    ("suite.load_failed", "Failed to load suite: {error}"),
    ("suite.task_failed", "Suite read task failed: {error}"),
    ("suite.not_found", "Suite {suite} does not exist."),
    ("authoring.failed", "Authoring operation failed: {error}"),
    ("testcase.not_found", "No test case with id {id} in suite {suite}."),
    ("check.invalid", "Invalid check: {error}"),
    ("credentials.invalid", "Invalid credentials upload: {error}"),
    ("runs.filter_invalid", "Invalid run filter: {error}"),
    ("runs.sort_invalid", "Invalid sort order {sort}; expected asc or desc."),
    ("runs.store_failed", "Run history operation failed: {error}"),
    ("runs.not_found", "No run with id {run_id}."),
    ("results.account_not_found", "No results for account {account} in suite {suite}."),
    ("results.testcase_not_found", "No result for test case {id}."),
];

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the catalog while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

/// Returns the static catalog used by the CLI.
fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

    CATALOG.get_or_init(|| CATALOG_ITEMS.iter().copied().collect())
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a catalog message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
