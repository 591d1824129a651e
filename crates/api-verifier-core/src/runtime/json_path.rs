// crates/api-verifier-core/src/runtime/json_path.rs
// ============================================================================
// Module: API Verifier JSON Path Resolution
// Description: Minimal dotted-path selector over JSON documents.
// Purpose: Locate the nodes targeted by checks, prechecks, and requirements.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Paths are an optional `$` prefix followed by `.`-separated segments. A
//! segment is a field name followed by any number of bracket selectors:
//! - `[*]` expands every element of an array
//! - `[N]` selects one array element by index
//! - `[key=value]` keeps array elements whose `key` renders as `value`
//!   (surrounding double quotes on `value` are stripped)
//!
//! An empty path or `$` resolves to the root. Missing fields and
//! out-of-range indexes contribute nothing; resolution never fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves `path` against `root`, returning matched nodes in document order.
#[must_use]
pub fn resolve<'a>(root: &'a Value, path: &str) -> Vec<&'a Value> {
    let path = path.trim();
    let path = path.strip_prefix('$').unwrap_or(path);
    let path = path.strip_prefix('.').unwrap_or(path);
    if path.is_empty() {
        return vec![root];
    }
    let mut current = vec![root];
    for segment in path.split('.') {
        current = resolve_segment(&current, segment);
        if current.is_empty() {
            break;
        }
    }
    current
}

/// Renders a node as comparison text: scalars as text, containers as compact JSON.
#[must_use]
pub fn node_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Applies one segment (field plus brackets) to every current node.
fn resolve_segment<'a>(nodes: &[&'a Value], segment: &str) -> Vec<&'a Value> {
    let (field, selectors) = split_selectors(segment);
    let mut out = Vec::new();
    for node in nodes {
        let base = if field.is_empty() {
            Some(*node)
        } else {
            node.as_object().and_then(|object| object.get(field))
        };
        let Some(base) = base else {
            continue;
        };
        let mut working = vec![base];
        for selector in &selectors {
            working = apply_selector(&working, selector);
        }
        out.extend(working);
    }
    out
}

/// Splits `field[a][b]` into the field and its bracket bodies.
fn split_selectors(segment: &str) -> (&str, Vec<&str>) {
    let Some(open) = segment.find('[') else {
        return (segment, Vec::new());
    };
    let field = &segment[.. open];
    let mut selectors = Vec::new();
    let mut rest = &segment[open ..];
    while let Some(start) = rest.find('[') {
        let Some(len) = rest[start ..].find(']') else {
            break;
        };
        selectors.push(&rest[start + 1 .. start + len]);
        rest = &rest[start + len + 1 ..];
    }
    (field, selectors)
}

/// Applies one bracket selector to array nodes; non-arrays are dropped.
fn apply_selector<'a>(nodes: &[&'a Value], selector: &str) -> Vec<&'a Value> {
    let selector = selector.trim();
    let mut out = Vec::new();
    for node in nodes {
        let Some(items) = node.as_array() else {
            continue;
        };
        if selector == "*" {
            out.extend(items.iter());
        } else if let Ok(index) = selector.parse::<usize>() {
            if let Some(item) = items.get(index) {
                out.push(item);
            }
        } else if let Some((key, expected)) = selector.split_once('=') {
            let key = key.trim();
            let expected = strip_quotes(expected.trim());
            out.extend(items.iter().filter(|item| {
                item.as_object()
                    .and_then(|object| object.get(key))
                    .is_some_and(|value| node_text(value) == expected)
            }));
        }
    }
    out
}

/// Strips one pair of surrounding double or single quotes.
fn strip_quotes(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = raw.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote)) {
            return inner;
        }
    }
    raw
}
