// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering context entries into structured JSON log fields.
//!
//! Entries created through [`MdcContext`](crate::MdcContext) carry the
//! [`JSON_PREFIX`] sentinel marker, which tags their payload as JSON text
//! rather than a literal string. A JSON log formatter that simply wrote the
//! payload as a string field would double-encode those entries - downstream
//! consumers would index `"{\"a\":1}"` instead of `{"a":1}`.
//!
//! This module is the integration point for such formatters: given store
//! contents, [`structured_fields`] strips the marker from tagged entries and
//! embeds their payload as a real JSON value, while unmanaged entries stay
//! literal strings. The marker never appears in rendered output.
//!
//! # Examples
//!
//! ```rust
//! use scoped_mdc::provider::{structured_fields, JSON_PREFIX};
//! use std::collections::HashMap;
//!
//! let mut entries = HashMap::new();
//! entries.insert("x".to_string(), format!("{JSON_PREFIX}{}", r#"{"a":1}"#));
//! entries.insert("y".to_string(), "plain".to_string());
//!
//! let fields = structured_fields(&entries, &[], &[]);
//! assert_eq!(
//!     serde_json::to_string(&fields).unwrap(),
//!     r#"{"x":{"a":1},"y":"plain"}"#
//! );
//! ```

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Sentinel marker prefixed to payloads that hold JSON text.
///
/// Public so hosts and tests can recognize structured entries before they are
/// rendered into a log record.
pub const JSON_PREFIX: &str = "MDC_JSON_VALUE:";

/// Renders context entries as a JSON object suitable for embedding in a log
/// record.
///
/// Filters are applied first: a non-empty `include` retains only the listed
/// keys, a non-empty `exclude` then removes the listed keys. An empty slice
/// deactivates the respective filter.
///
/// Entries whose payload starts with [`JSON_PREFIX`] are rendered by stripping
/// the marker and parsing the remainder, so the field carries a structured
/// value. All other entries become literal string fields. A marked payload
/// that is not valid JSON falls back to a literal string of the stripped text
/// rather than corrupting the surrounding document.
pub fn structured_fields(
    entries: &HashMap<String, String>,
    include: &[&str],
    exclude: &[&str],
) -> Map<String, Value> {
    let mut fields = Map::new();
    for (key, payload) in entries {
        if !include.is_empty() && !include.contains(&key.as_str()) {
            continue;
        }
        if exclude.contains(&key.as_str()) {
            continue;
        }
        fields.insert(key.clone(), render_payload(payload));
    }
    fields
}

/// Renders the calling thread's live store contents.
///
/// Equivalent to `structured_fields(&store::snapshot(), include, exclude)`;
/// this is the form a per-record formatter calls.
pub fn current_structured_fields(include: &[&str], exclude: &[&str]) -> Map<String, Value> {
    structured_fields(&crate::store::snapshot(), include, exclude)
}

fn render_payload(payload: &str) -> Value {
    match payload.strip_prefix(JSON_PREFIX) {
        Some(json_text) => serde_json::from_str(json_text)
            .unwrap_or_else(|_| Value::String(json_text.to_string())),
        None => Value::String(payload.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn marked_entries_render_as_json_values() {
        let entries = entries(&[
            ("x", format!("{JSON_PREFIX}{}", r#"{"a":1}"#).as_str()),
            ("y", "plain"),
        ]);
        let fields = structured_fields(&entries, &[], &[]);
        assert_eq!(fields["x"], serde_json::json!({"a": 1}));
        assert_eq!(fields["y"], Value::String("plain".to_string()));
    }

    #[test]
    fn prefix_never_appears_in_output() {
        let entries = entries(&[("k", format!("{JSON_PREFIX}\"tagged\"").as_str())]);
        let fields = structured_fields(&entries, &[], &[]);
        let rendered = serde_json::to_string(&fields).unwrap();
        assert!(!rendered.contains(JSON_PREFIX));
        assert_eq!(fields["k"], Value::String("tagged".to_string()));
    }

    #[test]
    fn include_filter_retains_only_listed_keys() {
        let entries = entries(&[("keep", "1"), ("drop", "2")]);
        let fields = structured_fields(&entries, &["keep"], &[]);
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("keep"));
    }

    #[test]
    fn exclude_filter_removes_listed_keys() {
        let entries = entries(&[("keep", "1"), ("drop", "2")]);
        let fields = structured_fields(&entries, &[], &["drop"]);
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("keep"));
    }

    #[test]
    fn include_applies_before_exclude() {
        let entries = entries(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let fields = structured_fields(&entries, &["a", "b"], &["b"]);
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("a"));
    }

    #[test]
    fn invalid_marked_payload_falls_back_to_string() {
        let entries = entries(&[("bad", format!("{JSON_PREFIX}not json at all").as_str())]);
        let fields = structured_fields(&entries, &[], &[]);
        assert_eq!(fields["bad"], Value::String("not json at all".to_string()));
    }
}
