//! Dotted field-path helpers.
//!
//! Mapping and assertion paths address nested JSON objects with `.`-separated
//! segments. Authoring tools prefix paths with the payload they refer to
//! (`response.id`, `request.user_id`); that leading segment is a label, not a
//! key, and is stripped before traversal.

use serde_json::{Map as JsonMap, Value as JsonValue};
use thiserror::Error;

/// Errors raised when writing a value into a parameter bag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathAssignError {
    /// The path had no segments left after prefix stripping.
    #[error("destination path '{0}' has no field segments")]
    EmptyPath(String),
    /// An intermediate segment exists but is not an object.
    #[error("segment '{segment}' in path '{path}' is not an object")]
    NonObjectSegment {
        /// Full destination path as declared.
        path: String,
        /// The offending segment.
        segment: String,
    },
}

/// Splits a dotted path, dropping a leading `response` or `request` label.
pub fn strip_payload_prefix(path: &str) -> impl Iterator<Item = &str> {
    let mut segments = path.split('.').peekable();
    if matches!(segments.peek(), Some(&"response") | Some(&"request")) {
        segments.next();
    }
    segments
}

/// Resolves a dotted path against a JSON value, descending through nested
/// objects only.
///
/// Returns `None` for a missing key or a non-object intermediate; callers
/// decide whether that is an error (parameter extraction) or simply a null
/// actual value (assertions). Array elements are not addressable.
pub fn lookup_path<'a>(root: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let mut current = root;
    for segment in strip_payload_prefix(path).filter(|segment| !segment.is_empty()) {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Writes `value` at a dotted path inside `target`, creating intermediate
/// objects as needed.
///
/// A leading `request` label is stripped. Existing intermediate values that
/// are not objects are left untouched and reported as an error.
pub fn assign_path(target: &mut JsonMap<String, JsonValue>, path: &str, value: JsonValue) -> Result<(), PathAssignError> {
    let mut segments: Vec<&str> = path.split('.').collect();
    if segments.first() == Some(&"request") {
        segments.remove(0);
    }
    segments.retain(|segment| !segment.is_empty());

    let Some((leaf, intermediates)) = segments.split_last() else {
        return Err(PathAssignError::EmptyPath(path.to_string()));
    };

    let mut current = target;
    for segment in intermediates {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| JsonValue::Object(JsonMap::new()));
        current = match entry {
            JsonValue::Object(map) => map,
            _ => {
                return Err(PathAssignError::NonObjectSegment {
                    path: path.to_string(),
                    segment: segment.to_string(),
                });
            }
        };
    }

    current.insert(leaf.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_strips_leading_response_label() {
        let body = json!({"id": "42", "owner": {"name": "Alice"}});
        assert_eq!(lookup_path(&body, "response.id"), Some(&json!("42")));
        assert_eq!(lookup_path(&body, "owner.name"), Some(&json!("Alice")));
        assert_eq!(lookup_path(&body, "response.owner.name"), Some(&json!("Alice")));
    }

    #[test]
    fn lookup_misses_return_none() {
        let body = json!({"items": [1, 2, 3], "count": 3});
        assert_eq!(lookup_path(&body, "missing"), None);
        // Array elements are not addressable through dotted paths.
        assert_eq!(lookup_path(&body, "items.0"), None);
        assert_eq!(lookup_path(&body, "count.nested"), None);
    }

    #[test]
    fn lookup_empty_path_yields_root() {
        let body = json!({"id": 1});
        assert_eq!(lookup_path(&body, ""), Some(&body));
        assert_eq!(lookup_path(&body, "response"), Some(&body));
    }

    #[test]
    fn assign_creates_intermediate_objects() {
        let mut params = JsonMap::new();
        assign_path(&mut params, "request.filters.status", json!("active")).expect("assign nested");
        assert_eq!(JsonValue::Object(params), json!({"filters": {"status": "active"}}));
    }

    #[test]
    fn assign_overwrites_leaf_in_place() {
        let mut params = json!({"user_id": "old"}).as_object().cloned().expect("object");
        assign_path(&mut params, "user_id", json!("42")).expect("assign leaf");
        assert_eq!(params["user_id"], json!("42"));
    }

    #[test]
    fn assign_rejects_non_object_intermediate() {
        let mut params = json!({"filters": "flat"}).as_object().cloned().expect("object");
        let error = assign_path(&mut params, "filters.status", json!("active")).expect_err("non-object segment");
        assert!(matches!(error, PathAssignError::NonObjectSegment { .. }));
        // The existing value is preserved.
        assert_eq!(params["filters"], json!("flat"));
    }

    #[test]
    fn assign_rejects_bare_request_label() {
        let mut params = JsonMap::new();
        let error = assign_path(&mut params, "request", json!(1)).expect_err("empty after strip");
        assert!(matches!(error, PathAssignError::EmptyPath(_)));
    }
}
