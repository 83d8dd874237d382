//! JSON value helpers used by the dispatcher and the assertion engine.

use serde_json::{Map as JsonMap, Value as JsonValue};

/// Renders a JSON value to its canonical textual form.
///
/// Strings render without quotes so that `42` and `"42"` (and `true` and
/// `"true"`) compare equal under stringified operators. Everything else uses
/// its compact JSON encoding.
pub fn canonical_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Coerces a JSON value to `f64` for ordering comparisons.
///
/// Only JSON numbers coerce; numeric strings do not, which makes ordering
/// operators on them evaluate to false rather than guessing.
pub fn numeric_value(value: &JsonValue) -> Option<f64> {
    value.as_number().and_then(|number| number.as_f64())
}

/// Flattens a parameter bag into query pairs, stringifying every value.
///
/// Array values repeat the key once per element; other values render through
/// [`canonical_text`].
pub fn query_pairs(params: &JsonMap<String, JsonValue>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            JsonValue::Array(items) => {
                for item in items {
                    pairs.push((key.clone(), canonical_text(item)));
                }
            }
            other => pairs.push((key.clone(), canonical_text(other))),
        }
    }
    pairs
}

/// Parses a response body as JSON, wrapping unparseable text as
/// `{"raw": <body>}` instead of failing the step.
pub fn parse_lenient_body(text: &str) -> JsonValue {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(value) => value,
        Err(_) => {
            let mut wrapper = JsonMap::new();
            wrapper.insert("raw".to_string(), JsonValue::String(text.to_string()));
            JsonValue::Object(wrapper)
        }
    }
}
