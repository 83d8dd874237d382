//! Assertion evaluation.
//!
//! A pure function over one step's status code, parsed body, and declared
//! assertion list. Every assertion yields exactly one result; nothing here
//! short-circuits the list or touches the run state.
//!
//! Equality operators compare canonical text forms, so `42` equals `"42"`
//! and `true` equals `"true"`. That looseness is inherited behavior the
//! authoring side relies on; see the equality tests below.

use regex::Regex;
use serde_json::Value as JsonValue;

use casewire_types::{Assertion, AssertionKind, AssertionOperator, AssertionResult};
use casewire_util::{canonical_text, lookup_path, numeric_value};

/// Evaluates every assertion against the response, in declaration order.
pub fn evaluate_assertions(status_code: u16, assertions: &[Assertion], body: &JsonValue) -> Vec<AssertionResult> {
    assertions
        .iter()
        .map(|assertion| evaluate_assertion(status_code, assertion, body))
        .collect()
}

fn evaluate_assertion(status_code: u16, assertion: &Assertion, body: &JsonValue) -> AssertionResult {
    let mut result = AssertionResult {
        assertion: assertion.clone(),
        passed: false,
        actual_value: JsonValue::Null,
        error: None,
    };

    match &assertion.kind {
        AssertionKind::StatusCode => {
            result.actual_value = JsonValue::from(status_code);
            result.passed = compare(&result.actual_value, &assertion.operator, &assertion.expected_value);
        }
        // Schema assertions share the value-comparison logic; the shape is
        // not structurally validated beyond the compared value.
        AssertionKind::ResponseSchema | AssertionKind::BusinessLogic => {
            result.actual_value = field_value(body, assertion.field.as_deref());
            result.passed = compare(&result.actual_value, &assertion.operator, &assertion.expected_value);
        }
        AssertionKind::Other(kind) => {
            result.error = Some(format!("unsupported assertion type: {kind}"));
        }
    }

    if !result.passed && result.error.is_none() {
        result.error = Some(format!(
            "assertion failed: expected {} {} {}, actual value {}",
            assertion.field.as_deref().unwrap_or("<response>"),
            assertion.operator.symbol(),
            assertion.expected_value,
            result.actual_value,
        ));
    }

    result
}

/// Resolves an assertion's field path against the body.
///
/// An empty or absent path means the whole body; a path that does not
/// resolve yields null rather than an error.
fn field_value(body: &JsonValue, field: Option<&str>) -> JsonValue {
    match field {
        None | Some("") => body.clone(),
        Some(path) => lookup_path(body, path).cloned().unwrap_or(JsonValue::Null),
    }
}

fn compare(actual: &JsonValue, operator: &AssertionOperator, expected: &JsonValue) -> bool {
    match operator {
        AssertionOperator::Equal => canonical_text(actual) == canonical_text(expected),
        AssertionOperator::NotEqual => canonical_text(actual) != canonical_text(expected),
        AssertionOperator::GreaterThan => compare_numeric(actual, expected, |a, e| a > e),
        AssertionOperator::LessThan => compare_numeric(actual, expected, |a, e| a < e),
        AssertionOperator::GreaterOrEqual => compare_numeric(actual, expected, |a, e| a >= e),
        AssertionOperator::LessOrEqual => compare_numeric(actual, expected, |a, e| a <= e),
        AssertionOperator::Contains => canonical_text(actual).contains(&canonical_text(expected)),
        AssertionOperator::Matches => matches_pattern(actual, expected),
        AssertionOperator::Exists => !actual.is_null(),
        AssertionOperator::Other(_) => false,
    }
}

/// Ordering comparisons require both operands to be JSON numbers; anything
/// else evaluates to false, never an error.
fn compare_numeric(actual: &JsonValue, expected: &JsonValue, ordering: impl Fn(f64, f64) -> bool) -> bool {
    match (numeric_value(actual), numeric_value(expected)) {
        (Some(actual), Some(expected)) => ordering(actual, expected),
        _ => false,
    }
}

/// A malformed pattern degrades silently to false.
fn matches_pattern(actual: &JsonValue, expected: &JsonValue) -> bool {
    match Regex::new(&canonical_text(expected)) {
        Ok(pattern) => pattern.is_match(&canonical_text(actual)),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assertion(kind: AssertionKind, field: Option<&str>, operator: AssertionOperator, expected: JsonValue) -> Assertion {
        Assertion {
            kind,
            field: field.map(Into::into),
            operator,
            expected_value: expected,
            description: None,
        }
    }

    #[test]
    fn status_code_assertion_compares_the_status() {
        let checks = vec![assertion(AssertionKind::StatusCode, None, AssertionOperator::Equal, json!(201))];
        let results = evaluate_assertions(200, &checks, &json!({}));

        assert_eq!(results.len(), 1);
        assert!(!results[0].passed);
        assert_eq!(results[0].actual_value, json!(200));
        assert!(results[0].error.is_some());
    }

    #[test]
    fn stringified_equality_is_loose_and_symmetric() {
        for (left, right) in [
            (json!(42), json!("42")),
            (json!(true), json!("true")),
            (json!("Alice"), json!("Alice")),
        ] {
            assert!(compare(&left, &AssertionOperator::Equal, &right), "{left} == {right}");
            assert!(compare(&right, &AssertionOperator::Equal, &left), "{right} == {left}");
        }
        assert!(compare(&json!(42), &AssertionOperator::NotEqual, &json!("43")));
    }

    #[test]
    fn numeric_operators_on_non_numeric_operands_are_false() {
        for operator in [
            AssertionOperator::GreaterThan,
            AssertionOperator::LessThan,
            AssertionOperator::GreaterOrEqual,
            AssertionOperator::LessOrEqual,
        ] {
            assert!(!compare(&json!("10"), &operator, &json!(5)), "string actual under {operator:?}");
            assert!(!compare(&json!(10), &operator, &json!("5")), "string expected under {operator:?}");
            assert!(!compare(&json!(null), &operator, &json!(5)), "null actual under {operator:?}");
        }
        assert!(compare(&json!(10), &AssertionOperator::GreaterThan, &json!(5)));
        assert!(compare(&json!(5), &AssertionOperator::LessOrEqual, &json!(5)));
    }

    #[test]
    fn contains_and_matches_work_over_string_forms() {
        assert!(compare(&json!("hello world"), &AssertionOperator::Contains, &json!("world")));
        assert!(compare(&json!(12345), &AssertionOperator::Contains, &json!(234)));
        assert!(compare(&json!("user-42"), &AssertionOperator::Matches, &json!("^user-\\d+$")));
        // Malformed pattern degrades to false instead of erroring.
        assert!(!compare(&json!("anything"), &AssertionOperator::Matches, &json!("(unclosed")));
    }

    #[test]
    fn missing_field_resolves_to_null_and_fails_exists() {
        let body = json!({"name": "Alice"});
        let checks = vec![assertion(
            AssertionKind::BusinessLogic,
            Some("response.list.0.name"),
            AssertionOperator::Exists,
            JsonValue::Null,
        )];

        let results = evaluate_assertions(200, &checks, &body);

        assert!(!results[0].passed);
        assert_eq!(results[0].actual_value, JsonValue::Null);
    }

    #[test]
    fn empty_field_path_asserts_against_the_whole_body() {
        let body = json!({"name": "Alice"});
        let checks = vec![assertion(AssertionKind::ResponseSchema, Some(""), AssertionOperator::Exists, JsonValue::Null)];
        let results = evaluate_assertions(200, &checks, &body);
        assert!(results[0].passed);
        assert_eq!(results[0].actual_value, body);
    }

    #[test]
    fn unsupported_kind_fails_without_stopping_later_assertions() {
        let checks = vec![
            assertion(AssertionKind::Other("latency_budget".into()), None, AssertionOperator::Equal, json!(1)),
            assertion(AssertionKind::StatusCode, None, AssertionOperator::Equal, json!(200)),
        ];

        let results = evaluate_assertions(200, &checks, &json!({}));

        assert_eq!(results.len(), 2);
        assert!(!results[0].passed);
        assert_eq!(results[0].error.as_deref(), Some("unsupported assertion type: latency_budget"));
        assert!(results[1].passed);
    }

    #[test]
    fn unknown_operator_fails_with_a_generic_diagnostic() {
        let checks = vec![assertion(
            AssertionKind::BusinessLogic,
            Some("name"),
            AssertionOperator::Other("approximately".into()),
            json!("Alice"),
        )];

        let results = evaluate_assertions(200, &checks, &json!({"name": "Alice"}));

        assert!(!results[0].passed);
        let message = results[0].error.as_deref().expect("diagnostic present");
        assert!(message.contains("approximately"), "diagnostic names the operator: {message}");
        assert!(message.contains("name"), "diagnostic names the field: {message}");
    }

    #[test]
    fn business_logic_equality_over_nested_field() {
        let body = json!({"user": {"name": "Alice"}});
        let checks = vec![assertion(
            AssertionKind::BusinessLogic,
            Some("response.user.name"),
            AssertionOperator::Equal,
            json!("Alice"),
        )];

        let results = evaluate_assertions(200, &checks, &body);

        assert!(results[0].passed);
        assert_eq!(results[0].actual_value, json!("Alice"));
        assert!(results[0].error.is_none());
    }
}
