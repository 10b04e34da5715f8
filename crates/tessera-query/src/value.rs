//! Comparison helpers for JSON field values.
//!
//! Records are plain `serde_json::Value` documents. These helpers define how
//! two field values compare: numbers compare numerically regardless of their
//! integer/float representation, strings lexicographically, booleans with
//! `false < true`.

use std::cmp::Ordering;

use serde_json::{Number, Value};

/// Looks up a top-level field on a document.
///
/// Returns `None` when the document is not an object or the field is absent.
pub fn field<'a>(doc: &'a Value, name: &str) -> Option<&'a Value> {
    doc.as_object().and_then(|object| object.get(name))
}

/// Returns `true` if the value is not a JSON object.
///
/// Arrays count as scalars: a field compared against an array is an
/// equality test on the whole array.
pub fn is_scalar(value: &Value) -> bool {
    !value.is_object()
}

/// Returns the JSON type name, for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Compares two numbers across integer and float representations.
///
/// Returns `None` when either side is NaN-like and cannot be ordered.
pub fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return Some(a.cmp(&b));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Compares two values of the same JSON type.
///
/// Returns `None` if the types differ or the values cannot be ordered.
/// Arrays and objects are never ordered against each other.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Structural equality with numeric normalization (`1 == 1.0`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b) == Some(Ordering::Equal),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, a)| b.get(key).is_some_and(|b| values_equal(a, b)))
        }
        _ => a == b,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values, used for sorting.
///
/// Values of different types order by type (null, boolean, number, string,
/// array, object). Arrays compare element-wise; objects of equal type rank
/// compare equal so that a stable sort keeps their input order.
pub fn total_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Array(a), Value::Array(b)) => a
            .iter()
            .zip(b)
            .map(|(a, b)| total_cmp(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        _ => compare_values(a, b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b))),
    }
}
