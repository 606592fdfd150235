//! Attribute value helpers.
//!
//! Attribute values travel as JSON. The engine never coerces them; it only
//! needs to know when a value counts as "empty" and whether its JSON shape
//! fits an attribute kind.

use serde_json::Value;

use crate::model::AttributeKind;

/// Returns true for values a form treats as "nothing entered".
///
/// `null`, the empty string and the empty list are empty. `false` and `0`
/// are real values.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Compares two attribute values, treating all empty values as equal.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (is_empty_value(a), is_empty_value(b)) {
        (true, true) => true,
        (false, false) => numbers_equal(a, b).unwrap_or_else(|| a == b),
        _ => false,
    }
}

/// `1000` and `1000.0` arrive from different inputs for the same number.
///
/// Integers compare exactly; a float equals an integer only when it holds
/// that exact integral value.
fn numbers_equal(a: &Value, b: &Value) -> Option<bool> {
    let (Value::Number(x), Value::Number(y)) = (a, b) else {
        return None;
    };
    let equal = match (x.is_f64(), y.is_f64()) {
        (false, false) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_u64().is_some_and(|x| y.as_u64() == Some(x)),
        },
        (true, true) => x.as_f64() == y.as_f64(),
        (true, false) => float_equals_integer(x.as_f64()?, y),
        (false, true) => float_equals_integer(y.as_f64()?, x),
    };
    Some(equal)
}

fn float_equals_integer(f: f64, n: &serde_json::Number) -> bool {
    // 2^63 and 2^64 are exact as f64
    const I64_END: f64 = 9_223_372_036_854_775_808.0;
    const U64_END: f64 = 18_446_744_073_709_551_616.0;
    if f.fract() != 0.0 {
        return false;
    }
    if let Some(i) = n.as_i64() {
        (-I64_END..I64_END).contains(&f) && f as i64 == i
    } else if let Some(u) = n.as_u64() {
        (0.0..U64_END).contains(&f) && f as u64 == u
    } else {
        false
    }
}

/// Checks that a non-empty value has the JSON shape the attribute kind expects.
///
/// Returns `None` when the shape fits, otherwise a short description of the
/// problem. Empty values always fit; requiredness is checked separately.
pub fn check_shape(kind: &AttributeKind, value: &Value) -> Option<&'static str> {
    if is_empty_value(value) {
        return None;
    }
    match kind {
        AttributeKind::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => None,
            _ => Some("expected an integer"),
        },
        AttributeKind::Number => match value {
            Value::Number(_) => None,
            _ => Some("expected a number"),
        },
        AttributeKind::Boolean => match value {
            Value::Bool(_) => None,
            _ => Some("expected a boolean"),
        },
        AttributeKind::DateTime => match value {
            Value::String(s) if chrono::DateTime::parse_from_rfc3339(s).is_ok() => None,
            _ => Some("expected an RFC 3339 timestamp"),
        },
        AttributeKind::List => match value {
            Value::Array(_) => None,
            _ => Some("expected a list"),
        },
        AttributeKind::Json | AttributeKind::Any | AttributeKind::Other(_) => None,
        kind if kind.is_textual() => match value {
            Value::String(_) => None,
            _ => Some("expected a string"),
        },
        _ => None,
    }
}
