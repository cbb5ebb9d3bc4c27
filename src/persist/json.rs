//! Lenient field readers for normalizing stored JSON.
//!
//! Every envelope this crate reads was historically written by a JS app,
//! so loads never trust the stored shape: each field is read through one
//! of these helpers, which treat missing keys, nulls, and wrong-typed
//! values as "use the default" instead of erroring. Boolean coercion
//! follows JS truthiness for the same reason (`"false"` is truthy there).

use serde_json::Value;

/// Parses a raw stored string, returning None on any syntax error.
pub(crate) fn parse(raw: &str) -> Option<Value> {
    serde_json::from_str(raw).ok()
}

/// Resolves the first key path in `paths` that exists and is non-null.
///
/// Paths model the legacy fallback chains the envelopes accumulated over
/// time, e.g. `style` in the flat shape else `globals.style` in the
/// nested one. An empty string stops the chain; only absent/null moves on.
pub(crate) fn pick<'v>(raw: &'v Value, paths: &[&[&str]]) -> Option<&'v Value> {
    for path in paths {
        let mut current = raw;
        let mut found = true;
        for segment in *path {
            match current.get(segment) {
                Some(next) => current = next,
                None => {
                    found = false;
                    break;
                }
            }
        }
        if found && !current.is_null() {
            return Some(current);
        }
    }
    None
}

/// Coerces a value to a string: strings pass through, numbers and
/// booleans stringify, everything else takes the default.
pub(crate) fn string_or(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => default.to_string(),
    }
}

/// Coerces a value to a boolean by JS truthiness.
pub(crate) fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        _ => false,
    }
}

/// Coerces a value to an integer, truncating floats; non-numbers take
/// the default.
pub(crate) fn int_or(value: Option<&Value>, default: i64) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        _ => default,
    }
}
