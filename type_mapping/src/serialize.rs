//! Serialization utilities
//!
//! Converts JSON values into the textual forms PostgreSQL accepts for a
//! declared column type, so a `$n::TYPE` cast always receives valid input.

use crate::sql::{is_array_type, is_json_type};
use serde_json::Value;

/// Normalise a parameter for the column type it will be cast to.
///
/// * arrays bound to `T[]` columns become array literals (`{"a","b"}`)
/// * any non-null value bound to a `JSON`/`JSONB` column becomes JSON text
/// * everything else is passed through
pub fn normalize_bind_value(value: Value, pg_type: Option<&str>) -> Value {
    match (value, pg_type) {
        (Value::Array(items), Some(ty)) if is_array_type(ty) => {
            Value::String(to_pg_array_literal(&items))
        }
        (Value::Null, _) => Value::Null,
        (value, Some(ty)) if is_json_type(ty) => Value::String(value.to_string()),
        (value, _) => value,
    }
}

/// Encode a JSON array as a PostgreSQL array literal.
pub fn to_pg_array_literal(items: &[Value]) -> String {
    let elements: Vec<String> = items
        .iter()
        .map(|item| match item {
            Value::Null => "NULL".to_string(),
            Value::String(s) => quote_element(s),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => quote_element(&other.to_string()),
        })
        .collect();

    format!("{{{}}}", elements.join(","))
}

fn quote_element(raw: &str) -> String {
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for c in raw.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
