//! Bind value definitions
//!
//! Statement parameters travel through the DAO as `serde_json::Value`s.
//! `BindValue` is the typed form a PostgreSQL session binds them as.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BindValue {
    Text(String),
    BigInt(i64),
    Float(f64),
    Boolean(bool),
    /// Numbers outside the `i64`/`f64` range, bound as text and cast by SQL
    Numeric(String),
    Json(Value),
    Null,
}

impl From<&Value> for BindValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Boolean(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BindValue::BigInt(i)
                } else if n.is_u64() {
                    BindValue::Numeric(n.to_string())
                } else if let Some(f) = n.as_f64() {
                    BindValue::Float(f)
                } else {
                    BindValue::Numeric(n.to_string())
                }
            }
            Value::String(s) => BindValue::Text(s.clone()),
            other => BindValue::Json(other.clone()),
        }
    }
}

impl From<Value> for BindValue {
    fn from(value: Value) -> Self {
        BindValue::from(&value)
    }
}

impl BindValue {
    pub fn is_null(&self) -> bool {
        matches!(self, BindValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(BindValue::from(json!(42)), BindValue::BigInt(42));
        assert_eq!(BindValue::from(json!(1.5)), BindValue::Float(1.5));
        assert_eq!(BindValue::from(json!(true)), BindValue::Boolean(true));
        assert_eq!(BindValue::from(json!("jo")), BindValue::Text("jo".to_string()));
        assert!(BindValue::from(Value::Null).is_null());
    }

    #[test]
    fn test_large_unsigned_becomes_numeric() {
        assert_eq!(
            BindValue::from(json!(u64::MAX)),
            BindValue::Numeric(u64::MAX.to_string())
        );
    }

    #[test]
    fn test_structured_values_bind_as_json() {
        assert_eq!(
            BindValue::from(json!({"a": 1})),
            BindValue::Json(json!({"a": 1}))
        );
        assert_eq!(BindValue::from(json!([1, 2])), BindValue::Json(json!([1, 2])));
    }
}
