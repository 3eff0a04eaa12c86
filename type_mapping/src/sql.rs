//! SQL type conversion utilities
//!
//! This module maps Rust field types to the PostgreSQL column types used for
//! parameter casts, and classifies PostgreSQL types for bind normalisation.

/// Map a Rust type (as written in the struct definition) to a PostgreSQL type.
///
/// `Option<T>` maps like `T`: nullability is a property of the value, not of
/// the cast.
pub fn rust_type_to_pg_type(rust_type: &str) -> &'static str {
    let normalized = rust_type.replace(' ', "");
    let inner = strip_option(&normalized);

    match inner {
        "Uuid" | "uuid::Uuid" => "UUID",
        "String" | "&str" | "&'staticstr" => "TEXT",
        "i8" | "i16" | "u8" => "SMALLINT",
        "i32" | "u16" => "INTEGER",
        "i64" | "u32" => "BIGINT",
        "u64" => "NUMERIC(20,0)",
        "f32" => "REAL",
        "f64" => "DOUBLE PRECISION",
        "bool" => "BOOLEAN",
        "DateTime<Utc>" | "chrono::DateTime<Utc>" | "chrono::DateTime<chrono::Utc>" => {
            "TIMESTAMPTZ"
        }
        "NaiveDateTime" | "chrono::NaiveDateTime" => "TIMESTAMP",
        "NaiveDate" | "chrono::NaiveDate" => "DATE",
        "rust_decimal::Decimal" | "Decimal" => "NUMERIC(28,10)",
        "bigdecimal::BigDecimal" | "BigDecimal" => "NUMERIC",
        "serde_json::Value" | "Value" => "JSONB",
        "Vec<String>" => "TEXT[]",
        "Vec<i32>" => "INTEGER[]",
        "Vec<i64>" => "BIGINT[]",
        "Vec<Uuid>" | "Vec<uuid::Uuid>" => "UUID[]",
        other if other.starts_with("Json<") || other.starts_with("sqlx::types::Json<") => "JSONB",
        _ => "TEXT",
    }
}

fn strip_option(normalized: &str) -> &str {
    normalized
        .strip_prefix("Option<")
        .or_else(|| normalized.strip_prefix("std::option::Option<"))
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(normalized)
}

/// Check if a Rust type is Optional (nullable in SQL)
pub fn is_optional_type(rust_type: &str) -> bool {
    let normalized = rust_type.replace(' ', "");
    normalized.starts_with("Option<") || normalized.starts_with("std::option::Option<")
}

/// Cast suffix appended to a positional parameter, e.g. `::BIGINT`.
pub fn cast_suffix(pg_type: &str) -> String {
    format!("::{}", pg_type)
}

pub fn is_array_type(pg_type: &str) -> bool {
    pg_type.ends_with("[]")
}

pub fn is_json_type(pg_type: &str) -> bool {
    matches!(pg_type, "JSON" | "JSONB")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_types_map_like_inner() {
        assert_eq!(rust_type_to_pg_type("Option<i64>"), "BIGINT");
        assert_eq!(rust_type_to_pg_type("i64"), "BIGINT");
        assert_eq!(rust_type_to_pg_type("Option < String >"), "TEXT");
        assert_eq!(
            rust_type_to_pg_type("Option<chrono::DateTime<chrono::Utc>>"),
            "TIMESTAMPTZ"
        );
        assert_eq!(rust_type_to_pg_type("Option<DateTime<Utc>>"), "TIMESTAMPTZ");
    }

    #[test]
    fn test_collections_and_json() {
        assert_eq!(rust_type_to_pg_type("Vec<String>"), "TEXT[]");
        assert_eq!(rust_type_to_pg_type("serde_json::Value"), "JSONB");
        assert_eq!(rust_type_to_pg_type("sqlx::types::Json<Settings>"), "JSONB");
        assert!(is_array_type("TEXT[]"));
        assert!(is_json_type("JSONB"));
        assert!(!is_json_type("TEXT"));
    }

    #[test]
    fn test_unknown_type_falls_back_to_text() {
        assert_eq!(rust_type_to_pg_type("MyEnum"), "TEXT");
        assert!(is_optional_type("Option<MyEnum>"));
        assert!(!is_optional_type("MyEnum"));
        assert_eq!(cast_suffix("UUID"), "::UUID");
    }
}
