//! Unified type mapping between Rust types and PostgreSQL
//! This crate provides the mapping logic shared by the entity derive macro
//! (declared column types) and the DAO runtime (parameter casts and binds).

pub mod serialize;
pub mod sql;
pub mod types;

pub use serialize::{normalize_bind_value, to_pg_array_literal};
pub use sql::{cast_suffix, is_array_type, is_json_type, is_optional_type, rust_type_to_pg_type};
pub use types::BindValue;
