//! DAO Core - generic data-access layer for relational entities
//!
//! This crate provides the schema registry, the query specification and its
//! validation, composable query modifiers, the `Session` seam to the store,
//! and the generic access engine (`BaseDao`) with transaction support.

extern crate self as dao_core;

/// Conditional debug logging, compiled in only with the `debug-logging` feature
#[cfg(feature = "debug-logging")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod codec;
pub mod context;
pub mod errors;
pub mod generic_dao;
pub mod modifier;
pub mod prelude;
pub mod query;
pub mod schema;
pub mod session;
pub mod traits;
pub mod validation;

#[cfg(test)]
mod test_fixtures;

pub use context::ExecContext;
pub use errors::DaoError;
pub use generic_dao::{BaseDao, Transaction};
pub use modifier::{Modifier, QueryPlan, RowLock};
pub use query::{
    Filter, Pagination, Predicate, QueryOperator, QuerySpec, SortOrder, Sorting,
};
pub use schema::{
    Association, AssociationKind, ColumnDef, ColumnRole, EntitySchema, FieldDecl, FieldLookup,
    FieldSet, SchemaRegistry,
};
pub use session::{PgSession, Row, Session, Statement};
#[cfg(any(test, feature = "testing"))]
pub use session::testing::ScriptedSession;
pub use traits::*;
pub use validation::{ValidatedFieldName, ValidatedTableName, ValidationError};

pub use config::QueryConfig;

// Used by `#[derive(Entity)]` expansions
pub use chrono;
pub use serde_json;
