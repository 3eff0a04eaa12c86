//! Convenience re-exports for common DAO usage

// Core traits
pub use crate::traits::{AsTimestamp, Dao, Embeddable, Entity, EntityKey};

// Error types
pub use crate::errors::DaoError;

// Access engine and transactions
pub use crate::context::ExecContext;
pub use crate::generic_dao::{BaseDao, Transaction};
pub use crate::session::{PgSession, Row, Session, Statement};

// Schema declaration and registry
pub use crate::schema::{
    Association, AssociationKind, ColumnDef, ColumnRole, EntitySchema, FieldDecl, FieldSet,
    SchemaRegistry,
};

// Query specification and modifiers
pub use crate::modifier::{self, Modifier, QueryPlan, RowLock};
pub use crate::query::{Filter, Pagination, Predicate, QueryOperator, QuerySpec, SortOrder, Sorting};

// Validation
pub use crate::validation::{ValidatedFieldName, ValidatedTableName, ValidationError};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
