//! The seam between the access engine and the store
//!
//! The engine renders parameterised SQL into a [`Statement`] and hands it to
//! a [`Session`]. [`PgSession`] is the PostgreSQL binding; a session may be
//! pool-backed or bound to a transaction.

pub mod postgres;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use postgres::PgSession;

use crate::errors::DaoError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// One result row: column (or projection key) to value
pub type Row = serde_json::Map<String, Value>;

/// SQL text with its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// A handle to the store: the pool, a transaction, or a savepoint inside one
///
/// Statements returning rows project a single JSON object column named `row`.
#[async_trait]
pub trait Session: Send + Sync + Debug {
    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, DaoError>;

    async fn fetch_optional(&self, statement: &Statement) -> Result<Option<Row>, DaoError> {
        Ok(self.fetch_all(statement).await?.into_iter().next())
    }

    /// Run a statement and return the number of affected rows
    async fn execute(&self, statement: &Statement) -> Result<u64, DaoError>;

    /// Start a unit of work nested in this session
    async fn begin(&self) -> Result<Arc<dyn Session>, DaoError>;

    async fn commit(&self) -> Result<(), DaoError>;

    async fn rollback(&self) -> Result<(), DaoError>;

    fn is_transaction(&self) -> bool;
}
