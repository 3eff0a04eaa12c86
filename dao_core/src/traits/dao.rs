//! The operation surface of the access engine

use crate::context::ExecContext;
use crate::errors::DaoError;
use crate::generic_dao::Transaction;
use crate::modifier::Modifier;
use crate::query::QuerySpec;
use crate::traits::Entity;
use async_trait::async_trait;
use serde_json::Value;

/// Generic data-access operations over any [`Entity`]
///
/// Every operation takes an [`ExecContext`] whose deadline bounds all store
/// calls it makes. Modifiers are applied in the order given.
#[async_trait]
pub trait Dao: Send + Sync {
    fn name(&self) -> &'static str;

    /// Start a unit of work nested in this DAO's session
    async fn begin(&self) -> Result<Transaction, DaoError>;

    /// A DAO running its operations inside `tx`
    fn with_transaction(&self, tx: &Transaction) -> Self
    where
        Self: Sized;

    /// Number of rows matching the query; only the caller's modifiers apply
    async fn count<E: Entity>(
        &self,
        ctx: &ExecContext,
        spec: &QuerySpec<E>,
        modifiers: &[Modifier],
    ) -> Result<i64, DaoError>;

    /// Matching rows; no match is an empty list, not an error
    async fn list<E: Entity>(
        &self,
        ctx: &ExecContext,
        spec: &QuerySpec<E>,
        modifiers: &[Modifier],
    ) -> Result<Vec<E>, DaoError>;

    /// Load the first row equal to the entity's set columns into it
    async fn get<E: Entity>(
        &self,
        ctx: &ExecContext,
        entity: &mut E,
        modifiers: &[Modifier],
    ) -> Result<(), DaoError>;

    /// Rows matching a caller-written clause whose first `?` expands to the
    /// tuple list of `in_clause`
    async fn list_with_raw_clause<E: Entity>(
        &self,
        ctx: &ExecContext,
        clause: &str,
        in_clause: &[Vec<Value>],
    ) -> Result<Vec<E>, DaoError>;

    /// Insert; the stored row (generated key, timestamps) is written back
    async fn create<E: Entity>(
        &self,
        ctx: &ExecContext,
        entity: &mut E,
        modifiers: &[Modifier],
    ) -> Result<(), DaoError>;

    /// Resolve the target by key or unique index, then write its set columns
    async fn update<E: Entity>(
        &self,
        ctx: &ExecContext,
        entity: &mut E,
        modifiers: &[Modifier],
    ) -> Result<(), DaoError>;

    /// Resolve like `update`, then overwrite every column, inserting when unresolved
    async fn save<E: Entity>(
        &self,
        ctx: &ExecContext,
        entity: &mut E,
        modifiers: &[Modifier],
    ) -> Result<(), DaoError>;

    /// Delete by key, or by the entity's set columns; returns the affected row count
    async fn delete<E: Entity>(
        &self,
        ctx: &ExecContext,
        entity: &E,
        modifiers: &[Modifier],
    ) -> Result<u64, DaoError>;
}
