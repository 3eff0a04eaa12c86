//! PostgreSQL sessions on top of sqlx

use super::{Row, Session, Statement};
use crate::errors::DaoError;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row as _};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use type_mapping::BindValue;

/// Live transaction shared by its session and the savepoints nested in it
struct TxState {
    tx: Mutex<Option<sqlx::Transaction<'static, Postgres>>>,
    savepoints: AtomicU32,
}

#[derive(Clone)]
enum Inner {
    Pool(PgPool),
    Transaction(Arc<TxState>),
    Savepoint {
        state: Arc<TxState>,
        name: String,
        open: Arc<AtomicBool>,
    },
}

/// A `Session` backed by a PostgreSQL pool or transaction
#[derive(Clone)]
pub struct PgSession {
    inner: Inner,
}

impl fmt::Debug for PgSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.inner {
            Inner::Pool(_) => "pool",
            Inner::Transaction(_) => "transaction",
            Inner::Savepoint { .. } => "savepoint",
        };
        f.debug_struct("PgSession").field("kind", &kind).finish()
    }
}

impl PgSession {
    pub fn new(pool: PgPool) -> Self {
        Self {
            inner: Inner::Pool(pool),
        }
    }

    pub fn pool(&self) -> Option<&PgPool> {
        match &self.inner {
            Inner::Pool(pool) => Some(pool),
            _ => None,
        }
    }

    fn state(&self) -> Result<&Arc<TxState>, DaoError> {
        match &self.inner {
            Inner::Pool(_) => Err(DaoError::TransactionClosed(
                "session is not a transaction".to_string(),
            )),
            Inner::Transaction(state) => Ok(state),
            Inner::Savepoint { state, open, .. } => {
                if open.load(Ordering::Acquire) {
                    Ok(state)
                } else {
                    Err(closed())
                }
            }
        }
    }

    async fn run_fetch(&self, statement: &Statement) -> Result<Vec<sqlx::postgres::PgRow>, DaoError> {
        let query = bind_params(statement);
        match &self.inner {
            Inner::Pool(pool) => query
                .fetch_all(pool)
                .await
                .map_err(|e| DaoError::database_operation("session", "fetch_all", e)),
            _ => {
                let mut guard = self.state()?.tx.lock().await;
                let tx = guard.as_mut().ok_or_else(closed)?;
                query
                    .fetch_all(&mut **tx)
                    .await
                    .map_err(|e| DaoError::database_operation("session", "fetch_all", e))
            }
        }
    }

    async fn run_execute(&self, statement: &Statement) -> Result<u64, DaoError> {
        let query = bind_params(statement);
        let result = match &self.inner {
            Inner::Pool(pool) => query.execute(pool).await,
            _ => {
                let mut guard = self.state()?.tx.lock().await;
                let tx = guard.as_mut().ok_or_else(closed)?;
                query.execute(&mut **tx).await
            }
        };
        result
            .map(|done| done.rows_affected())
            .map_err(|e| DaoError::database_operation("session", "execute", e))
    }

    /// Run a savepoint command on the shared transaction and close the savepoint
    async fn finish_savepoint(
        &self,
        state: &TxState,
        open: &AtomicBool,
        sql: String,
        operation: &str,
    ) -> Result<(), DaoError> {
        if !open.swap(false, Ordering::AcqRel) {
            return Err(closed());
        }
        let mut guard = state.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(closed)?;
        sqlx::query(&sql)
            .execute(&mut **tx)
            .await
            .map_err(|e| DaoError::database_operation("session", operation, e))?;
        Ok(())
    }
}

fn closed() -> DaoError {
    DaoError::TransactionClosed("transaction already committed or rolled back".to_string())
}

// Parameters arrive already cast in SQL (`$n::TYPE`), so the bind type only
// has to be a faithful carrier of the value
fn bind_params(statement: &Statement) -> Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query(&statement.sql);
    for param in &statement.params {
        query = match BindValue::from(param) {
            BindValue::Text(s) => query.bind(s),
            BindValue::BigInt(i) => query.bind(i),
            BindValue::Float(f) => query.bind(f),
            BindValue::Boolean(b) => query.bind(b),
            BindValue::Numeric(n) => query.bind(n),
            BindValue::Json(v) => query.bind(sqlx::types::Json(v)),
            BindValue::Null => query.bind(Option::<String>::None),
        };
    }
    query
}

fn decode_row(row: &sqlx::postgres::PgRow) -> Result<Row, DaoError> {
    let value: Value = row
        .try_get("row")
        .map_err(|e| DaoError::marshal(format!("unreadable row column: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DaoError::marshal(format!(
            "row column must be an object, got {}",
            crate::codec::kind_of(&other)
        ))),
    }
}

#[async_trait]
impl Session for PgSession {
    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, DaoError> {
        trace_log!("fetch_all: {} ({} params)", statement.sql, statement.params.len());
        self.run_fetch(statement)
            .await?
            .iter()
            .map(decode_row)
            .collect()
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, DaoError> {
        trace_log!("execute: {} ({} params)", statement.sql, statement.params.len());
        self.run_execute(statement).await
    }

    async fn begin(&self) -> Result<Arc<dyn Session>, DaoError> {
        match &self.inner {
            Inner::Pool(pool) => {
                let tx = pool
                    .begin()
                    .await
                    .map_err(|e| DaoError::database_operation("session", "begin", e))?;
                debug_log!("Transaction started");
                Ok(Arc::new(PgSession {
                    inner: Inner::Transaction(Arc::new(TxState {
                        tx: Mutex::new(Some(tx)),
                        savepoints: AtomicU32::new(0),
                    })),
                }))
            }
            _ => {
                let state = Arc::clone(self.state()?);
                let name = format!("dao_sp_{}", state.savepoints.fetch_add(1, Ordering::AcqRel) + 1);
                {
                    let mut guard = state.tx.lock().await;
                    let tx = guard.as_mut().ok_or_else(closed)?;
                    sqlx::query(&format!("SAVEPOINT {}", name))
                        .execute(&mut **tx)
                        .await
                        .map_err(|e| DaoError::database_operation("session", "begin", e))?;
                }
                debug_log!("Savepoint {} started", name);
                Ok(Arc::new(PgSession {
                    inner: Inner::Savepoint {
                        state,
                        name,
                        open: Arc::new(AtomicBool::new(true)),
                    },
                }))
            }
        }
    }

    async fn commit(&self) -> Result<(), DaoError> {
        match &self.inner {
            Inner::Savepoint { state, name, open } => {
                self.finish_savepoint(state, open, format!("RELEASE SAVEPOINT {}", name), "commit")
                    .await
            }
            _ => {
                let tx = self.state()?.tx.lock().await.take().ok_or_else(closed)?;
                tx.commit()
                    .await
                    .map_err(|e| DaoError::database_operation("session", "commit", e))?;
                debug_log!("Transaction committed");
                Ok(())
            }
        }
    }

    async fn rollback(&self) -> Result<(), DaoError> {
        match &self.inner {
            Inner::Savepoint { state, name, open } => {
                self.finish_savepoint(
                    state,
                    open,
                    format!("ROLLBACK TO SAVEPOINT {}", name),
                    "rollback",
                )
                .await
            }
            _ => {
                let tx = self.state()?.tx.lock().await.take().ok_or_else(closed)?;
                tx.rollback()
                    .await
                    .map_err(|e| DaoError::database_operation("session", "rollback", e))?;
                debug_log!("Transaction rolled back");
                Ok(())
            }
        }
    }

    fn is_transaction(&self) -> bool {
        !matches!(self.inner, Inner::Pool(_))
    }
}
