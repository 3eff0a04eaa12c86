//! Transaction support for BaseDao
//!
//! A unit of work is begun from a DAO, used through the DAO returned by
//! `with_transaction`, and finished with `commit` or `rollback`.

use crate::errors::DaoError;
use crate::session::Session;
use std::sync::Arc;

/// A handle to a transaction (or a savepoint, when begun inside one)
///
/// # Example
/// ```ignore
/// let tx = dao.begin().await?;
/// let tx_dao = dao.with_transaction(&tx);
///
/// tx_dao.update(&ctx, &mut debit, &[]).await?;
/// tx_dao.update(&ctx, &mut credit, &[]).await?;
///
/// tx.commit().await?;
/// ```
///
/// Once committed or rolled back, the handle and every DAO bound to it fail
/// with [`DaoError::TransactionClosed`].
#[derive(Debug, Clone)]
pub struct Transaction {
    session: Arc<dyn Session>,
}

impl Transaction {
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self { session }
    }

    /// The session operations of this transaction run on
    pub fn session(&self) -> Arc<dyn Session> {
        Arc::clone(&self.session)
    }

    pub async fn commit(&self) -> Result<(), DaoError> {
        self.session.commit().await
    }

    pub async fn rollback(&self) -> Result<(), DaoError> {
        self.session.rollback().await
    }
}
