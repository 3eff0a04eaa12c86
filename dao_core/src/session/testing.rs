//! A recording session for tests
//!
//! `ScriptedSession` answers statements from a queue of scripted responses
//! and records every statement it receives. Sessions begun from it share the
//! same script and log, so a whole unit of work can be asserted in order.

use super::{Row, Session, Statement};
use crate::errors::DaoError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Response {
    Rows(Vec<Row>),
    Affected(u64),
    Error(String),
}

#[derive(Debug, Default)]
struct Script {
    responses: VecDeque<Response>,
    statements: Vec<Statement>,
    events: Vec<String>,
    delay: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ScriptedSession {
    script: Arc<Mutex<Script>>,
    transaction: bool,
    open: Arc<AtomicBool>,
}

impl Default for ScriptedSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            transaction: false,
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Queue a result set; each value must be a JSON object
    pub fn push_rows(&self, rows: Vec<Value>) -> &Self {
        let rows = rows
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect();
        self.lock().responses.push_back(Response::Rows(rows));
        self
    }

    pub fn push_affected(&self, count: u64) -> &Self {
        self.lock().responses.push_back(Response::Affected(count));
        self
    }

    pub fn push_error(&self, message: &str) -> &Self {
        self.lock()
            .responses
            .push_back(Response::Error(message.to_string()));
        self
    }

    /// Delay every statement, to exercise deadlines
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.lock().statements.clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.lock()
            .statements
            .iter()
            .map(|statement| statement.sql.clone())
            .collect()
    }

    /// BEGIN/COMMIT/ROLLBACK events in order
    pub fn events(&self) -> Vec<String> {
        self.lock().events.clone()
    }

    pub fn remaining_responses(&self) -> usize {
        self.lock().responses.len()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_open(&self) -> Result<(), DaoError> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(DaoError::TransactionClosed(
                "transaction already committed or rolled back".to_string(),
            ))
        }
    }

    async fn respond(&self, statement: &Statement) -> Result<Option<Response>, DaoError> {
        self.ensure_open()?;
        let delay = {
            let mut script = self.lock();
            script.statements.push(statement.clone());
            script.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.lock().responses.pop_front())
    }

    fn finish(&self, event: &str) -> Result<(), DaoError> {
        if !self.transaction {
            return Err(DaoError::TransactionClosed(
                "session is not a transaction".to_string(),
            ));
        }
        if !self.open.swap(false, Ordering::AcqRel) {
            return Err(DaoError::TransactionClosed(
                "transaction already committed or rolled back".to_string(),
            ));
        }
        self.lock().events.push(event.to_string());
        Ok(())
    }
}

#[async_trait]
impl Session for ScriptedSession {
    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, DaoError> {
        match self.respond(statement).await? {
            Some(Response::Rows(rows)) => Ok(rows),
            Some(Response::Affected(_)) | None => Ok(Vec::new()),
            Some(Response::Error(message)) => {
                Err(DaoError::database_operation("session", "fetch_all", message))
            }
        }
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, DaoError> {
        match self.respond(statement).await? {
            Some(Response::Affected(count)) => Ok(count),
            Some(Response::Rows(rows)) => Ok(rows.len() as u64),
            None => Ok(0),
            Some(Response::Error(message)) => {
                Err(DaoError::database_operation("session", "execute", message))
            }
        }
    }

    async fn begin(&self) -> Result<Arc<dyn Session>, DaoError> {
        self.ensure_open()?;
        self.lock().events.push("BEGIN".to_string());
        Ok(Arc::new(ScriptedSession {
            script: Arc::clone(&self.script),
            transaction: true,
            open: Arc::new(AtomicBool::new(true)),
        }))
    }

    async fn commit(&self) -> Result<(), DaoError> {
        self.finish("COMMIT")
    }

    async fn rollback(&self) -> Result<(), DaoError> {
        self.finish("ROLLBACK")
    }

    fn is_transaction(&self) -> bool {
        self.transaction
    }
}
