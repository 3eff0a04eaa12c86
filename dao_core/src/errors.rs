use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaoError {
    /// A caller-supplied sort/filter field or identifier is not usable
    #[error("query option error: {0}")]
    InvalidQueryOption(String),

    /// The target of Get/Update does not exist
    #[error("not exists: {0}")]
    NotExists(String),

    #[error("store error in {operation} on {table}: {message}")]
    Store {
        table: String,
        operation: String,
        message: String,
    },

    /// A value could not be converted between an entity and a row
    #[error("marshal error: {0}")]
    Marshal(String),

    #[error("transaction closed: {0}")]
    TransactionClosed(String),

    #[error("delete condition error on {0}: empty condition")]
    UnsafeDelete(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("timeout in {operation} on {table}")]
    Timeout { table: String, operation: String },
}

impl DaoError {
    pub fn database_operation(table: &str, operation: &str, error: impl Display) -> Self {
        DaoError::Store {
            table: table.to_string(),
            operation: operation.to_string(),
            message: error.to_string(),
        }
    }

    pub fn invalid_option(message: impl Into<String>) -> Self {
        DaoError::InvalidQueryOption(message.into())
    }

    pub fn not_exists(table: &str, detail: impl Display) -> Self {
        DaoError::NotExists(format!("{} {}", table, detail))
    }

    pub fn marshal(error: impl Display) -> Self {
        DaoError::Marshal(error.to_string())
    }

    pub fn is_not_exists(&self) -> bool {
        matches!(self, DaoError::NotExists(_))
    }

    /// Attach the failing operation to a store error raised below the engine.
    pub(crate) fn in_operation(self, table: &str, operation: &str) -> Self {
        match self {
            DaoError::Store { message, .. } => DaoError::Store {
                table: table.to_string(),
                operation: operation.to_string(),
                message,
            },
            other => other,
        }
    }
}

impl From<crate::validation::ValidationError> for DaoError {
    fn from(error: crate::validation::ValidationError) -> Self {
        DaoError::InvalidQueryOption(error.to_string())
    }
}

impl From<serde_json::Error> for DaoError {
    fn from(error: serde_json::Error) -> Self {
        DaoError::Marshal(error.to_string())
    }
}
