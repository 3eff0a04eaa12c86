//! Error types for the generic-dao facade

use config::ConfigError;
use dao_core::DaoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenericDaoError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dao(#[from] DaoError),
}
