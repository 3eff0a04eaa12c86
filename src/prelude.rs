//! Convenience re-exports for common generic-dao usage
//!
//! # Example
//!
//! ```rust
//! use generic_dao::prelude::*;
//!
//! // Entity derive, Dao trait, QuerySpec, modifiers and DaoHub are in scope
//! ```

// Facade components
pub use crate::api::{DeleteRequest, ItemResponse, ListData, ListResponse, SaveRequest};
pub use crate::core::DaoHub;
pub use crate::errors::GenericDaoError;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, QueryConfig};

// Engine, schema, query and modifier types
pub use dao_core::prelude::*;

// Re-export dao_core module for macro-generated code
pub use dao_core;

// Derive macros for entity declarations
pub use entity_derive::{Embeddable, Entity};

// Common external dependencies
pub use async_trait;
pub use chrono::{DateTime, Utc};
pub use serde_json;
pub use sqlx;
pub use tokio;
pub use sqlx::PgPool;
