//! # generic-dao
//!
//! A generic data-access layer for PostgreSQL: declare an entity once, then
//! count, list, get, create, update, save and delete it through one engine,
//! with caller-supplied sort and filter fields validated against the
//! entity's persisted columns.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use generic_dao::prelude::*;
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize, Entity)]
//! #[entity(table = "users")]
//! pub struct User {
//!     #[primary_key]
//!     pub id: Option<i64>,
//!
//!     #[column]
//!     #[unique]
//!     pub email: Option<String>,
//!
//!     #[column]
//!     pub name: Option<String>,
//!
//!     #[created_at]
//!     pub created_at: Option<DateTime<Utc>>,
//!
//!     #[updated_at]
//!     pub updated_at: Option<DateTime<Utc>>,
//!
//!     #[soft_delete]
//!     pub deleted_at: Option<DateTime<Utc>>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hub = DaoHub::new(AppConfig::load()?).await?;
//!     hub.register::<User>();
//!     let dao = hub.dao();
//!     let ctx = ExecContext::background();
//!
//!     // Update by unique email, inserting when no row has it
//!     let mut user = User {
//!         email: Some("ada@example.com".to_string()),
//!         name: Some("Ada".to_string()),
//!         ..User::default()
//!     };
//!     dao.save(&ctx, &mut user, &[]).await?;
//!
//!     let spec = QuerySpec::<User>::new()
//!         .search("ada", "name,email")
//!         .sort_by("created_at", true)
//!         .paginate(1, 20);
//!     let total = dao.count(&ctx, &spec, &[]).await?;
//!     let page = dao.list(&ctx, &spec, &[]).await?;
//!     println!("{} of {} users", page.len(), total);
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod api;
pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use self::core::DaoHub;
pub use errors::GenericDaoError;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, QueryConfig};

// Re-export internal crates used by macros and public API
// These MUST be public for the generated macro code to work correctly
pub use dao_core;
pub use entity_derive;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
