//! Core DaoHub functionality
//!
//! `DaoHub` owns the connection pool and the schema registry shared by
//! every engine it hands out.

use dao_core::schema::FieldSet;
use dao_core::{BaseDao, Entity, PgSession, SchemaRegistry};
use sqlx::postgres::PgConnectOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::GenericDaoError;
use config::{AppConfig, QueryConfig};

/// Startup wiring: pool, registry and query options
#[derive(Debug, Clone)]
pub struct DaoHub {
    pool: PgPool,
    registry: Arc<SchemaRegistry>,
    options: QueryConfig,
}

impl DaoHub {
    /// Validate the configuration and connect the pool
    pub async fn new(config: AppConfig) -> Result<Self, GenericDaoError> {
        config.validate()?;
        let database = &config.database;

        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(database.max_connections)
            .min_connections(database.min_connections)
            .acquire_timeout(Duration::from_secs(database.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(database.idle_timeout_seconds));

        if database.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(database.max_lifetime_seconds));
        }

        let pool = pool_options.connect_with(connect_options(&config)?).await?;
        Ok(Self::from_pool(pool, config.query))
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool, options: QueryConfig) -> Self {
        Self {
            pool,
            registry: Arc::new(SchemaRegistry::new()),
            options,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &QueryConfig {
        &self.options
    }

    /// Register an entity's field set ahead of its first query
    pub fn register<E: Entity>(&self) -> Arc<FieldSet> {
        let fields = self.registry.register::<E>();
        debug_log!("DaoHub: {} has {} columns", E::schema().type_name, fields.len());
        fields
    }

    /// An engine bound to the pool
    pub fn dao(&self) -> BaseDao {
        BaseDao::new(
            Arc::new(PgSession::new(self.pool.clone())),
            Arc::clone(&self.registry),
            self.options.clone(),
        )
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), GenericDaoError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

/// Connection options; a configured statement timeout is also set on the
/// server so statements abandoned by a client deadline do not keep running
fn connect_options(config: &AppConfig) -> Result<PgConnectOptions, sqlx::Error> {
    let options: PgConnectOptions = config.database.connection_string().parse()?;
    match config.query.statement_timeout_ms {
        0 => Ok(options),
        timeout_ms => {
            Ok(options.options([("statement_timeout", format!("{}ms", timeout_ms))]))
        }
    }
}
