use crate::context::ExecContext;
use crate::errors::DaoError;
use crate::schema::{EntitySchema, FieldLookup, FieldSet, SchemaRegistry};
use crate::session::Session;
use config::QueryConfig;
use std::future::Future;
use std::sync::Arc;

/// The generic access engine
///
/// A cheap, cloneable view over a session: the pool, or a transaction when
/// obtained through [`BaseDao::with_transaction`]. The schema registry and
/// query options are shared between all views.
#[derive(Clone)]
pub struct BaseDao {
    pub(crate) session: Arc<dyn Session>,
    pub(crate) registry: Arc<SchemaRegistry>,
    pub(crate) options: Arc<QueryConfig>,
}

impl std::fmt::Debug for BaseDao {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseDao")
            .field("session", &self.session)
            .field("registered_entities", &self.registry.len())
            .field("options", &self.options)
            .finish()
    }
}

impl BaseDao {
    pub const NAME: &'static str = "BaseDao";

    pub fn new(
        session: Arc<dyn Session>,
        registry: Arc<SchemaRegistry>,
        options: QueryConfig,
    ) -> Self {
        Self {
            session,
            registry,
            options: Arc::new(options),
        }
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &QueryConfig {
        &self.options
    }

    /// Same registry and options, different session
    pub(crate) fn bound_to(&self, session: Arc<dyn Session>) -> Self {
        Self {
            session,
            registry: Arc::clone(&self.registry),
            options: Arc::clone(&self.options),
        }
    }

    pub(crate) fn fields_of(&self, schema: &EntitySchema) -> Arc<FieldSet> {
        self.registry.field_set(schema)
    }

    /// Drive one operation under the context's deadline (or the configured
    /// statement timeout) and tag store errors with the operation
    pub(crate) async fn run<T, F>(
        &self,
        ctx: &ExecContext,
        table: &str,
        operation: &str,
        work: F,
    ) -> Result<T, DaoError>
    where
        F: Future<Output = Result<T, DaoError>>,
    {
        let result = match ctx.deadline_or(self.options.statement_timeout()) {
            Some(deadline) => match tokio::time::timeout_at(deadline, work).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("{} on {} exceeded its deadline", operation, table);
                    return Err(DaoError::Timeout {
                        table: table.to_string(),
                        operation: operation.to_string(),
                    });
                }
            },
            None => work.await,
        };
        result.map_err(|e| e.in_operation(table, operation))
    }
}
