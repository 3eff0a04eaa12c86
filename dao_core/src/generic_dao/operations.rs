//! `Dao` operations of the generic access engine

use super::core::BaseDao;
use super::statements::{self, Conflict, SelectBuilder};
use super::transaction::Transaction;
use crate::codec;
use crate::context::ExecContext;
use crate::errors::DaoError;
use crate::modifier::{build_plan, entity_modifiers, Modifier, QueryPlan};
use crate::query::{predicates_of, Predicate, QuerySpec};
use crate::schema::EntitySchema;
use crate::session::Row;
use crate::traits::{Dao, Entity};
use async_trait::async_trait;
use serde_json::Value;

/// Entity-declared join/preload modifiers first, then the caller's
fn with_entity_modifiers<E: Entity>(modifiers: &[Modifier]) -> QueryPlan {
    let declared = entity_modifiers::<E>();
    build_plan(declared.iter().chain(modifiers.iter()))
}

/// Equality predicates, text filter and negation of a query
fn apply_query<E>(select: &mut SelectBuilder, spec: &QuerySpec<E>) -> Result<(), DaoError> {
    select.filter(&spec.query)?;
    if let Some(clause) = select.generator().text_filter(&spec.filter)? {
        select.push_clause(clause);
    }
    if let Some(clause) = select.generator().negation(&spec.not)? {
        select.push_clause(clause);
    }
    Ok(())
}

fn order_by_key(select: &mut SelectBuilder, schema: &EntitySchema) -> Result<String, DaoError> {
    Ok(format!(
        "ORDER BY {}",
        select.generator().column(schema.primary_key_column())?
    ))
}

impl BaseDao {
    async fn insert_row(
        &self,
        schema: &EntitySchema,
        row: &Row,
        conflict: Conflict,
    ) -> Result<Row, DaoError> {
        let statement = statements::insert(schema, self.fields_of(schema), row, conflict)?;
        self.session
            .fetch_optional(&statement)
            .await?
            .ok_or_else(|| DaoError::database_operation(schema.table, "insert", "no row returned"))
    }

    /// Merge stored children into the stored parent unless the plan omits associations
    async fn write_associations(
        &self,
        schema: &EntitySchema,
        plan: &QueryPlan,
        row: &Row,
        mut stored: Row,
    ) -> Result<Row, DaoError> {
        if plan.omit_associations || schema.associations.is_empty() {
            return Ok(stored);
        }
        let mut parent = row.clone();
        parent.extend(stored.clone());
        stored.extend(self.save_children(schema, &parent).await?);
        Ok(stored)
    }

    /// Fill in a missing primary key from the entity's unique index
    ///
    /// The lookup includes soft-deleted rows. No match leaves the key unset.
    async fn resolve_key<E: Entity>(
        &self,
        schema: &EntitySchema,
        entity: &mut E,
        plan: &QueryPlan,
    ) -> Result<(), DaoError> {
        if entity.key().is_some() {
            return Ok(());
        }
        let Some(index) = entity.unique_index().filter(|index| !index.is_empty()) else {
            return Ok(());
        };

        let lookup = QueryPlan {
            unscoped: true,
            lock: plan.lock,
            ..QueryPlan::default()
        };
        let mut select = SelectBuilder::new(schema, &lookup, self.registry.as_ref())?;
        select.filter(&index)?;
        let order = order_by_key(&mut select, schema)?;
        let found = self
            .session
            .fetch_optional(&select.rows(&order, "LIMIT 1"))
            .await?;

        match found.as_ref().and_then(|row| row.get(schema.primary_key_column())) {
            Some(Value::Null) | None => {
                debug_log!("{}: unique index matched no row", schema.type_name);
                Ok(())
            }
            Some(key) => {
                let key: E::Key = serde_json::from_value(key.clone())?;
                tracing::debug!("{}: resolved key {:?} by unique index", schema.type_name, key);
                entity.set_key(key);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Dao for BaseDao {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn begin(&self) -> Result<Transaction, DaoError> {
        let session = self.session.begin().await?;
        Ok(Transaction::new(session))
    }

    fn with_transaction(&self, tx: &Transaction) -> Self {
        self.bound_to(tx.session())
    }

    async fn count<E: Entity>(
        &self,
        ctx: &ExecContext,
        spec: &QuerySpec<E>,
        modifiers: &[Modifier],
    ) -> Result<i64, DaoError> {
        let schema = E::schema();
        if self.options.validate_queries {
            spec.validate(self.registry.as_ref())?;
        }
        let plan = build_plan(modifiers);

        self.run(ctx, schema.table, "count", async {
            let mut select = SelectBuilder::new(&schema, &plan, self.registry.as_ref())?;
            apply_query(&mut select, spec)?;
            let row = self.session.fetch_optional(&select.count()).await?;
            row.as_ref()
                .and_then(|row| row.get("count"))
                .and_then(Value::as_i64)
                .ok_or_else(|| DaoError::marshal("count query returned no count"))
        })
        .await
    }

    async fn list<E: Entity>(
        &self,
        ctx: &ExecContext,
        spec: &QuerySpec<E>,
        modifiers: &[Modifier],
    ) -> Result<Vec<E>, DaoError> {
        let schema = E::schema();
        if self.options.validate_queries {
            spec.validate(self.registry.as_ref())?;
        }
        let plan = with_entity_modifiers::<E>(modifiers);

        let rows = self
            .run(ctx, schema.table, "list", async {
                let mut select = SelectBuilder::new(&schema, &plan, self.registry.as_ref())?;
                apply_query(&mut select, spec)?;
                let order = select.generator().order_clause(&spec.sorting)?;
                let limit = spec.pagination.to_sql(self.options.max_page_size);
                let mut rows = self.session.fetch_all(&select.rows(&order, &limit)).await?;
                self.preload_into(&schema, &plan, &mut rows).await?;
                Ok(rows)
            })
            .await?;

        debug_log!("list {}: {} rows", schema.table, rows.len());
        rows.into_iter().map(codec::from_row).collect()
    }

    async fn get<E: Entity>(
        &self,
        ctx: &ExecContext,
        entity: &mut E,
        modifiers: &[Modifier],
    ) -> Result<(), DaoError> {
        let schema = E::schema();
        let predicates = predicates_of(&*entity)?;
        let plan = with_entity_modifiers::<E>(modifiers);

        let row = self
            .run(ctx, schema.table, "get", async {
                let mut select = SelectBuilder::new(&schema, &plan, self.registry.as_ref())?;
                select.filter(&predicates)?;
                let order = order_by_key(&mut select, &schema)?;
                let Some(row) = self
                    .session
                    .fetch_optional(&select.rows(&order, "LIMIT 1"))
                    .await?
                else {
                    return Err(DaoError::not_exists(schema.table, "no row matches"));
                };
                let mut rows = [row];
                self.preload_into(&schema, &plan, &mut rows).await?;
                let [row] = rows;
                Ok(row)
            })
            .await?;

        codec::merge_into(entity, row)
    }

    async fn list_with_raw_clause<E: Entity>(
        &self,
        ctx: &ExecContext,
        clause: &str,
        in_clause: &[Vec<Value>],
    ) -> Result<Vec<E>, DaoError> {
        let schema = E::schema();

        let rows = self
            .run(ctx, schema.table, "list_with_raw_clause", async {
                let plan = QueryPlan::default();
                let mut select = SelectBuilder::new(&schema, &plan, self.registry.as_ref())?;
                let clause = statements::expand_in_clause(select.generator(), clause, in_clause)?;
                if !clause.trim().is_empty() {
                    select.push_clause(format!("({})", clause));
                }
                self.session.fetch_all(&select.rows("", "")).await
            })
            .await?;

        rows.into_iter().map(codec::from_row).collect()
    }

    async fn create<E: Entity>(
        &self,
        ctx: &ExecContext,
        entity: &mut E,
        modifiers: &[Modifier],
    ) -> Result<(), DaoError> {
        let schema = E::schema();
        let plan = build_plan(modifiers);
        let row = codec::entity_row(&*entity)?;

        let stored = self
            .run(ctx, schema.table, "create", async {
                let stored = self.insert_row(&schema, &row, Conflict::Reject).await?;
                self.write_associations(&schema, &plan, &row, stored).await
            })
            .await?;

        codec::merge_into(entity, stored)
    }

    async fn update<E: Entity>(
        &self,
        ctx: &ExecContext,
        entity: &mut E,
        modifiers: &[Modifier],
    ) -> Result<(), DaoError> {
        let schema = E::schema();
        let plan = build_plan(modifiers);

        let stored = self
            .run(ctx, schema.table, "update", async {
                self.resolve_key(&schema, &mut *entity, &plan).await?;
                let Some(key) = entity.key() else {
                    return Err(DaoError::not_exists(
                        schema.table,
                        "target has no key and no unique index match",
                    ));
                };
                let key = serde_json::to_value(&key)?;
                let row = codec::entity_row(&*entity)?;

                let fields = self.fields_of(&schema);
                let stored = match statements::update(&schema, fields, &row, key.clone(), plan.unscoped)? {
                    Some(statement) => self.session.fetch_optional(&statement).await?,
                    None => {
                        // Nothing to write: only confirm the target exists
                        let mut select =
                            SelectBuilder::new(&schema, &plan, self.registry.as_ref())?;
                        select.filter(&[Predicate::eq(schema.primary_key_column(), key.clone())])?;
                        self.session
                            .fetch_optional(&select.rows("", "LIMIT 1"))
                            .await?
                    }
                };
                stored.ok_or_else(|| DaoError::not_exists(schema.table, format!("key {}", key)))
            })
            .await?;

        codec::merge_into(entity, stored)
    }

    async fn save<E: Entity>(
        &self,
        ctx: &ExecContext,
        entity: &mut E,
        modifiers: &[Modifier],
    ) -> Result<(), DaoError> {
        let schema = E::schema();
        let plan = build_plan(modifiers);

        let stored = self
            .run(ctx, schema.table, "save", async {
                self.resolve_key(&schema, &mut *entity, &plan).await?;
                let conflict = if entity.key().is_some() {
                    Conflict::UpdateAll
                } else {
                    Conflict::Reject
                };
                let row = codec::entity_row(&*entity)?;
                let stored = self.insert_row(&schema, &row, conflict).await?;
                self.write_associations(&schema, &plan, &row, stored).await
            })
            .await?;

        codec::merge_into(entity, stored)
    }

    async fn delete<E: Entity>(
        &self,
        ctx: &ExecContext,
        entity: &E,
        modifiers: &[Modifier],
    ) -> Result<u64, DaoError> {
        let schema = E::schema();
        let plan = build_plan(modifiers);
        let predicates = match entity.key() {
            Some(key) => vec![Predicate::eq(
                schema.primary_key_column(),
                serde_json::to_value(&key)?,
            )],
            None => predicates_of(entity)?,
        };

        if predicates.is_empty() && self.options.refuse_unfiltered_delete {
            tracing::warn!("Refused delete on {} without any condition", schema.table);
            return Err(DaoError::UnsafeDelete(schema.table.to_string()));
        }

        let statement =
            statements::delete(&schema, self.fields_of(&schema), &predicates, plan.unscoped)?;
        self.run(ctx, schema.table, "delete", self.session.execute(&statement))
            .await
    }
}
