//! Statement construction for the access engine
//!
//! Rows travel as JSON objects: selects project `to_jsonb(<table>.*)` (with
//! joined associations nested under their names) as the single `row` column,
//! and writes return the stored row the same way.

use crate::errors::DaoError;
use crate::modifier::QueryPlan;
use crate::query::{where_clause, Predicate, SqlGenerator};
use crate::schema::{AssociationKind, ColumnRole, EntitySchema, FieldLookup, FieldSet};
use crate::session::{Row, Statement};
use crate::validation::{ValidatedFieldName, ValidatedTableName};
use serde_json::Value;
use std::sync::Arc;

/// Quote a bare identifier (association alias, column in SET/INSERT lists)
pub(crate) fn quote_ident(name: &str) -> Result<String, DaoError> {
    let field = ValidatedFieldName::new(name)?;
    if field.qualifier().is_some() {
        return Err(DaoError::invalid_option(format!(
            "{:?} must be a bare identifier",
            name
        )));
    }
    Ok(field.quoted())
}

fn returning(generator: &SqlGenerator) -> String {
    format!("RETURNING to_jsonb({}.*) AS row", generator.table())
}

/// A SELECT over one entity table with its joins, scope and predicates
pub(crate) struct SelectBuilder {
    generator: SqlGenerator,
    projection: String,
    joins: Vec<String>,
    clauses: Vec<String>,
    plan: QueryPlan,
}

impl SelectBuilder {
    pub(crate) fn new(
        schema: &EntitySchema,
        plan: &QueryPlan,
        lookup: &impl FieldLookup,
    ) -> Result<Self, DaoError> {
        let mut generator = SqlGenerator::new(schema.table, lookup.field_set(schema))?;
        let root = generator.table();
        let mut projection = format!("to_jsonb({}.*)", root);
        let mut joins = Vec::new();

        for name in &plan.joins {
            let association = schema.find_association(name).ok_or_else(|| {
                DaoError::invalid_option(format!(
                    "{} has no association {:?} to join",
                    schema.type_name, name
                ))
            })?;
            if association.kind == AssociationKind::HasMany {
                return Err(DaoError::invalid_option(format!(
                    "cannot join has-many association {:?} of {}; preload it instead",
                    name, schema.type_name
                )));
            }

            let target = (association.target)();
            let alias = quote_ident(association.name)?;
            let mut on = format!(
                "{}.{} = {}.{}",
                alias,
                quote_ident(association.target_column())?,
                root,
                quote_ident(association.owner_column())?
            );
            if let (false, Some(column)) = (plan.unscoped, target.soft_delete_column()) {
                on.push_str(&format!(" AND {}.{} IS NULL", alias, quote_ident(column)?));
            }

            joins.push(format!(
                "LEFT JOIN {} AS {} ON {}",
                ValidatedTableName::new(target.table)?.quoted(),
                alias,
                on
            ));
            projection.push_str(&format!(
                " || jsonb_build_object('{}', to_jsonb({}.*))",
                association.name, alias
            ));
            generator.with_alias(association.name, lookup.field_set(&target));
        }

        let mut clauses = Vec::new();
        if let (false, Some(column)) = (plan.unscoped, schema.soft_delete_column()) {
            clauses.push(format!("{} IS NULL", generator.column(column)?));
        }

        Ok(Self {
            generator,
            projection,
            joins,
            clauses,
            plan: plan.clone(),
        })
    }

    pub(crate) fn generator(&mut self) -> &mut SqlGenerator {
        &mut self.generator
    }

    pub(crate) fn push_clause(&mut self, clause: String) {
        self.clauses.push(clause);
    }

    /// AND the predicates into the WHERE clause
    pub(crate) fn filter(&mut self, predicates: &[Predicate]) -> Result<(), DaoError> {
        if let Some(clause) = self.generator.conjunction(predicates)? {
            self.clauses.push(clause);
        }
        Ok(())
    }

    fn source(&self) -> String {
        let mut sql = format!("FROM {}", self.generator.table());
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        let where_sql = where_clause(&self.clauses);
        if !where_sql.is_empty() {
            sql.push(' ');
            sql.push_str(&where_sql);
        }
        sql
    }

    /// The row-returning statement; `order` and `limit` are rendered clauses or empty
    pub(crate) fn rows(self, order: &str, limit: &str) -> Statement {
        let mut sql = format!("SELECT {} AS row {}", self.projection, self.source());
        for clause in [order, limit] {
            if !clause.is_empty() {
                sql.push(' ');
                sql.push_str(clause);
            }
        }
        if let Some(lock) = self.plan.lock {
            sql.push_str(&format!(" {} OF {}", lock.to_sql(), self.generator.table()));
        }
        self.generator.into_statement(sql)
    }

    pub(crate) fn count(self) -> Statement {
        let sql = format!(
            "SELECT jsonb_build_object('count', COUNT(*)) AS row {}",
            self.source()
        );
        self.generator.into_statement(sql)
    }
}

/// How an INSERT treats an existing row with the same primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Conflict {
    /// Plain insert; a duplicate key is a store error
    Reject,
    /// Overwrite the columns present in the row
    UpdateProvided,
    /// Overwrite every column except the key and creation time
    UpdateAll,
}

/// INSERT of an entity row, returning the stored row
///
/// Null columns are left to their defaults except under `UpdateAll`, where
/// they are written as NULL. Missing audit timestamps become `NOW()`.
pub(crate) fn insert(
    schema: &EntitySchema,
    fields: Arc<FieldSet>,
    row: &Row,
    conflict: Conflict,
) -> Result<Statement, DaoError> {
    let mut generator = SqlGenerator::new(schema.table, fields)?;
    let primary_key = schema.primary_key_column();
    let mut columns = Vec::new();
    let mut values = Vec::new();
    let mut updates = Vec::new();

    for column in schema.columns() {
        let value = row.get(column.name).cloned().unwrap_or(Value::Null);
        let expr = match (column.role, value) {
            (ColumnRole::CreatedAt, Value::Null) => "NOW()".to_string(),
            (ColumnRole::UpdatedAt, _) if conflict == Conflict::UpdateAll => "NOW()".to_string(),
            (ColumnRole::UpdatedAt, Value::Null) => "NOW()".to_string(),
            (ColumnRole::PrimaryKey, Value::Null) => continue,
            (_, Value::Null) if conflict != Conflict::UpdateAll => continue,
            (_, value) => generator.bind_for(column.name, value)?,
        };

        let quoted = quote_ident(column.name)?;
        if !matches!(column.role, ColumnRole::PrimaryKey | ColumnRole::CreatedAt) {
            updates.push(format!("{} = EXCLUDED.{}", quoted, quoted));
        }
        columns.push(quoted);
        values.push(expr);
    }

    let table = generator.table();
    let mut sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", table)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            values.join(", ")
        )
    };

    let has_key = row.get(primary_key).is_some_and(|v| !v.is_null());
    if conflict != Conflict::Reject && has_key {
        let key = quote_ident(primary_key)?;
        if updates.is_empty() {
            // Keep RETURNING populated when there is nothing else to overwrite
            updates.push(format!("{} = EXCLUDED.{}", key, key));
        }
        sql.push_str(&format!(
            " ON CONFLICT ({}) DO UPDATE SET {}",
            key,
            updates.join(", ")
        ));
    }

    sql.push(' ');
    sql.push_str(&returning(&generator));
    Ok(generator.into_statement(sql))
}

/// Partial UPDATE by primary key: set non-null columns, refresh `updated_at`
///
/// `None` when the row carries nothing to write.
pub(crate) fn update(
    schema: &EntitySchema,
    fields: Arc<FieldSet>,
    row: &Row,
    key: Value,
    unscoped: bool,
) -> Result<Option<Statement>, DaoError> {
    let mut generator = SqlGenerator::new(schema.table, fields)?;
    let mut assignments = Vec::new();

    for column in schema.columns() {
        let quoted = quote_ident(column.name)?;
        match column.role {
            ColumnRole::PrimaryKey | ColumnRole::CreatedAt => {}
            ColumnRole::UpdatedAt => assignments.push(format!("{} = NOW()", quoted)),
            ColumnRole::Plain | ColumnRole::SoftDelete => match row.get(column.name) {
                Some(Value::Null) | None => {}
                Some(value) => {
                    let param = generator.bind_for(column.name, value.clone())?;
                    assignments.push(format!("{} = {}", quoted, param));
                }
            },
        }
    }

    if assignments.is_empty() {
        return Ok(None);
    }

    let mut clauses = vec![key_clause(&mut generator, schema, key)?];
    if let (false, Some(column)) = (unscoped, schema.soft_delete_column()) {
        clauses.push(format!("{} IS NULL", generator.column(column)?));
    }

    let sql = format!(
        "UPDATE {} SET {} {} {}",
        generator.table(),
        assignments.join(", "),
        where_clause(&clauses),
        returning(&generator)
    );
    Ok(Some(generator.into_statement(sql)))
}

/// DELETE, or a soft delete stamping the soft-delete column, over the predicates
pub(crate) fn delete(
    schema: &EntitySchema,
    fields: Arc<FieldSet>,
    predicates: &[Predicate],
    unscoped: bool,
) -> Result<Statement, DaoError> {
    let mut generator = SqlGenerator::new(schema.table, fields)?;
    let mut clauses = Vec::new();
    if let Some(clause) = generator.conjunction(predicates)? {
        clauses.push(clause);
    }

    let sql = match (unscoped, schema.soft_delete_column()) {
        (false, Some(column)) => {
            clauses.push(format!("{} IS NULL", generator.column(column)?));
            format!(
                "UPDATE {} SET {} = NOW() {}",
                generator.table(),
                quote_ident(column)?,
                where_clause(&clauses)
            )
        }
        _ => format!("DELETE FROM {} {}", generator.table(), where_clause(&clauses)),
    };
    Ok(generator.into_statement(sql.trim_end().to_string()))
}

pub(crate) fn key_clause(
    generator: &mut SqlGenerator,
    schema: &EntitySchema,
    key: Value,
) -> Result<String, DaoError> {
    generator.predicate(&Predicate::eq(schema.primary_key_column(), key))
}

/// Expand the first `?` of a raw clause into a tuple list bound as parameters
///
/// `(id, name) IN ?` with `[[1, "a"], [2, "b"]]` becomes
/// `(id, name) IN (($1::BIGINT, $2::TEXT), ($3::BIGINT, $4::TEXT))`: each
/// position is cast to the type of the column named before `IN`. Unknown
/// columns bind untyped. No groups become `(NULL)`, which matches nothing.
pub(crate) fn expand_in_clause(
    generator: &mut SqlGenerator,
    clause: &str,
    groups: &[Vec<Value>],
) -> Result<String, DaoError> {
    let Some((head, tail)) = clause.split_once('?') else {
        if groups.is_empty() {
            return Ok(clause.to_string());
        }
        return Err(DaoError::invalid_option(format!(
            "raw clause {:?} has no placeholder for its IN values",
            clause
        )));
    };

    let types: Vec<Option<&'static str>> = in_columns(head)
        .iter()
        .map(|column| generator.sql_type_of(column))
        .collect();

    let tuples = if groups.is_empty() {
        "NULL".to_string()
    } else {
        groups
            .iter()
            .map(|group| {
                let params: Vec<String> = group
                    .iter()
                    .enumerate()
                    .map(|(i, value)| {
                        let sql_type = types.get(i).copied().flatten();
                        generator.bind(value.clone(), sql_type)
                    })
                    .collect();
                format!("({})", params.join(", "))
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    Ok(format!("{}({}){}", head, tuples, tail))
}

/// Column names on the left of a trailing `IN` / `NOT IN`, unquoted
///
/// `a = 1 AND (x, "y") NOT IN ` gives `["x", "y"]`; `id IN ` gives `["id"]`.
fn in_columns(head: &str) -> Vec<String> {
    let Some(rest) = strip_keyword(head.trim_end(), "IN") else {
        return Vec::new();
    };
    let rest = strip_keyword(rest.trim_end(), "NOT").unwrap_or(rest).trim_end();

    let list = match rest.strip_suffix(')') {
        Some(inner) => match inner.rfind('(') {
            Some(open) => &inner[open + 1..],
            None => return Vec::new(),
        },
        None => rest
            .rsplit(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or_default(),
    };

    list.split(',')
        .map(|column| column.trim().replace('"', ""))
        .collect()
}

/// `text` without a trailing keyword that stands as its own word
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let split = text.len().checked_sub(keyword.len())?;
    if !text.is_char_boundary(split) || !text[split..].eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &text[..split];
    match rest.chars().last() {
        Some(c) if c.is_whitespace() || c == ')' => Some(rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_columns_from_clause_head() {
        assert_eq!(in_columns("(id, name) IN "), vec!["id", "name"]);
        assert_eq!(in_columns("age > 3 AND \"users\".id not in "), vec!["users.id"]);
        assert_eq!(in_columns("id IN "), vec!["id"]);
        assert!(in_columns("id = ").is_empty());
        assert!(in_columns("margin ").is_empty());
    }
}
