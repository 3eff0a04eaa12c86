//! SQL fragment generation
//!
//! Every identifier is validated and double-quoted, every value becomes a
//! positional parameter cast to the column's declared type.

use super::filter::Filter;
use super::ordering::Sorting;
use super::predicate::{Condition, LogicalOperator, Predicate, QueryOperator};
use crate::errors::DaoError;
use crate::schema::FieldSet;
use crate::session::Statement;
use crate::validation::{ValidatedFieldName, ValidatedTableName};
use serde_json::Value;
use std::sync::Arc;
use type_mapping::{cast_suffix, normalize_bind_value};

/// Accumulates parameters while rendering clauses for one statement
#[derive(Debug)]
pub struct SqlGenerator {
    table: ValidatedTableName,
    fields: Arc<FieldSet>,
    aliases: Vec<(String, Arc<FieldSet>)>,
    params: Vec<Value>,
}

impl SqlGenerator {
    pub fn new(table: &str, fields: Arc<FieldSet>) -> Result<Self, DaoError> {
        Ok(Self {
            table: ValidatedTableName::new(table)?,
            fields,
            aliases: Vec::new(),
            params: Vec::new(),
        })
    }

    /// Make `alias.column` references resolve their types from `fields`
    pub fn with_alias(&mut self, alias: &str, fields: Arc<FieldSet>) {
        self.aliases.push((alias.to_string(), fields));
    }

    pub fn table_name(&self) -> &str {
        self.table.as_str()
    }

    /// The quoted root table, e.g. `"users"`
    pub fn table(&self) -> String {
        self.table.quoted()
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// A column reference qualified with the root table unless it names a relation
    pub fn column(&self, name: &str) -> Result<String, DaoError> {
        Ok(ValidatedFieldName::new(name)?.qualified(self.table.as_str()))
    }

    /// Bind a value cast to the type of `column`, when that type is known
    pub fn bind_for(&mut self, column: &str, value: Value) -> Result<String, DaoError> {
        let field = ValidatedFieldName::new(column)?;
        let sql_type = self.column_type(&field);
        Ok(self.bind(value, sql_type))
    }

    /// Declared type of a (possibly qualified) column; `None` when unknown
    pub fn sql_type_of(&self, column: &str) -> Option<&'static str> {
        ValidatedFieldName::new(column)
            .ok()
            .and_then(|field| self.column_type(&field))
    }

    /// Push a parameter and return its placeholder, with a `::TYPE` cast if given
    pub fn bind(&mut self, value: Value, sql_type: Option<&str>) -> String {
        self.params.push(normalize_bind_value(value, sql_type));
        let placeholder = format!("${}", self.params.len());
        match sql_type {
            Some(ty) => placeholder + &cast_suffix(ty),
            None => placeholder,
        }
    }

    /// Render a predicate tree
    pub fn predicate(&mut self, predicate: &Predicate) -> Result<String, DaoError> {
        match predicate {
            Predicate::Condition(condition) => self.condition(condition),
            Predicate::Group {
                operator,
                predicates,
            } => {
                let (operator_str, empty) = match operator {
                    LogicalOperator::And => (" AND ", "TRUE"),
                    LogicalOperator::Or => (" OR ", "FALSE"),
                };
                if predicates.is_empty() {
                    return Ok(empty.to_string());
                }

                let parts = predicates
                    .iter()
                    .map(|p| self.predicate(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("({})", parts.join(operator_str)))
            }
        }
    }

    /// ANDed predicates, or `None` when there are none
    pub fn conjunction(&mut self, predicates: &[Predicate]) -> Result<Option<String>, DaoError> {
        if predicates.is_empty() {
            return Ok(None);
        }
        let parts = predicates
            .iter()
            .map(|p| self.predicate(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(parts.join(" AND ")))
    }

    /// `NOT (...)` over the ANDed predicates, or `None` when there are none
    pub fn negation(&mut self, predicates: &[Predicate]) -> Result<Option<String>, DaoError> {
        Ok(self
            .conjunction(predicates)?
            .map(|clause| format!("NOT ({})", clause)))
    }

    /// Substring match of `filter.filters` on any of `filter.fields`
    pub fn text_filter(&mut self, filter: &Filter) -> Result<Option<String>, DaoError> {
        if !filter.is_active() {
            return Ok(None);
        }

        let columns = filter
            .columns()
            .into_iter()
            .map(|field| self.column(field))
            .collect::<Result<Vec<_>, _>>()?;
        let param = self.bind(Value::String(filter.pattern()), Some("TEXT"));

        let clauses: Vec<String> = columns
            .iter()
            .map(|column| format!("{}::text LIKE {}", column, param))
            .collect();
        Ok(Some(format!("({})", clauses.join(" OR "))))
    }

    /// `ORDER BY` for the caller's sorting, empty when unsorted
    pub fn order_clause(&self, sorting: &Sorting) -> Result<String, DaoError> {
        if !sorting.is_active() {
            return Ok(String::new());
        }
        let column = self.column(sorting.sort_by.trim())?;
        Ok(format!("ORDER BY {} {}", column, sorting.order().to_sql()))
    }

    pub fn into_statement(self, sql: String) -> Statement {
        Statement::new(sql, self.params)
    }

    fn column_type(&self, field: &ValidatedFieldName) -> Option<&'static str> {
        match field.qualifier() {
            None => self.fields.sql_type(field.column()),
            Some(qualifier) if qualifier == self.table.as_str() => {
                self.fields.sql_type(field.column())
            }
            Some(qualifier) => self
                .aliases
                .iter()
                .find(|(alias, _)| alias == qualifier)
                .and_then(|(_, fields)| fields.sql_type(field.column())),
        }
    }

    fn condition(&mut self, condition: &Condition) -> Result<String, DaoError> {
        let field = ValidatedFieldName::new(&condition.field)?;
        let column = field.qualified(self.table.as_str());
        let sql_type = self.column_type(&field);

        let sql = match (&condition.operator, &condition.value) {
            (QueryOperator::Eq, None | Some(Value::Null)) => format!("{} IS NULL", column),
            (QueryOperator::Ne, None | Some(Value::Null)) => format!("{} IS NOT NULL", column),
            (QueryOperator::IsNull, _) => format!("{} IS NULL", column),
            (QueryOperator::IsNotNull, _) => format!("{} IS NOT NULL", column),
            (QueryOperator::Like, Some(value)) => {
                let param = self.bind(value.clone(), Some("TEXT"));
                format!("{}::text LIKE {}", column, param)
            }
            (QueryOperator::ILike, Some(value)) => {
                let param = self.bind(value.clone(), Some("TEXT"));
                format!("{}::text ILIKE {}", column, param)
            }
            (QueryOperator::In, Some(Value::Array(values))) => {
                if values.is_empty() {
                    return Ok("1=0".to_string()); // Empty IN clause
                }
                let placeholders = self.bind_list(values, sql_type);
                format!("{} IN ({})", column, placeholders)
            }
            (QueryOperator::NotIn, Some(Value::Array(values))) => {
                if values.is_empty() {
                    return Ok("1=1".to_string()); // Empty NOT IN clause
                }
                let placeholders = self.bind_list(values, sql_type);
                format!("{} NOT IN ({})", column, placeholders)
            }
            (QueryOperator::NotIn, _) => "1=1".to_string(),
            (operator, Some(value)) => {
                let symbol = match operator {
                    QueryOperator::Eq => "=",
                    QueryOperator::Ne => "!=",
                    QueryOperator::Gt => ">",
                    QueryOperator::Gte => ">=",
                    QueryOperator::Lt => "<",
                    QueryOperator::Lte => "<=",
                    _ => return Ok("1=0".to_string()),
                };
                let param = self.bind(value.clone(), sql_type);
                format!("{} {} {}", column, symbol, param)
            }
            (_, None) => "1=0".to_string(), // Comparison without a value
        };
        Ok(sql)
    }

    fn bind_list(&mut self, values: &[Value], sql_type: Option<&str>) -> String {
        values
            .iter()
            .map(|value| self.bind(value.clone(), sql_type))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// `WHERE a AND b`, empty when there are no clauses
pub fn where_clause(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    }
}
