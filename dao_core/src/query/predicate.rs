//! Explicit (field, operator, value) predicates
//!
//! A predicate tree replaces "non-zero template fields" as the description of
//! an equality or exclusion filter. Entity templates are still supported
//! through [`predicates_of`], where an unset (`None`) column is absent.

use crate::codec;
use crate::errors::DaoError;
use crate::traits::Entity;
use serde_json::Value;

/// Query condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Eq,        // =
    Ne,        // !=
    Gt,        // >
    Gte,       // >=
    Lt,        // <
    Lte,       // <=
    Like,      // LIKE
    ILike,     // ILIKE (case insensitive)
    In,        // IN
    NotIn,     // NOT IN
    IsNull,    // IS NULL
    IsNotNull, // IS NOT NULL
}

/// Single condition in WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: QueryOperator,
    pub value: Option<Value>, // None for IS NULL/IS NOT NULL
}

/// Logical operators for combining conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Predicate tree that can be nested
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Condition(Condition),
    Group {
        operator: LogicalOperator,
        predicates: Vec<Predicate>,
    },
}

impl Predicate {
    /// Create a simple condition
    pub fn condition(field: &str, operator: QueryOperator, value: Option<Value>) -> Self {
        Self::Condition(Condition {
            field: field.to_string(),
            operator,
            value,
        })
    }

    /// Create AND group
    pub fn and(predicates: Vec<Predicate>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            predicates,
        }
    }

    /// Create OR group
    pub fn or(predicates: Vec<Predicate>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            predicates,
        }
    }

    /// Equal condition; a JSON `null` value matches NULL columns
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::Eq, Some(value.into()))
    }

    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::Ne, Some(value.into()))
    }

    pub fn gt(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::Gt, Some(value.into()))
    }

    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::Gte, Some(value.into()))
    }

    pub fn lt(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::Lt, Some(value.into()))
    }

    pub fn lte(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::Lte, Some(value.into()))
    }

    pub fn like(field: &str, pattern: &str) -> Self {
        Self::condition(
            field,
            QueryOperator::Like,
            Some(Value::String(pattern.to_string())),
        )
    }

    pub fn ilike(field: &str, pattern: &str) -> Self {
        Self::condition(
            field,
            QueryOperator::ILike,
            Some(Value::String(pattern.to_string())),
        )
    }

    pub fn in_values(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::In, Some(Value::Array(values)))
    }

    pub fn not_in_values(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::NotIn, Some(Value::Array(values)))
    }

    pub fn is_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNull, None)
    }

    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNotNull, None)
    }

    /// Equality predicates for every listed column whose value is present and not null
    pub fn from_fields<'a>(
        values: &serde_json::Map<String, Value>,
        columns: impl IntoIterator<Item = &'a str>,
    ) -> Vec<Predicate> {
        columns
            .into_iter()
            .filter_map(|column| match values.get(column) {
                Some(Value::Null) | None => None,
                Some(value) => Some(Self::eq(column, value.clone())),
            })
            .collect()
    }
}

/// Equality predicates built from an entity template's set columns
pub fn predicates_of<E: Entity>(entity: &E) -> Result<Vec<Predicate>, DaoError> {
    let row = codec::entity_row(entity)?;
    let columns = E::schema().columns();
    Ok(Predicate::from_fields(
        &row,
        columns.iter().map(|column| column.name),
    ))
}
