//! Entity capabilities
//!
//! An entity exposes its key, its last-modified timestamp and its static
//! schema. The optional capabilities (unique index lookup, declared joins and
//! preloads, validation) have no-op defaults and are overridden by the type
//! that supports them, usually through `#[derive(Entity)]`.

use crate::errors::DaoError;
use crate::query::Predicate;
use crate::schema::{EntitySchema, FieldDecl};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// Bounds required of an entity's primary key type
pub trait EntityKey: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static {}

impl<T> EntityKey for T where T: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static {}

/// A persisted record type
///
/// Recommended usage:
/// ```ignore
/// use generic_dao::prelude::*;
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize, Entity)]
/// #[entity(table = "users")]
/// pub struct User {
///     #[primary_key]
///     pub id: Option<i64>,
///
///     #[column]
///     #[unique]
///     pub email: Option<String>,
///
///     #[column]
///     pub name: Option<String>,
///
///     #[soft_delete]
///     pub deleted_at: Option<DateTime<Utc>>,
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Debug + Send + Sync + 'static {
    type Key: EntityKey;

    /// Static declaration of the entity's table, columns and associations
    fn schema() -> EntitySchema;

    /// The primary key, `None` while the store has not assigned one
    fn key(&self) -> Option<Self::Key>;

    fn set_key(&mut self, key: Self::Key);

    fn updated_at(&self) -> Option<DateTime<Utc>>;

    /// Predicates locating this entity by a secondary unique key
    ///
    /// Used by Update/Save when the primary key is unset. `None` when the
    /// entity has no unique index or its unique fields are unset.
    fn unique_index(&self) -> Option<Vec<Predicate>> {
        None
    }

    /// Associations joined into every List/Get of this entity
    fn relations() -> Vec<&'static str> {
        Vec::new()
    }

    /// Associations preloaded on every List/Get of this entity
    fn preloads() -> Vec<&'static str> {
        Vec::new()
    }

    fn validate(&self) -> Result<(), DaoError> {
        Ok(())
    }
}

/// A flattened sub-structure contributing columns to the entity embedding it
pub trait Embeddable {
    fn fields() -> Vec<FieldDecl>;
}

/// Timestamp-like member types usable as an `#[updated_at]` field
pub trait AsTimestamp {
    fn as_timestamp(&self) -> Option<DateTime<Utc>>;
}

impl AsTimestamp for DateTime<Utc> {
    fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        Some(*self)
    }
}

impl<T: AsTimestamp> AsTimestamp for Option<T> {
    fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        self.as_ref().and_then(AsTimestamp::as_timestamp)
    }
}
