//! Request and response shapes for a transport layer built on the engine
//!
//! Requests wrap an entity and check it before it reaches the engine;
//! responses are the `{msg, data}` envelopes returned to clients.

use dao_core::query::predicates_of;
use dao_core::{DaoError, Entity};
use serde::{Deserialize, Serialize};

/// A create/save payload, checked through the entity's validator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveRequest<E> {
    pub entity: E,
}

impl<E: Entity> SaveRequest<E> {
    pub fn new(entity: E) -> Self {
        Self { entity }
    }

    pub fn validate(&self) -> Result<(), DaoError> {
        self.entity.validate()
    }

    pub fn into_inner(self) -> E {
        self.entity
    }
}

/// A delete payload; deleting without any condition is refused
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeleteRequest<E> {
    pub entity: E,
}

impl<E: Entity> DeleteRequest<E> {
    pub fn new(entity: E) -> Self {
        Self { entity }
    }

    pub fn validate(&self) -> Result<(), DaoError> {
        if self.entity.key().is_some() || !predicates_of(&self.entity)?.is_empty() {
            return Ok(());
        }
        Err(DaoError::UnsafeDelete(E::schema().table.to_string()))
    }

    pub fn into_inner(self) -> E {
        self.entity
    }
}

/// Single-item envelope (Get, Create, Update, Save)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResponse<T> {
    pub msg: String,
    pub data: T,
}

impl<T> ItemResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            msg: String::new(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListData<T> {
    pub total: i64,
    pub list: Vec<T>,
}

impl<T> Default for ListData<T> {
    fn default() -> Self {
        Self {
            total: 0,
            list: Vec::new(),
        }
    }
}

/// Paged list envelope: `{"msg": .., "data": {"total": .., "list": [..]}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub msg: String,
    pub data: ListData<T>,
}

impl<T> Default for ListResponse<T> {
    fn default() -> Self {
        Self {
            msg: String::new(),
            data: ListData::default(),
        }
    }
}

impl<T> ListResponse<T> {
    pub fn new(total: i64, list: Vec<T>) -> Self {
        Self {
            msg: String::new(),
            data: ListData { total, list },
        }
    }

    /// Fold another page in: totals add up, lists concatenate, the message is the other's
    pub fn merge(&mut self, other: ListResponse<T>) {
        self.msg = other.msg;
        self.data.total += other.data.total;
        self.data.list.extend(other.data.list);
    }

    pub fn total(&self) -> i64 {
        self.data.total
    }

    pub fn len(&self) -> usize {
        self.data.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.list.is_empty()
    }
}
