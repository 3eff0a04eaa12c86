//! Conversion between entities and store rows
//!
//! A row is a JSON object keyed by column name. Entities convert through
//! serde, so embedded members are flattened and associations nest as their
//! own keys.

use crate::errors::DaoError;
use crate::session::Row;
use crate::traits::Entity;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub fn to_row<T: Serialize + ?Sized>(entity: &T) -> Result<Row, DaoError> {
    match serde_json::to_value(entity)? {
        Value::Object(row) => Ok(row),
        other => Err(DaoError::marshal(format!(
            "entity must serialize to an object, got {}",
            kind_of(&other)
        ))),
    }
}

pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, DaoError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// The entity's row with an unset key written as null
///
/// Plain (non-`Option`) keys serialize their default value; it must not
/// reach predicates or INSERT column lists.
pub fn entity_row<E: Entity>(entity: &E) -> Result<Row, DaoError> {
    let mut row = to_row(entity)?;
    if entity.key().is_none() {
        row.insert(E::schema().primary_key_column().to_string(), Value::Null);
    }
    Ok(row)
}

/// Overlay `returned` onto the entity's current row and decode it back in place
///
/// Keys absent from `returned` (associations, unselected columns) keep the
/// entity's values.
pub fn merge_into<T: Serialize + DeserializeOwned>(
    entity: &mut T,
    returned: Row,
) -> Result<(), DaoError> {
    let mut row = to_row(entity)?;
    row.extend(returned);
    *entity = from_row(row)?;
    Ok(())
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Note {
        id: Option<i64>,
        body: Option<String>,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[test]
    fn test_merge_keeps_absent_keys() {
        let mut note = Note {
            id: None,
            body: Some("draft".into()),
            tags: vec!["a".into()],
        };
        let returned = json!({"id": 9, "body": "draft"});
        let Value::Object(returned) = returned else {
            unreachable!()
        };

        merge_into(&mut note, returned).unwrap();
        assert_eq!(note.id, Some(9));
        assert_eq!(note.tags, vec!["a".to_string()]);
    }

    #[test]
    fn test_non_object_is_marshal_error() {
        let err = to_row(&42).unwrap_err();
        assert!(matches!(err, DaoError::Marshal(_)));

        let row = json!({"id": "not a number"});
        let Value::Object(row) = row else { unreachable!() };
        assert!(matches!(from_row::<Note>(row), Err(DaoError::Marshal(_))));
    }
}
