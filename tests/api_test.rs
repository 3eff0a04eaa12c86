//! Request checks and response envelopes

use generic_dao::prelude::*;
use serde_json::json;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(table = "tags", validator = check_tag)]
pub struct Tag {
    #[primary_key]
    pub id: Option<uuid::Uuid>,

    #[column]
    #[unique]
    pub label: Option<String>,

    #[column]
    pub weight: Option<i32>,
}

fn check_tag(tag: &Tag) -> Result<(), DaoError> {
    match &tag.label {
        Some(label) if label.trim().is_empty() => {
            Err(DaoError::Validation("label cannot be blank".to_string()))
        }
        _ => Ok(()),
    }
}

#[test]
fn test_save_request_runs_validator() {
    let request = SaveRequest::new(Tag {
        label: Some("rust".to_string()),
        ..Tag::default()
    });
    assert!(request.validate().is_ok());

    let request = SaveRequest::new(Tag {
        label: Some("  ".to_string()),
        ..Tag::default()
    });
    assert!(matches!(request.validate(), Err(DaoError::Validation(_))));
}

#[test]
fn test_delete_request_needs_a_condition() {
    let request = DeleteRequest::new(Tag::default());
    assert!(matches!(
        request.validate(),
        Err(DaoError::UnsafeDelete(ref table)) if table == "tags"
    ));

    // Zero is a legitimate value, not an absent one
    let request = DeleteRequest::new(Tag {
        weight: Some(0),
        ..Tag::default()
    });
    assert!(request.validate().is_ok());

    let request = DeleteRequest::new(Tag {
        id: Some(uuid::Uuid::new_v4()),
        ..Tag::default()
    });
    assert!(request.validate().is_ok());
}

#[test]
fn test_requests_deserialize_as_the_entity() {
    let request: SaveRequest<Tag> =
        serde_json::from_value(json!({"label": "db", "weight": 3})).unwrap();
    assert_eq!(request.entity.weight, Some(3));
    assert_eq!(request.into_inner().label.as_deref(), Some("db"));
}

#[test]
fn test_uuid_key_maps_to_uuid_column() {
    let schema = Tag::schema();
    let id = &schema.columns()[0];
    assert_eq!((id.name, id.sql_type), ("id", "UUID"));
    assert_eq!(schema.columns()[2].sql_type, "INTEGER");
}

#[tokio::test]
async fn test_raw_in_clause_casts_uuid_keys() {
    let session = generic_dao::dao_core::ScriptedSession::new();
    let dao = BaseDao::new(
        std::sync::Arc::new(session.clone()),
        std::sync::Arc::new(SchemaRegistry::new()),
        QueryConfig::default(),
    );

    let first = uuid::Uuid::new_v4();
    let second = uuid::Uuid::new_v4();
    let tags: Vec<Tag> = dao
        .list_with_raw_clause(
            &ExecContext::background(),
            "id IN ?",
            &[vec![json!(first)], vec![json!(second)]],
        )
        .await
        .unwrap();

    assert!(tags.is_empty());
    let statement = &session.statements()[0];
    assert!(statement.sql.ends_with("(id IN (($1::UUID), ($2::UUID)))"));
    assert_eq!(statement.params, vec![json!(first), json!(second)]);
}

#[test]
fn test_list_response_merge() {
    let mut first = ListResponse::new(2, vec![1, 2]);
    let mut second = ListResponse::new(3, vec![3]);
    second.msg = "page 2".to_string();

    first.merge(second);
    assert_eq!(first.total(), 5);
    assert_eq!(first.data.list, vec![1, 2, 3]);
    assert_eq!(first.msg, "page 2");
    assert_eq!(first.len(), 3);
}

#[test]
fn test_response_envelopes_serialize() {
    let item = ItemResponse::new(json!({"id": 1}));
    assert_eq!(
        serde_json::to_value(&item).unwrap(),
        json!({"msg": "", "data": {"id": 1}})
    );

    let list: ListResponse<i32> = ListResponse::default();
    assert!(list.is_empty());
    assert_eq!(
        serde_json::to_value(&list).unwrap(),
        json!({"msg": "", "data": {"total": 0, "list": []}})
    );
}
