//! End-to-end checks of `#[derive(Entity)]` against the access engine
//!
//! The scripted session stands in for PostgreSQL: it records the generated
//! statements and answers with queued rows.

use generic_dao::prelude::*;
use generic_dao::dao_core::ScriptedSession;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Embeddable)]
pub struct Audit {
    #[column]
    pub created_by: Option<String>,
}

fn check_account(account: &Account) -> Result<(), DaoError> {
    match &account.email {
        Some(email) if !email.contains('@') => {
            Err(DaoError::Validation(format!("invalid email {}", email)))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(table = "accounts", preloads(orders), validator = check_account)]
pub struct Account {
    #[primary_key]
    pub id: Option<i64>,

    #[column]
    #[unique]
    pub email: Option<String>,

    #[column]
    pub active: Option<bool>,

    #[column(sql_type = "JSONB")]
    pub settings: Option<serde_json::Value>,

    #[serde(flatten)]
    #[embedded]
    pub audit: Audit,

    #[created_at]
    pub created_at: Option<DateTime<Utc>>,

    #[updated_at]
    pub updated_at: Option<DateTime<Utc>>,

    #[soft_delete]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(default)]
    #[association(has_many, target = Order, foreign_key = "account_id")]
    pub orders: Vec<Order>,

    #[serde(skip)]
    pub scratch: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(table = "orders", joins(account))]
pub struct Order {
    #[primary_key]
    pub id: i64,

    #[column]
    pub account_id: Option<i64>,

    #[column]
    pub total_cents: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[association(belongs_to, target = Account, foreign_key = "account_id")]
    pub account: Option<Box<Account>>,
}

fn dao_with(session: &ScriptedSession) -> BaseDao {
    BaseDao::new(
        Arc::new(session.clone()),
        Arc::new(SchemaRegistry::new()),
        QueryConfig::default(),
    )
}

#[test]
fn test_derived_schema() {
    let schema = Account::schema();
    assert_eq!(schema.type_name, "Account");
    assert_eq!(schema.table, "accounts");
    assert_eq!(schema.primary_key_column(), "id");
    assert_eq!(schema.soft_delete_column(), Some("deleted_at"));

    let columns: Vec<_> = schema
        .columns()
        .into_iter()
        .map(|c| (c.name, c.sql_type))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("id", "BIGINT"),
            ("email", "TEXT"),
            ("active", "BOOLEAN"),
            ("settings", "JSONB"),
            ("created_by", "TEXT"),
            ("created_at", "TIMESTAMPTZ"),
            ("updated_at", "TIMESTAMPTZ"),
            ("deleted_at", "TIMESTAMPTZ"),
        ]
    );

    let orders = schema.find_association("orders").unwrap();
    assert_eq!(orders.kind, AssociationKind::HasMany);
    assert_eq!(orders.target_column(), "account_id");
    assert_eq!(Account::preloads(), vec!["orders"]);
    assert_eq!(Order::relations(), vec!["account"]);
}

#[test]
fn test_derived_capabilities() {
    let mut account = Account::default();
    assert_eq!(account.key(), None);
    assert!(account.unique_index().is_none());

    account.set_key(4);
    account.email = Some("ops@example.com".to_string());
    assert_eq!(account.key(), Some(4));
    assert_eq!(
        account.unique_index(),
        Some(vec![Predicate::eq("email", "ops@example.com")])
    );

    account.email = Some("nope".to_string());
    assert!(matches!(account.validate(), Err(DaoError::Validation(_))));

    let mut order = Order::default();
    assert_eq!(order.key(), None);
    order.set_key(12);
    assert_eq!(order.key(), Some(12));
    assert!(order.updated_at().is_none());
}

#[test]
fn test_registry_validates_against_derived_columns() {
    let registry = SchemaRegistry::new();
    registry.register::<Account>();

    let spec = QuerySpec::<Account>::new()
        .sort_by("created_at", true)
        .search("ops", "email, audit.created_by");
    assert!(spec.validate(&registry).is_ok());

    let spec = QuerySpec::<Account>::new().sort_by("scratch", false);
    assert!(matches!(
        spec.validate(&registry),
        Err(DaoError::InvalidQueryOption(_))
    ));
}

#[tokio::test]
async fn test_list_preloads_declared_association() {
    let session = ScriptedSession::new();
    session.push_rows(vec![json!({"id": 1, "email": "a@example.com", "active": true})]);
    session.push_rows(vec![json!({"id": 30, "account_id": 1, "total_cents": 1200})]);
    let dao = dao_with(&session);

    let spec = QuerySpec::<Account>::new().filter_by(Predicate::eq("active", true));
    let accounts = dao
        .list(&ExecContext::background(), &spec, &[])
        .await
        .unwrap();

    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].orders[0].total_cents, Some(1200));
    let statements = session.statements();
    assert_eq!(
        statements[0].sql,
        "SELECT to_jsonb(\"accounts\".*) AS row FROM \"accounts\" \
         WHERE \"accounts\".\"deleted_at\" IS NULL AND \"accounts\".\"active\" = $1::BOOLEAN"
    );
    assert!(statements[1].sql.contains("\"orders\".\"account_id\" IN ($1::BIGINT)"));
}

#[tokio::test]
async fn test_save_by_unique_email_upserts_children() {
    let session = ScriptedSession::new();
    session.push_rows(vec![json!({"id": 8})]);
    session.push_rows(vec![json!({"id": 8, "email": "a@example.com"})]);
    session.push_rows(vec![json!({"id": 31, "account_id": 8, "total_cents": 500})]);
    let dao = dao_with(&session);

    let mut account = Account {
        email: Some("a@example.com".to_string()),
        orders: vec![Order {
            total_cents: Some(500),
            ..Order::default()
        }],
        ..Account::default()
    };
    dao.save(&ExecContext::background(), &mut account, &[])
        .await
        .unwrap();

    assert_eq!(account.id, Some(8));
    assert_eq!(account.orders[0].id, 31);

    let statements = session.statements();
    assert_eq!(statements.len(), 3);
    assert!(statements[1].sql.contains("ON CONFLICT (\"id\") DO UPDATE SET"));
    // The default order key is not written
    assert_eq!(
        statements[2].sql,
        "INSERT INTO \"orders\" (\"account_id\", \"total_cents\") VALUES ($1::BIGINT, $2::BIGINT) \
         RETURNING to_jsonb(\"orders\".*) AS row"
    );
}

#[tokio::test]
async fn test_get_with_plain_key_joins_owner() {
    let session = ScriptedSession::new();
    session.push_rows(vec![json!({
        "id": 5, "account_id": 1, "total_cents": 900,
        "account": {"id": 1, "email": "a@example.com"}
    })]);
    let dao = dao_with(&session);

    let mut order = Order {
        id: 5,
        ..Order::default()
    };
    dao.get(&ExecContext::background(), &mut order, &[])
        .await
        .unwrap();

    assert_eq!(order.total_cents, Some(900));
    assert_eq!(
        order.account.as_ref().and_then(|a| a.email.as_deref()),
        Some("a@example.com")
    );
    assert!(session.sql()[0].contains(
        "LEFT JOIN \"accounts\" AS \"account\" ON \"account\".\"id\" = \"orders\".\"account_id\" \
         AND \"account\".\"deleted_at\" IS NULL"
    ));
}

#[tokio::test]
async fn test_delete_template_with_default_key() {
    let session = ScriptedSession::new();
    session.push_affected(2);
    let dao = dao_with(&session);

    let order = Order {
        account_id: Some(1),
        ..Order::default()
    };
    let affected = dao
        .delete(&ExecContext::background(), &order, &[])
        .await
        .unwrap();

    assert_eq!(affected, 2);
    assert_eq!(
        session.sql()[0],
        "DELETE FROM \"orders\" WHERE \"orders\".\"account_id\" = $1::BIGINT"
    );

    let err = dao
        .delete(&ExecContext::background(), &Order::default(), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DaoError::UnsafeDelete(_)));
}

#[tokio::test]
async fn test_update_writes_only_set_columns() {
    let session = ScriptedSession::new();
    session.push_rows(vec![json!({"id": 2, "email": "a@example.com", "active": false})]);
    let dao = dao_with(&session);

    let mut account = Account {
        id: Some(2),
        active: Some(false),
        settings: Some(json!("dark")),
        ..Account::default()
    };
    dao.update(&ExecContext::background(), &mut account, &[])
        .await
        .unwrap();

    let statement = &session.statements()[0];
    assert_eq!(
        statement.sql,
        "UPDATE \"accounts\" SET \"active\" = $1::BOOLEAN, \"settings\" = $2::JSONB, \
         \"updated_at\" = NOW() WHERE \"accounts\".\"id\" = $3::BIGINT \
         AND \"accounts\".\"deleted_at\" IS NULL RETURNING to_jsonb(\"accounts\".*) AS row"
    );
    assert_eq!(
        statement.params,
        vec![json!(false), json!("\"dark\""), json!(2)]
    );
    assert_eq!(account.email.as_deref(), Some("a@example.com"));

    let err = dao
        .delete(&ExecContext::background(), &Account::default(), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DaoError::UnsafeDelete(_)));
    assert_eq!(session.statements().len(), 1);
}

#[tokio::test]
async fn test_transaction_bound_engine() {
    let session = ScriptedSession::new();
    session.push_rows(vec![json!({"id": 1, "email": "a@example.com"})]);
    let dao = dao_with(&session);

    let tx = dao.begin().await.unwrap();
    let mut account = Account {
        email: Some("a@example.com".to_string()),
        ..Account::default()
    };
    dao.with_transaction(&tx)
        .create(&ExecContext::background(), &mut account, &[modifier::omit_associations()])
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(account.id, Some(1));
    assert_eq!(session.events(), vec!["BEGIN", "ROLLBACK"]);
}
