//! Entities with hand-written capability impls, shared by unit tests

use crate::errors::DaoError;
use crate::query::Predicate;
use crate::schema::{Association, AssociationKind, ColumnDef, EntitySchema, FieldDecl};
use crate::traits::{Embeddable, Entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub created_by: Option<String>,
}

impl Embeddable for Audit {
    fn fields() -> Vec<FieldDecl> {
        vec![FieldDecl::Column(ColumnDef::new("created_by", "TEXT"))]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub age: Option<i64>,
    #[serde(flatten)]
    pub audit: Audit,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub posts: Vec<Post>,
}

impl Entity for User {
    type Key = i64;

    fn schema() -> EntitySchema {
        EntitySchema::new("User", "users")
            .primary_key("id", "BIGINT")
            .column("email", "TEXT")
            .column("name", "TEXT")
            .column("age", "BIGINT")
            .embedded("audit", Audit::fields)
            .timestamps()
            .soft_delete("deleted_at")
            .association(Association::new(
                "profile",
                AssociationKind::HasOne,
                "user_id",
                Profile::schema,
            ))
            .association(Association::new(
                "posts",
                AssociationKind::HasMany,
                "author_id",
                Post::schema,
            ))
    }

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = Some(key);
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn unique_index(&self) -> Option<Vec<Predicate>> {
        self.email
            .as_ref()
            .map(|email| vec![Predicate::eq("email", email.as_str())])
    }

    fn validate(&self) -> Result<(), DaoError> {
        match &self.email {
            Some(email) if !email.contains('@') => {
                Err(DaoError::Validation(format!("invalid email {:?}", email)))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub nickname: Option<String>,
}

impl Entity for Profile {
    type Key = i64;

    fn schema() -> EntitySchema {
        EntitySchema::new("Profile", "profiles")
            .primary_key("id", "BIGINT")
            .column("user_id", "BIGINT")
            .column("nickname", "TEXT")
    }

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = Some(key);
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Option<i64>,
    pub author_id: Option<i64>,
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Box<User>>,
}

impl Entity for Post {
    type Key = i64;

    fn schema() -> EntitySchema {
        EntitySchema::new("Post", "posts")
            .primary_key("id", "BIGINT")
            .column("author_id", "BIGINT")
            .column("title", "TEXT")
            .association(Association::new(
                "author",
                AssociationKind::BelongsTo,
                "author_id",
                User::schema,
            ))
    }

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = Some(key);
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn relations() -> Vec<&'static str> {
        vec!["author"]
    }
}
