//! Procedural macros declaring entity schemas for the generic DAO
//!
//! `#[derive(Entity)]` turns field attributes into the static
//! `EntitySchema` and capability hooks of `dao_core::Entity`;
//! `#[derive(Embeddable)]` does the same for flattened sub-structures.
//! Generated code refers to `dao_core::...`, so the deriving crate needs
//! `dao_core` in scope (the `generic_dao` prelude re-exports it).

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod codegen;
mod parsing;

use codegen::{generate_embeddable_impl, generate_entity_impl};
use parsing::{parse_entity_attributes, parse_members, validate_entity};

/// Derive macro for the `Entity` trait
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Default, Serialize, Deserialize, Entity)]
/// #[entity(table = "posts", joins(author), validator = check_post)]
/// pub struct Post {
///     #[primary_key]
///     pub id: Option<i64>,
///
///     #[column]
///     #[unique]
///     pub slug: Option<String>,
///
///     #[column(sql_type = "JSONB")]
///     pub meta: Option<serde_json::Value>,
///
///     #[serde(flatten)]
///     #[embedded]
///     pub audit: Audit,
///
///     #[created_at]
///     pub created_at: Option<DateTime<Utc>>,
///
///     #[updated_at]
///     pub updated_at: Option<DateTime<Utc>>,
///
///     #[soft_delete]
///     pub deleted_at: Option<DateTime<Utc>>,
///
///     #[serde(default, skip_serializing_if = "Option::is_none")]
///     #[association(belongs_to, target = User, foreign_key = "author_id")]
///     pub author: Option<Box<User>>,
/// }
/// ```
///
/// Only annotated fields are persisted. Column names default to the field
/// name; a renamed column (`#[column(name = "..")]`) must carry the matching
/// `#[serde(rename = "..")]`.
#[proc_macro_derive(
    Entity,
    attributes(
        entity,
        primary_key,
        column,
        embedded,
        unique,
        created_at,
        updated_at,
        soft_delete,
        association
    )
)]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let entity_info = match parse_entity_attributes(&input) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    let members = match parse_members(&input.data, true) {
        Ok(members) => members,
        Err(e) => return e.to_compile_error().into(),
    };

    if let Err(e) = validate_entity(&input.ident, &entity_info, &members) {
        return e.to_compile_error().into();
    }

    generate_entity_impl(&input.ident, &entity_info, &members).into()
}

/// Derive macro for the `Embeddable` trait
///
/// The embedding entity marks the member `#[embedded]` and
/// `#[serde(flatten)]`; its columns join the entity's own.
#[proc_macro_derive(
    Embeddable,
    attributes(column, unique, created_at, updated_at, soft_delete, embedded)
)]
pub fn derive_embeddable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let members = match parse_members(&input.data, false) {
        Ok(members) => members,
        Err(e) => return e.to_compile_error().into(),
    };

    generate_embeddable_impl(&input.ident, &members).into()
}
