//! Code generation for `Entity` and `Embeddable` implementations

use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

use crate::parsing::{option_inner, ColumnInfo, EntityInfo, Kind, Member, Role};

fn role_tokens(role: Role) -> TokenStream {
    match role {
        Role::Plain => quote! { dao_core::ColumnRole::Plain },
        Role::PrimaryKey => quote! { dao_core::ColumnRole::PrimaryKey },
        Role::CreatedAt => quote! { dao_core::ColumnRole::CreatedAt },
        Role::UpdatedAt => quote! { dao_core::ColumnRole::UpdatedAt },
        Role::SoftDelete => quote! { dao_core::ColumnRole::SoftDelete },
    }
}

/// `FieldDecl` expressions for columns and embedded members, in field order
fn field_decls(members: &[Member]) -> Vec<TokenStream> {
    members
        .iter()
        .filter_map(|member| match member {
            Member::Column(column) => {
                let name = &column.name;
                let sql_type = &column.sql_type;
                let role = role_tokens(column.role);
                Some(quote! {
                    dao_core::FieldDecl::Column(
                        dao_core::ColumnDef::new(#name, #sql_type).with_role(#role)
                    )
                })
            }
            Member::Embedded { field, ty } => {
                let member = field.to_string();
                Some(quote! {
                    dao_core::FieldDecl::Embedded {
                        member: #member,
                        fields: <#ty as dao_core::Embeddable>::fields,
                    }
                })
            }
            Member::Association(_) => None,
        })
        .collect()
}

fn association_decls(members: &[Member]) -> Vec<TokenStream> {
    members
        .iter()
        .filter_map(Member::as_association)
        .map(|association| {
            let name = association.field.to_string();
            let foreign_key = &association.foreign_key;
            let target = &association.target;
            let kind = match association.kind {
                Kind::BelongsTo => quote! { dao_core::AssociationKind::BelongsTo },
                Kind::HasOne => quote! { dao_core::AssociationKind::HasOne },
                Kind::HasMany => quote! { dao_core::AssociationKind::HasMany },
            };
            let references = association
                .references
                .as_ref()
                .map(|column| quote! { .references(#column) });
            quote! {
                dao_core::Association::new(
                    #name,
                    #kind,
                    #foreign_key,
                    <#target as dao_core::Entity>::schema,
                )#references
            }
        })
        .collect()
}

/// Key type and accessors; `Option<T>` keys are unset when `None`,
/// plain keys when equal to their default
fn key_impl(primary_key: &ColumnInfo) -> TokenStream {
    let field = &primary_key.field;
    match option_inner(&primary_key.ty) {
        Some(inner) => quote! {
            type Key = #inner;

            fn key(&self) -> Option<Self::Key> {
                self.#field.clone()
            }

            fn set_key(&mut self, key: Self::Key) {
                self.#field = Some(key);
            }
        },
        None => {
            let ty = &primary_key.ty;
            quote! {
                type Key = #ty;

                fn key(&self) -> Option<Self::Key> {
                    if self.#field == <#ty as ::core::default::Default>::default() {
                        None
                    } else {
                        Some(self.#field.clone())
                    }
                }

                fn set_key(&mut self, key: Self::Key) {
                    self.#field = key;
                }
            }
        }
    }
}

/// Predicates over every `#[unique]` column; `None` while any of them is null
fn unique_index_impl(columns: &[&ColumnInfo]) -> Option<TokenStream> {
    if columns.is_empty() {
        return None;
    }
    let lookups = columns.iter().map(|column| {
        let field = &column.field;
        let name = &column.name;
        quote! {
            match dao_core::serde_json::to_value(&self.#field) {
                Ok(value) if !value.is_null() => {
                    predicates.push(dao_core::Predicate::eq(#name, value));
                }
                _ => return None,
            }
        }
    });
    Some(quote! {
        fn unique_index(&self) -> Option<Vec<dao_core::Predicate>> {
            let mut predicates = Vec::new();
            #(#lookups)*
            Some(predicates)
        }
    })
}

pub fn generate_entity_impl(name: &Ident, info: &EntityInfo, members: &[Member]) -> TokenStream {
    let type_name = name.to_string();
    let table = &info.table;
    let fields = field_decls(members);
    let associations = association_decls(members);

    let columns: Vec<&ColumnInfo> = members.iter().filter_map(Member::as_column).collect();
    // Presence of exactly one primary key is checked during parsing
    let key = columns
        .iter()
        .find(|c| c.role == Role::PrimaryKey)
        .map(|c| key_impl(c));

    let updated_at = match columns.iter().find(|c| c.role == Role::UpdatedAt) {
        Some(column) => {
            let field = &column.field;
            quote! { dao_core::AsTimestamp::as_timestamp(&self.#field) }
        }
        None => quote! { None },
    };

    let unique: Vec<&ColumnInfo> = columns.iter().copied().filter(|c| c.unique).collect();
    let unique_index = unique_index_impl(&unique);

    let relations = info.joins.iter().map(|ident| ident.to_string());
    let preloads = info.preloads.iter().map(|ident| ident.to_string());
    let validate = info.validator.as_ref().map(|validator| {
        quote! {
            fn validate(&self) -> Result<(), dao_core::DaoError> {
                #validator(self)
            }
        }
    });

    quote! {
        impl dao_core::Entity for #name {
            #key

            fn schema() -> dao_core::EntitySchema {
                dao_core::EntitySchema::new(#type_name, #table)
                    #(.field(#fields))*
                    #(.association(#associations))*
            }

            fn updated_at(&self) -> Option<dao_core::chrono::DateTime<dao_core::chrono::Utc>> {
                #updated_at
            }

            #unique_index

            fn relations() -> Vec<&'static str> {
                vec![#(#relations),*]
            }

            fn preloads() -> Vec<&'static str> {
                vec![#(#preloads),*]
            }

            #validate
        }
    }
}

pub fn generate_embeddable_impl(name: &Ident, members: &[Member]) -> TokenStream {
    let fields = field_decls(members);
    quote! {
        impl dao_core::Embeddable for #name {
            fn fields() -> Vec<dao_core::FieldDecl> {
                vec![#(#fields),*]
            }
        }
    }
}
