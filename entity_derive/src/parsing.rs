//! Parsing of `#[entity]` and field attributes
//!
//! This module turns the attributes of a deriving struct into [`EntityInfo`]
//! and a list of [`Member`]s, and checks at compile time what the runtime
//! would otherwise reject (identifier shape, dangling join names).

use quote::quote;
use syn::{
    spanned::Spanned, Attribute, Data, DeriveInput, Error, Fields, GenericArgument, Ident, LitStr,
    Path, PathArguments, Result, Type,
};

/// PostgreSQL identifier length limit
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Same rules the runtime applies to identifiers in generated SQL
fn validate_identifier(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(format!(
            "Name '{}' is too long: {} characters (max {})",
            name,
            name.len(),
            MAX_IDENTIFIER_LENGTH
        ));
    }

    let first_char = name
        .chars()
        .next()
        .ok_or_else(|| "Name cannot be empty".to_string())?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(format!(
            "Name '{}' must start with a letter or underscore",
            name
        ));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("Name '{}' contains invalid characters: only alphanumeric characters and underscores are allowed", name));
    }

    Ok(())
}

fn is_reserved_keyword(name: &str) -> bool {
    const RESERVED_KEYWORDS: &[&str] = &[
        "ALL", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CAST", "CHECK", "COLUMN",
        "CONSTRAINT", "CREATE", "CROSS", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE",
        "END", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FOR", "FOREIGN", "FROM", "FULL", "GRANT",
        "GROUP", "HAVING", "IN", "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "LEFT",
        "LIKE", "LIMIT", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER", "PRIMARY",
        "REFERENCES", "RETURNING", "RIGHT", "SELECT", "TABLE", "THEN", "TO", "TRUE", "UNION",
        "UNIQUE", "UPDATE", "USER", "USING", "WHEN", "WHERE", "WITH",
    ];

    RESERVED_KEYWORDS.contains(&name.to_ascii_uppercase().as_str())
}

/// Validate table name and return syn::Error for proc macro error reporting
pub fn validate_table_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid table name '{}': {}", name, e)))?;
    if is_reserved_keyword(name) {
        return Err(Error::new(
            span,
            format!("Invalid table name '{}': reserved SQL keyword", name),
        ));
    }
    Ok(())
}

/// Column names are quoted in generated SQL, so keywords pass
pub fn validate_column_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid column name '{}': {}", name, e)))
}

#[derive(Debug)]
pub struct EntityInfo {
    pub table: String,
    pub joins: Vec<Ident>,
    pub preloads: Vec<Ident>,
    pub validator: Option<Path>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Plain,
    PrimaryKey,
    CreatedAt,
    UpdatedAt,
    SoftDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    BelongsTo,
    HasOne,
    HasMany,
}

#[derive(Debug)]
pub struct ColumnInfo {
    pub field: Ident,
    pub ty: Type,
    pub name: String,
    pub sql_type: String,
    pub role: Role,
    pub unique: bool,
}

#[derive(Debug)]
pub struct AssociationInfo {
    pub field: Ident,
    pub kind: Kind,
    pub target: Type,
    pub foreign_key: String,
    pub references: Option<String>,
}

#[derive(Debug)]
pub enum Member {
    Column(ColumnInfo),
    Embedded { field: Ident, ty: Type },
    Association(AssociationInfo),
}

impl Member {
    pub fn as_column(&self) -> Option<&ColumnInfo> {
        match self {
            Member::Column(column) => Some(column),
            _ => None,
        }
    }

    pub fn as_association(&self) -> Option<&AssociationInfo> {
        match self {
            Member::Association(association) => Some(association),
            _ => None,
        }
    }
}

pub fn parse_entity_attributes(input: &DeriveInput) -> Result<EntityInfo> {
    let mut table = None;
    let mut joins = Vec::new();
    let mut preloads = Vec::new();
    let mut validator = None;

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("entity")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                validate_table_name_syn(&value.value(), value.span())?;
                table = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("joins") {
                meta.parse_nested_meta(|inner| {
                    joins.push(path_ident(&inner.path)?);
                    Ok(())
                })
            } else if meta.path.is_ident("preloads") {
                meta.parse_nested_meta(|inner| {
                    preloads.push(path_ident(&inner.path)?);
                    Ok(())
                })
            } else if meta.path.is_ident("validator") {
                validator = Some(meta.value()?.parse::<Path>()?);
                Ok(())
            } else {
                Err(meta.error("unknown entity attribute; expected table, joins, preloads or validator"))
            }
        })?;
    }

    let table = table.ok_or_else(|| {
        Error::new(
            proc_macro2::Span::call_site(),
            "entity attribute is required: add #[entity(table = \"table_name\")] to your struct",
        )
    })?;

    Ok(EntityInfo {
        table,
        joins,
        preloads,
        validator,
    })
}

fn path_ident(path: &Path) -> Result<Ident> {
    path.get_ident()
        .cloned()
        .ok_or_else(|| Error::new(path.span(), "expected an association field name"))
}

/// Parse every annotated field; unannotated fields are not persisted
pub fn parse_members(data: &Data, allow_entity_members: bool) -> Result<Vec<Member>> {
    let Data::Struct(data_struct) = data else {
        return Err(Error::new(
            proc_macro2::Span::call_site(),
            "Entity can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(fields_named) = &data_struct.fields else {
        return Err(Error::new(
            proc_macro2::Span::call_site(),
            "Entity can only be derived for structs with named fields",
        ));
    };

    let mut members = Vec::new();
    for field in &fields_named.named {
        let field_name = field
            .ident
            .clone()
            .ok_or_else(|| Error::new_spanned(field, "Field must have a name"))?;

        if has_attribute(&field.attrs, "association") {
            if !allow_entity_members {
                return Err(Error::new(
                    field_name.span(),
                    "associations are declared on the entity, not on an embedded struct",
                ));
            }
            members.push(Member::Association(parse_association(field_name, &field.attrs)?));
            continue;
        }

        if has_attribute(&field.attrs, "embedded") {
            members.push(Member::Embedded {
                field: field_name,
                ty: field.ty.clone(),
            });
            continue;
        }

        let role = parse_role(&field_name, &field.attrs)?;
        if role == Some(Role::PrimaryKey) && !allow_entity_members {
            return Err(Error::new(
                field_name.span(),
                "an embedded struct cannot declare the primary key",
            ));
        }
        let unique = has_attribute(&field.attrs, "unique");
        if unique && !allow_entity_members {
            return Err(Error::new(
                field_name.span(),
                "#[unique] columns are declared on the entity, not on an embedded struct",
            ));
        }
        let is_column = has_attribute(&field.attrs, "column") || role.is_some() || unique;
        if !is_column {
            continue;
        }

        // `None` is how a template leaves a column out of predicates and patches
        if role != Some(Role::PrimaryKey) && option_inner(&field.ty).is_none() {
            return Err(Error::new_spanned(
                &field.ty,
                format!(
                    "column `{}` must be an Option<T>: None marks it absent in templates and updates",
                    field_name
                ),
            ));
        }

        let ty = &field.ty;
        let type_string = quote!(#ty).to_string().replace(' ', "");
        let (name, sql_type) = parse_column_options(&field.attrs)?;
        let name = name.unwrap_or_else(|| field_name.to_string());
        validate_column_name_syn(&name, field_name.span())?;

        members.push(Member::Column(ColumnInfo {
            field: field_name,
            ty: field.ty.clone(),
            sql_type: sql_type
                .unwrap_or_else(|| type_mapping::rust_type_to_pg_type(&type_string).to_string()),
            name,
            role: role.unwrap_or(Role::Plain),
            unique,
        }));
    }

    Ok(members)
}

pub fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

fn parse_role(field: &Ident, attrs: &[Attribute]) -> Result<Option<Role>> {
    let declared: Vec<Role> = [
        ("primary_key", Role::PrimaryKey),
        ("created_at", Role::CreatedAt),
        ("updated_at", Role::UpdatedAt),
        ("soft_delete", Role::SoftDelete),
    ]
    .into_iter()
    .filter(|(name, _)| has_attribute(attrs, name))
    .map(|(_, role)| role)
    .collect();

    match declared.as_slice() {
        [] => Ok(None),
        [role] => Ok(Some(*role)),
        _ => Err(Error::new(
            field.span(),
            "a column takes at most one of #[primary_key], #[created_at], #[updated_at], #[soft_delete]",
        )),
    }
}

/// `#[column]`, `#[column(name = "..")]`, `#[column(sql_type = "..")]`
fn parse_column_options(attrs: &[Attribute]) -> Result<(Option<String>, Option<String>)> {
    let mut name = None;
    let mut sql_type = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("column")) {
        if matches!(attr.meta, syn::Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else if meta.path.is_ident("sql_type") {
                sql_type = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else {
                Err(meta.error("unknown column option; expected name or sql_type"))
            }
        })?;
    }

    Ok((name, sql_type))
}

/// `#[association(has_many, target = Post, foreign_key = "author_id", references = "id")]`
fn parse_association(field: Ident, attrs: &[Attribute]) -> Result<AssociationInfo> {
    let mut kind = None;
    let mut target = None;
    let mut foreign_key = None;
    let mut references = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("association")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("belongs_to") {
                kind = Some(Kind::BelongsTo);
            } else if meta.path.is_ident("has_one") {
                kind = Some(Kind::HasOne);
            } else if meta.path.is_ident("has_many") {
                kind = Some(Kind::HasMany);
            } else if meta.path.is_ident("target") {
                target = Some(meta.value()?.parse::<Type>()?);
            } else if meta.path.is_ident("foreign_key") {
                let value: LitStr = meta.value()?.parse()?;
                validate_column_name_syn(&value.value(), value.span())?;
                foreign_key = Some(value.value());
            } else if meta.path.is_ident("references") {
                let value: LitStr = meta.value()?.parse()?;
                validate_column_name_syn(&value.value(), value.span())?;
                references = Some(value.value());
            } else {
                return Err(meta.error(
                    "unknown association option; expected belongs_to, has_one, has_many, target, foreign_key or references",
                ));
            }
            Ok(())
        })?;
    }

    let missing = |what: &str| Error::new(field.span(), format!("association requires {}", what));
    Ok(AssociationInfo {
        kind: kind.ok_or_else(|| missing("one of belongs_to, has_one, has_many"))?,
        target: target.ok_or_else(|| missing("target = Type"))?,
        foreign_key: foreign_key.ok_or_else(|| missing("foreign_key = \"column\""))?,
        references,
        field,
    })
}

/// Entity-level checks across members
pub fn validate_entity(name: &Ident, info: &EntityInfo, members: &[Member]) -> Result<()> {
    let primary_keys = members
        .iter()
        .filter_map(Member::as_column)
        .filter(|c| c.role == Role::PrimaryKey)
        .count();
    if primary_keys != 1 {
        return Err(Error::new(
            name.span(),
            format!(
                "{} must declare exactly one #[primary_key] field, found {}",
                name, primary_keys
            ),
        ));
    }

    for role in [Role::CreatedAt, Role::UpdatedAt, Role::SoftDelete] {
        let count = members
            .iter()
            .filter_map(Member::as_column)
            .filter(|c| c.role == role)
            .count();
        if count > 1 {
            return Err(Error::new(
                name.span(),
                format!("{} declares more than one {:?} column", name, role),
            ));
        }
    }

    let find = |ident: &Ident| {
        members
            .iter()
            .filter_map(Member::as_association)
            .find(|a| a.field == *ident)
    };
    for join in &info.joins {
        match find(join) {
            None => return Err(Error::new(join.span(), format!("{} is not an association", join))),
            Some(a) if a.kind == Kind::HasMany => {
                return Err(Error::new(
                    join.span(),
                    format!("{} is has_many and cannot be joined; preload it instead", join),
                ))
            }
            Some(_) => {}
        }
    }
    for preload in &info.preloads {
        if find(preload).is_none() {
            return Err(Error::new(
                preload.span(),
                format!("{} is not an association", preload),
            ));
        }
    }

    Ok(())
}

/// `T` for `Option<T>`, `None` otherwise
pub fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn columns(members: &[Member]) -> Vec<(String, String, Role)> {
        members
            .iter()
            .filter_map(Member::as_column)
            .map(|c| (c.name.clone(), c.sql_type.clone(), c.role))
            .collect()
    }

    #[test]
    fn test_entity_attributes() {
        let input: DeriveInput = parse_quote! {
            #[entity(table = "posts", joins(author), preloads(comments), validator = checks::post)]
            struct Post {}
        };
        let info = parse_entity_attributes(&input).unwrap();
        assert_eq!(info.table, "posts");
        assert_eq!(info.joins[0].to_string(), "author");
        assert_eq!(info.preloads[0].to_string(), "comments");
        assert!(info.validator.is_some());
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let input: DeriveInput = parse_quote! {
            #[entity(joins(author))]
            struct Post {}
        };
        assert!(parse_entity_attributes(&input).is_err());
    }

    #[test]
    fn test_reserved_table_rejected() {
        let input: DeriveInput = parse_quote! {
            #[entity(table = "select")]
            struct Post {}
        };
        assert!(parse_entity_attributes(&input).is_err());
    }

    #[test]
    fn test_members_and_types() {
        let input: DeriveInput = parse_quote! {
            struct User {
                #[primary_key]
                id: Option<i64>,
                #[column]
                #[unique]
                email: Option<String>,
                #[column(name = "display_name", sql_type = "VARCHAR(80)")]
                name: Option<String>,
                #[updated_at]
                updated_at: Option<chrono::DateTime<chrono::Utc>>,
                #[soft_delete]
                deleted_at: Option<DateTime<Utc>>,
                scratch: u8,
                #[serde(flatten)]
                #[embedded]
                audit: Audit,
                #[association(has_many, target = Post, foreign_key = "author_id")]
                posts: Vec<Post>,
            }
        };
        let members = parse_members(&input.data, true).unwrap();
        assert_eq!(
            columns(&members),
            vec![
                ("id".to_string(), "BIGINT".to_string(), Role::PrimaryKey),
                ("email".to_string(), "TEXT".to_string(), Role::Plain),
                ("display_name".to_string(), "VARCHAR(80)".to_string(), Role::Plain),
                ("updated_at".to_string(), "TIMESTAMPTZ".to_string(), Role::UpdatedAt),
                ("deleted_at".to_string(), "TIMESTAMPTZ".to_string(), Role::SoftDelete),
            ]
        );
        assert!(members.iter().filter_map(Member::as_column).nth(1).unwrap().unique);
        assert!(matches!(members[5], Member::Embedded { .. }));
        let association = members[6].as_association().unwrap();
        assert_eq!(association.kind, Kind::HasMany);
        assert_eq!(association.foreign_key, "author_id");
    }

    #[test]
    fn test_conflicting_roles_rejected() {
        let input: DeriveInput = parse_quote! {
            struct User {
                #[primary_key]
                #[soft_delete]
                id: Option<i64>,
            }
        };
        assert!(parse_members(&input.data, true).is_err());
    }

    #[test]
    fn test_association_requires_target_and_key() {
        let input: DeriveInput = parse_quote! {
            struct User {
                #[association(has_one)]
                profile: Option<Profile>,
            }
        };
        assert!(parse_members(&input.data, true).is_err());
    }

    #[test]
    fn test_embedded_struct_cannot_hold_associations() {
        let input: DeriveInput = parse_quote! {
            struct Audit {
                #[association(belongs_to, target = User, foreign_key = "user_id")]
                user: Option<User>,
            }
        };
        assert!(parse_members(&input.data, false).is_err());
    }

    #[test]
    fn test_join_checks() {
        let input: DeriveInput = parse_quote! {
            #[entity(table = "users", joins(posts))]
            struct User {
                #[primary_key]
                id: i64,
                #[association(has_many, target = Post, foreign_key = "author_id")]
                posts: Vec<Post>,
            }
        };
        let info = parse_entity_attributes(&input).unwrap();
        let members = parse_members(&input.data, true).unwrap();
        assert!(validate_entity(&input.ident, &info, &members).is_err());
    }

    #[test]
    fn test_primary_key_required() {
        let input: DeriveInput = parse_quote! {
            #[entity(table = "notes")]
            struct Note {
                #[column]
                body: Option<String>,
            }
        };
        let info = parse_entity_attributes(&input).unwrap();
        let members = parse_members(&input.data, true).unwrap();
        assert!(validate_entity(&input.ident, &info, &members).is_err());
    }

    #[test]
    fn test_plain_column_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Account {
                #[primary_key]
                id: i64,
                #[column]
                balance: i64,
            }
        };
        let err = parse_members(&input.data, true).unwrap_err();
        assert!(err.to_string().contains("column `balance` must be an Option<T>"));

        let input: DeriveInput = parse_quote! {
            struct Account {
                #[primary_key]
                id: i64,
                #[created_at]
                created_at: DateTime<Utc>,
            }
        };
        assert!(parse_members(&input.data, true).is_err());
    }

    #[test]
    fn test_plain_column_rejected_in_embedded_struct() {
        let input: DeriveInput = parse_quote! {
            struct Audit {
                #[column]
                active: bool,
            }
        };
        assert!(parse_members(&input.data, false).is_err());
    }

    #[test]
    fn test_unique_rejected_in_embedded_struct() {
        let input: DeriveInput = parse_quote! {
            struct Audit {
                #[column]
                #[unique]
                created_by: Option<String>,
            }
        };
        let err = parse_members(&input.data, false).unwrap_err();
        assert!(err.to_string().contains("#[unique]"));
    }

    #[test]
    fn test_option_inner() {
        let ty: Type = parse_quote!(Option<uuid::Uuid>);
        let inner = option_inner(&ty).unwrap();
        assert_eq!(quote!(#inner).to_string().replace(' ', ""), "uuid::Uuid");
        let ty: Type = parse_quote!(i64);
        assert!(option_inner(&ty).is_none());
    }

    #[test]
    fn test_sql_injection_prevention() {
        let malicious_names = [
            "users; DROP TABLE users; --",
            "users' OR '1'='1",
            "users/**/UNION/**/SELECT",
            "users\"; DELETE FROM users; --",
        ];

        for name in malicious_names {
            assert!(
                validate_table_name_syn(name, proc_macro2::Span::call_site()).is_err(),
                "Should reject malicious name: {}",
                name
            );
        }
    }
}
