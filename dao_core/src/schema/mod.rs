//! Static entity schema declarations
//!
//! An entity describes its persisted columns once, declaratively, through an
//! [`EntitySchema`]. The [`SchemaRegistry`] turns that declaration into the
//! cached [`FieldSet`] used by validation and SQL generation.

pub mod registry;

pub use registry::{FieldLookup, FieldSet, SchemaRegistry};

/// What a column means to the access engine beyond being data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Plain,
    PrimaryKey,
    CreatedAt,
    UpdatedAt,
    /// Nullable timestamp; a non-null value hides the row from scoped queries
    SoftDelete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub role: ColumnRole,
}

impl ColumnDef {
    pub const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            role: ColumnRole::Plain,
        }
    }

    pub const fn with_role(mut self, role: ColumnRole) -> Self {
        self.role = role;
        self
    }
}

/// One annotated member of an entity
#[derive(Debug, Clone)]
pub enum FieldDecl {
    Column(ColumnDef),
    /// A flattened sub-structure whose own declarations are merged in
    Embedded {
        member: &'static str,
        fields: fn() -> Vec<FieldDecl>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    /// Foreign key lives on this entity, pointing at the target
    BelongsTo,
    /// Foreign key lives on the target, pointing at this entity; at most one row
    HasOne,
    /// Foreign key lives on the target, pointing at this entity
    HasMany,
}

/// A relation to another entity, usable for joins, preloads and association writes
#[derive(Debug, Clone)]
pub struct Association {
    pub name: &'static str,
    pub kind: AssociationKind,
    pub foreign_key: &'static str,
    pub references: &'static str,
    pub target: fn() -> EntitySchema,
}

impl Association {
    pub fn new(
        name: &'static str,
        kind: AssociationKind,
        foreign_key: &'static str,
        target: fn() -> EntitySchema,
    ) -> Self {
        Self {
            name,
            kind,
            foreign_key,
            references: "id",
            target,
        }
    }

    pub fn references(mut self, column: &'static str) -> Self {
        self.references = column;
        self
    }

    /// Column on the owning entity used to match rows of the target
    pub fn owner_column(&self) -> &'static str {
        match self.kind {
            AssociationKind::BelongsTo => self.foreign_key,
            AssociationKind::HasOne | AssociationKind::HasMany => self.references,
        }
    }

    /// Column on the target matched against [`Association::owner_column`]
    pub fn target_column(&self) -> &'static str {
        match self.kind {
            AssociationKind::BelongsTo => self.references,
            AssociationKind::HasOne | AssociationKind::HasMany => self.foreign_key,
        }
    }
}

/// Declarative description of an entity type
#[derive(Debug, Clone)]
pub struct EntitySchema {
    pub type_name: &'static str,
    pub table: &'static str,
    pub fields: Vec<FieldDecl>,
    pub associations: Vec<Association>,
}

impl EntitySchema {
    pub fn new(type_name: &'static str, table: &'static str) -> Self {
        Self {
            type_name,
            table,
            fields: Vec::new(),
            associations: Vec::new(),
        }
    }

    pub fn field(mut self, decl: FieldDecl) -> Self {
        self.fields.push(decl);
        self
    }

    pub fn column(self, name: &'static str, sql_type: &'static str) -> Self {
        self.field(FieldDecl::Column(ColumnDef::new(name, sql_type)))
    }

    pub fn primary_key(self, name: &'static str, sql_type: &'static str) -> Self {
        self.field(FieldDecl::Column(
            ColumnDef::new(name, sql_type).with_role(ColumnRole::PrimaryKey),
        ))
    }

    /// Declare the standard `created_at`/`updated_at` audit columns
    pub fn timestamps(self) -> Self {
        self.field(FieldDecl::Column(
            ColumnDef::new("created_at", "TIMESTAMPTZ").with_role(ColumnRole::CreatedAt),
        ))
        .field(FieldDecl::Column(
            ColumnDef::new("updated_at", "TIMESTAMPTZ").with_role(ColumnRole::UpdatedAt),
        ))
    }

    pub fn soft_delete(self, name: &'static str) -> Self {
        self.field(FieldDecl::Column(
            ColumnDef::new(name, "TIMESTAMPTZ").with_role(ColumnRole::SoftDelete),
        ))
    }

    pub fn embedded(self, member: &'static str, fields: fn() -> Vec<FieldDecl>) -> Self {
        self.field(FieldDecl::Embedded { member, fields })
    }

    pub fn association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    /// All declared columns, embedded declarations flattened in order
    pub fn columns(&self) -> Vec<ColumnDef> {
        let mut columns = Vec::new();
        collect_columns(&self.fields, &mut columns);
        columns
    }

    pub fn primary_key_column(&self) -> &'static str {
        self.column_with_role(ColumnRole::PrimaryKey)
            .map(|c| c.name)
            .unwrap_or("id")
    }

    pub fn soft_delete_column(&self) -> Option<&'static str> {
        self.column_with_role(ColumnRole::SoftDelete).map(|c| c.name)
    }

    pub fn find_association(&self, name: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.name == name)
    }

    fn column_with_role(&self, role: ColumnRole) -> Option<ColumnDef> {
        self.columns().into_iter().find(|c| c.role == role)
    }
}

fn collect_columns(fields: &[FieldDecl], out: &mut Vec<ColumnDef>) {
    for decl in fields {
        match decl {
            FieldDecl::Column(column) => out.push(column.clone()),
            FieldDecl::Embedded { fields, .. } => collect_columns(&fields(), out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audit_fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl::Column(ColumnDef::new("created_by", "TEXT")),
            FieldDecl::Column(ColumnDef::new("approved", "BOOLEAN")),
        ]
    }

    fn post_schema() -> EntitySchema {
        EntitySchema::new("Post", "posts").primary_key("id", "BIGINT")
    }

    #[test]
    fn test_columns_flatten_embedded() {
        let schema = EntitySchema::new("Doc", "docs")
            .primary_key("id", "BIGINT")
            .column("title", "TEXT")
            .embedded("audit", audit_fields)
            .soft_delete("deleted_at");

        let names: Vec<_> = schema.columns().iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec!["id", "title", "created_by", "approved", "deleted_at"]
        );
        assert_eq!(schema.primary_key_column(), "id");
        assert_eq!(schema.soft_delete_column(), Some("deleted_at"));
    }

    #[test]
    fn test_association_columns_by_kind() {
        let has_many = Association::new("posts", AssociationKind::HasMany, "author_id", post_schema);
        assert_eq!(has_many.owner_column(), "id");
        assert_eq!(has_many.target_column(), "author_id");

        let belongs_to =
            Association::new("post", AssociationKind::BelongsTo, "post_id", post_schema);
        assert_eq!(belongs_to.owner_column(), "post_id");
        assert_eq!(belongs_to.target_column(), "id");
    }
}
