//! Schema registry: per-entity column sets, built once and shared

use super::EntitySchema;
use crate::traits::Entity;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Columns every entity is assumed to persist, with their default SQL types
const BASE_COLUMNS: [(&str, &str); 3] = [
    ("id", "BIGINT"),
    ("created_at", "TIMESTAMPTZ"),
    ("updated_at", "TIMESTAMPTZ"),
];

/// The persisted column names of one entity type, with their SQL types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    columns: BTreeMap<String, &'static str>,
}

impl FieldSet {
    /// Build the set from a schema declaration, embedded members included
    pub fn from_schema(schema: &EntitySchema) -> Self {
        let mut columns: BTreeMap<String, &'static str> = BASE_COLUMNS
            .iter()
            .map(|(name, sql_type)| (name.to_string(), *sql_type))
            .collect();

        for column in schema.columns() {
            columns.insert(column.name.to_string(), column.sql_type);
        }

        Self { columns }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn sql_type(&self, name: &str) -> Option<&'static str> {
        self.columns.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Source of field sets consulted by query validation
pub trait FieldLookup {
    fn field_set(&self, schema: &EntitySchema) -> Arc<FieldSet>;
}

/// Process-wide cache of entity field sets, keyed by entity type name
///
/// Construct one at startup and share it (`Arc`) with every `BaseDao`.
/// Registration is idempotent: the first writer publishes the set, later
/// callers get the cached one without recomputation.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entries: RwLock<HashMap<&'static str, Arc<FieldSet>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<E: Entity>(&self) -> Arc<FieldSet> {
        self.register_schema(&E::schema())
    }

    pub fn register_schema(&self, schema: &EntitySchema) -> Arc<FieldSet> {
        if let Some(existing) = self.cached(schema.type_name) {
            return existing;
        }

        let computed = Arc::new(FieldSet::from_schema(schema));
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .entry(schema.type_name)
            .or_insert_with(|| {
                debug_log!(
                    "Registered {} ({} columns)",
                    schema.type_name,
                    computed.len()
                );
                computed
            })
            .clone()
    }

    /// Field set for a type name; empty when the type was never registered
    pub fn fields(&self, type_name: &str) -> Arc<FieldSet> {
        self.cached(type_name).unwrap_or_default()
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.cached(type_name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, type_name: &str) -> Option<Arc<FieldSet>> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(type_name)
            .cloned()
    }
}

impl FieldLookup for SchemaRegistry {
    fn field_set(&self, schema: &EntitySchema) -> Arc<FieldSet> {
        self.register_schema(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, FieldDecl};

    fn address_fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl::Column(ColumnDef::new("street", "TEXT")),
            FieldDecl::Column(ColumnDef::new("city", "TEXT")),
        ]
    }

    fn customer_schema() -> EntitySchema {
        EntitySchema::new("Customer", "customers")
            .primary_key("id", "BIGINT")
            .column("name", "TEXT")
            .column("email", "TEXT")
            .embedded("address", address_fields)
    }

    #[test]
    fn test_field_set_includes_base_and_embedded_columns() {
        let registry = SchemaRegistry::new();
        let fields = registry.register_schema(&customer_schema());

        let names: Vec<_> = fields.names().collect();
        assert_eq!(
            names,
            vec!["city", "created_at", "email", "id", "name", "street", "updated_at"]
        );
        assert_eq!(fields.sql_type("id"), Some("BIGINT"));
        assert_eq!(fields.sql_type("street"), Some("TEXT"));
    }

    #[test]
    fn test_declared_type_overrides_base() {
        let schema = EntitySchema::new("Token", "tokens").primary_key("id", "UUID");
        let fields = FieldSet::from_schema(&schema);
        assert_eq!(fields.sql_type("id"), Some("UUID"));
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_registration_is_idempotent() {
        let registry = SchemaRegistry::new();
        let first = registry.register_schema(&customer_schema());
        let second = registry.register_schema(&customer_schema());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert_eq!(*registry.fields("Customer"), *first);
    }

    #[test]
    fn test_unknown_type_yields_empty_set() {
        let registry = SchemaRegistry::new();
        assert!(registry.fields("Ghost").is_empty());
        assert!(!registry.is_registered("Ghost"));
    }

    #[test]
    fn test_concurrent_first_registration_publishes_one_set() {
        let registry = Arc::new(SchemaRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.register_schema(&customer_schema()))
            })
            .collect();

        let sets: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let published = registry.fields("Customer");
        for set in &sets {
            assert!(Arc::ptr_eq(set, &published));
        }
        assert_eq!(registry.len(), 1);
    }
}
