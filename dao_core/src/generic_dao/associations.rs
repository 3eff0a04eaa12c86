//! Association loading and writing
//!
//! Preloads run one `IN (...)` query per association over the parent rows
//! and nest the children under the association name. Creates and saves
//! write has-one/has-many children carried by the parent, pointing their
//! foreign key at the parent.

use super::core::BaseDao;
use super::statements::{self, Conflict};
use crate::errors::DaoError;
use crate::modifier::QueryPlan;
use crate::query::{Predicate, SqlGenerator};
use crate::schema::{Association, AssociationKind, EntitySchema};
use crate::session::Row;
use serde_json::Value;

impl BaseDao {
    /// Load every planned preload into `rows`
    pub(crate) async fn preload_into(
        &self,
        schema: &EntitySchema,
        plan: &QueryPlan,
        rows: &mut [Row],
    ) -> Result<(), DaoError> {
        for name in &plan.preloads {
            let association = schema.find_association(name).ok_or_else(|| {
                DaoError::invalid_option(format!(
                    "{} has no association {:?} to preload",
                    schema.type_name, name
                ))
            })?;
            let children = self.fetch_children(association, plan, rows).await?;
            nest_children(association, rows, &children);
        }
        Ok(())
    }

    async fn fetch_children(
        &self,
        association: &Association,
        plan: &QueryPlan,
        rows: &[Row],
    ) -> Result<Vec<Row>, DaoError> {
        let mut owners: Vec<Value> = Vec::new();
        for row in rows {
            match row.get(association.owner_column()) {
                Some(Value::Null) | None => {}
                Some(value) if owners.contains(value) => {}
                Some(value) => owners.push(value.clone()),
            }
        }
        if owners.is_empty() {
            return Ok(Vec::new());
        }

        let target = (association.target)();
        let mut generator = SqlGenerator::new(target.table, self.fields_of(&target))?;
        let mut clauses =
            vec![generator.predicate(&Predicate::in_values(association.target_column(), owners))?];
        if let (false, Some(column)) = (plan.unscoped, target.soft_delete_column()) {
            clauses.push(format!("{} IS NULL", generator.column(column)?));
        }
        let sql = format!(
            "SELECT to_jsonb({table}.*) AS row FROM {table} {} ORDER BY {}",
            crate::query::where_clause(&clauses),
            generator.column(target.primary_key_column())?,
            table = generator.table(),
        );

        debug_log!("Preloading {} for {} parents", association.name, rows.len());
        self.session
            .fetch_all(&generator.into_statement(sql))
            .await
    }

    /// Write the has-one/has-many children present in `parent`, returning
    /// the stored children keyed by association name
    pub(crate) async fn save_children(
        &self,
        schema: &EntitySchema,
        parent: &Row,
    ) -> Result<Row, DaoError> {
        let mut saved = Row::new();
        for association in &schema.associations {
            if association.kind == AssociationKind::BelongsTo {
                continue;
            }
            let Some(owner) = parent
                .get(association.references)
                .filter(|value| !value.is_null())
            else {
                continue;
            };

            let stored = match parent.get(association.name) {
                Some(Value::Array(items)) => {
                    let mut stored = Vec::with_capacity(items.len());
                    for item in items {
                        stored.push(Value::Object(
                            self.save_child(association, owner, item).await?,
                        ));
                    }
                    Value::Array(stored)
                }
                Some(item @ Value::Object(_)) => {
                    Value::Object(self.save_child(association, owner, item).await?)
                }
                _ => continue,
            };
            saved.insert(association.name.to_string(), stored);
        }
        Ok(saved)
    }

    async fn save_child(
        &self,
        association: &Association,
        owner: &Value,
        child: &Value,
    ) -> Result<Row, DaoError> {
        let Value::Object(child) = child else {
            return Err(DaoError::marshal(format!(
                "association {} must hold objects",
                association.name
            )));
        };
        let mut child = child.clone();
        child.insert(association.foreign_key.to_string(), owner.clone());

        let target = (association.target)();
        let primary_key = target.primary_key_column();
        if child.get(primary_key).is_some_and(is_zero_key) {
            child.insert(primary_key.to_string(), Value::Null);
        }
        let statement = statements::insert(
            &target,
            self.fields_of(&target),
            &child,
            Conflict::UpdateProvided,
        )?;
        let stored = self.session.fetch_optional(&statement).await?;
        stored.ok_or_else(|| DaoError::not_exists(target.table, "association write returned no row"))
    }
}

/// Serialized default of a plain key type: the child has no key yet
fn is_zero_key(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "00000000-0000-0000-0000-000000000000",
        _ => false,
    }
}

fn nest_children(association: &Association, rows: &mut [Row], children: &[Row]) {
    for row in rows.iter_mut() {
        let owner = row
            .get(association.owner_column())
            .cloned()
            .unwrap_or(Value::Null);
        let mut matching = children
            .iter()
            .filter(|child| !owner.is_null() && child.get(association.target_column()) == Some(&owner))
            .cloned()
            .map(Value::Object);

        let nested = match association.kind {
            AssociationKind::HasMany => Value::Array(matching.collect()),
            AssociationKind::HasOne | AssociationKind::BelongsTo => {
                matching.next().unwrap_or(Value::Null)
            }
        };
        row.insert(association.name.to_string(), nested);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zero_keys() {
        assert!(is_zero_key(&json!(0)));
        assert!(is_zero_key(&json!("")));
        assert!(is_zero_key(&json!("00000000-0000-0000-0000-000000000000")));
        assert!(!is_zero_key(&json!(7)));
        assert!(!is_zero_key(&Value::Null));
    }
}
