//! Composable query modifiers
//!
//! A modifier is a stateless function applied, in order, to the plan of an
//! in-flight operation. Later modifiers see (and may override) what earlier
//! ones set.

use crate::traits::Entity;
use std::fmt;
use std::sync::Arc;

/// Row lock taken by a select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    Update,
    Share,
}

impl RowLock {
    pub fn to_sql(&self) -> &'static str {
        match self {
            RowLock::Update => "FOR UPDATE",
            RowLock::Share => "FOR SHARE",
        }
    }
}

/// What the modifiers of one operation asked for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPlan {
    /// Associations joined into the select, in first-requested order
    pub joins: Vec<String>,
    /// Associations loaded by a follow-up query, in first-requested order
    pub preloads: Vec<String>,
    /// Include soft-deleted rows
    pub unscoped: bool,
    /// Skip association writes on Create/Save
    pub omit_associations: bool,
    pub lock: Option<RowLock>,
}

impl QueryPlan {
    fn add_join(&mut self, association: &str) {
        if !self.joins.iter().any(|existing| existing == association) {
            self.joins.push(association.to_string());
        }
    }

    fn add_preload(&mut self, association: &str) {
        if !self.preloads.iter().any(|existing| existing == association) {
            self.preloads.push(association.to_string());
        }
    }
}

/// A step transforming the plan of an operation
#[derive(Clone)]
pub struct Modifier(Arc<dyn Fn(&mut QueryPlan) + Send + Sync>);

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Modifier")
    }
}

impl Modifier {
    pub fn new(apply: impl Fn(&mut QueryPlan) + Send + Sync + 'static) -> Self {
        Self(Arc::new(apply))
    }

    pub fn apply(&self, plan: &mut QueryPlan) {
        (self.0)(plan)
    }
}

/// Join a belongs-to or has-one association into the select
pub fn join(association: &str) -> Modifier {
    let association = association.to_string();
    Modifier::new(move |plan| plan.add_join(&association))
}

/// Load an association with a follow-up query and nest it into each row
pub fn preload(association: &str) -> Modifier {
    let association = association.to_string();
    Modifier::new(move |plan| plan.add_preload(&association))
}

/// Include soft-deleted rows; makes Delete permanent
pub fn with_deleted() -> Modifier {
    Modifier::new(|plan| plan.unscoped = true)
}

pub fn omit_associations() -> Modifier {
    Modifier::new(|plan| plan.omit_associations = true)
}

pub fn lock_for_update() -> Modifier {
    Modifier::new(|plan| plan.lock = Some(RowLock::Update))
}

pub fn lock_for_share() -> Modifier {
    Modifier::new(|plan| plan.lock = Some(RowLock::Share))
}

/// The join and preload modifiers `E` declares for itself
pub fn entity_modifiers<E: Entity>() -> Vec<Modifier> {
    E::relations()
        .into_iter()
        .map(join)
        .chain(E::preloads().into_iter().map(preload))
        .collect()
}

/// Fold modifiers into a plan, in order
pub fn build_plan<'a>(modifiers: impl IntoIterator<Item = &'a Modifier>) -> QueryPlan {
    let mut plan = QueryPlan::default();
    for modifier in modifiers {
        modifier.apply(&mut plan);
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_apply_in_order() {
        let modifiers = vec![lock_for_update(), join("profile"), lock_for_share()];
        let plan = build_plan(&modifiers);
        assert_eq!(plan.lock, Some(RowLock::Share));
        assert_eq!(plan.joins, vec!["profile".to_string()]);
        assert!(!plan.unscoped);
    }

    #[test]
    fn test_duplicate_joins_collapse() {
        let modifiers = vec![join("profile"), preload("posts"), join("profile"), preload("posts")];
        let plan = build_plan(&modifiers);
        assert_eq!(plan.joins.len(), 1);
        assert_eq!(plan.preloads.len(), 1);
    }

    #[test]
    fn test_custom_modifier() {
        let scope_all = Modifier::new(|plan| {
            plan.unscoped = true;
            plan.omit_associations = true;
        });
        let plan = build_plan([&scope_all]);
        assert!(plan.unscoped && plan.omit_associations);
    }
}
