//! The caller's description of a List/Count request

use super::filter::Filter;
use super::ordering::Sorting;
use super::pagination::Pagination;
use super::predicate::{predicates_of, Predicate};
use crate::errors::DaoError;
use crate::schema::FieldLookup;
use crate::traits::Entity;
use std::fmt;
use std::marker::PhantomData;

/// Predicate, negation, pagination, sorting and text filter for entity `E`
///
/// `query` predicates are ANDed; `not` predicates are ANDed and the whole
/// conjunction negated.
pub struct QuerySpec<E> {
    pub query: Vec<Predicate>,
    pub not: Vec<Predicate>,
    pub pagination: Pagination,
    pub sorting: Sorting,
    pub filter: Filter,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Default for QuerySpec<E> {
    fn default() -> Self {
        Self {
            query: Vec::new(),
            not: Vec::new(),
            pagination: Pagination::default(),
            sorting: Sorting::default(),
            filter: Filter::default(),
            _entity: PhantomData,
        }
    }
}

impl<E> Clone for QuerySpec<E> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            not: self.not.clone(),
            pagination: self.pagination,
            sorting: self.sorting.clone(),
            filter: self.filter.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for QuerySpec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySpec")
            .field("entity", &std::any::type_name::<E>())
            .field("query", &self.query)
            .field("not", &self.not)
            .field("pagination", &self.pagination)
            .field("sorting", &self.sorting)
            .field("filter", &self.filter)
            .finish()
    }
}

impl<E: Entity> QuerySpec<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equality query over the set columns of `template`
    pub fn for_template(template: &E) -> Result<Self, DaoError> {
        Ok(Self {
            query: predicates_of(template)?,
            ..Self::default()
        })
    }

    pub fn filter_by(mut self, predicate: Predicate) -> Self {
        self.query.push(predicate);
        self
    }

    pub fn exclude(mut self, predicate: Predicate) -> Self {
        self.not.push(predicate);
        self
    }

    /// Exclude rows equal to the set columns of `template`
    pub fn exclude_template(mut self, template: &E) -> Result<Self, DaoError> {
        self.not.extend(predicates_of(template)?);
        Ok(self)
    }

    pub fn paginate(mut self, page: u32, page_size: u32) -> Self {
        self.pagination = Pagination::new(page, page_size);
        self
    }

    pub fn sort_by(mut self, field: &str, desc: bool) -> Self {
        self.sorting = Sorting::new(field, desc);
        self
    }

    pub fn search(mut self, filters: &str, fields: &str) -> Self {
        self.filter = Filter::new(filters, fields);
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_sorting(mut self, sorting: Sorting) -> Self {
        self.sorting = sorting;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Check caller-supplied sort and filter columns against `E`'s field set
    ///
    /// Only the non-empty options are checked; with neither set, the lookup
    /// is never consulted. Filter entries are matched on their last dotted
    /// segment.
    pub fn validate(&self, lookup: &impl FieldLookup) -> Result<(), DaoError> {
        if self.sorting.sort_by.is_empty() && self.filter.fields.is_empty() {
            return Ok(());
        }

        let schema = E::schema();
        let fields = lookup.field_set(&schema);

        if !self.sorting.sort_by.is_empty() {
            let sort_by = self.sorting.sort_by.trim();
            if !fields.contains(sort_by) {
                return Err(DaoError::invalid_option(format!(
                    "{} cannot be sorted by {:?}",
                    schema.type_name, sort_by
                )));
            }
        }

        if !self.filter.fields.is_empty() {
            for entry in self.filter.fields.split(',') {
                let entry = entry.trim();
                let column = entry.rsplit('.').next().unwrap_or(entry);
                if !fields.contains(column) {
                    return Err(DaoError::invalid_option(format!(
                        "{} cannot be filtered on {:?}",
                        schema.type_name, entry
                    )));
                }
            }
        }

        Ok(())
    }
}
