//! Query specification
//!
//! Predicates, pagination, sorting and text filtering of List/Count requests,
//! their validation against the schema registry, and SQL rendering.

pub mod filter;
pub mod ordering;
pub mod pagination;
pub mod predicate;
pub mod query_spec;
pub mod sql_generation;


pub use filter::Filter;
pub use ordering::{SortOrder, Sorting};
pub use pagination::Pagination;
pub use predicate::{predicates_of, Condition, LogicalOperator, Predicate, QueryOperator};
pub use query_spec::QuerySpec;
pub use sql_generation::{where_clause, SqlGenerator};
