//! # Query Engine
//!
//! Filterable, sortable, paginated reads over any entity a [`Store`]
//! describes. Callers hand over a flat parameter bag; the engine sorts out
//! which keys are pagination, which are sort, and which name real columns.
//!
//! [`Store`]: crate::store::Store

pub mod builder;
mod engine;
mod errors;
pub mod pagination;
mod params;
pub mod predicate;
pub mod relations;
mod result;
pub mod sort;

pub use builder::{
    ColumnRef, CompareOp, Condition, Join, OrderBy, SelectQuery, SortDirection,
};
pub use engine::{QueryEngine, SearchOptions};
pub use errors::{EngineResult, QueryError};
pub use pagination::{Pagination, DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT};
pub use params::{
    group_pairs, QueryParams, DEFAULT_QUERY_SORT, DEFAULT_SEARCH_SORT, LIMIT_KEY, PAGE_KEY,
    SEARCH_KEY, SORT_KEY,
};
pub use predicate::{apply_filter, apply_search};
pub use relations::{parse_relation_list, resolve_relations};
pub use result::QueryResult;
pub use sort::apply_sort;
