//! lms-query - filterable, sortable, paginated reads for a
//! learning-management back office
//!
//! The [`query::QueryEngine`] turns a flat parameter bag into a validated,
//! paginated, filtered (or free-text searched) and sorted result set over
//! any entity a [`store::Store`] can describe.

pub mod cli;
pub mod config;
pub mod metadata;
pub mod observability;
pub mod query;
pub mod rest_api;
pub mod store;
