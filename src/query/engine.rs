//! # Query Engine
//!
//! Entity-agnostic filter/search/paginate/sort over any [`Store`].
//!
//! # Pipeline
//!
//! 1. Validate pagination (fails before the store is touched)
//! 2. Load entity metadata
//! 3. Join requested relations
//! 4. Add filter or search predicates
//! 5. Apply skip/take
//! 6. Apply sort
//! 7. One combined count + fetch round trip
//!
//! The engine holds no per-call state; calls are independent and may run
//! concurrently against the same store. Each call's log lines share a
//! random `call` id.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use super::builder::{CompareOp, Condition, SelectQuery};
use super::errors::EngineResult;
use super::pagination::{self, Pagination};
use super::params::{QueryParams, DEFAULT_QUERY_SORT, DEFAULT_SEARCH_SORT};
use super::predicate::{apply_filter, apply_search, numeric_bound, numeric_value};
use super::relations::resolve_relations;
use super::result::QueryResult;
use super::sort::apply_sort;
use crate::metadata::EntityMetadata;
use crate::observability::{log_event_with_fields, Event};
use crate::store::{Store, StoreError};

/// Columns searched in search mode, plus relations to load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub columns: Vec<String>,
    pub relations: Vec<String>,
}

impl SearchOptions {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            relations: Vec::new(),
        }
    }

    pub fn with_relations<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relations = relations.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Filter,
    Search,
}

impl Mode {
    fn events(self) -> (Event, Event) {
        match self {
            Mode::Filter => (Event::QueryStart, Event::QueryComplete),
            Mode::Search => (Event::SearchStart, Event::SearchComplete),
        }
    }

    fn default_sort(self) -> &'static str {
        match self {
            Mode::Filter => DEFAULT_QUERY_SORT,
            Mode::Search => DEFAULT_SEARCH_SORT,
        }
    }
}

/// Filterable, sortable, paginated reads over a store
pub struct QueryEngine<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for QueryEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> QueryEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Filter mode: every non-reserved key that names a column becomes a
    /// predicate. Default sort `createdAt:desc`.
    pub fn query<R: AsRef<str>>(
        &self,
        entity: &str,
        params: &QueryParams,
        relations: &[R],
    ) -> EngineResult<QueryResult> {
        self.run(Mode::Filter, entity, params, relations, |query, metadata| {
            for key in apply_filter(query, &params.filters, metadata) {
                log_event_with_fields(
                    Event::FilterKeyDropped,
                    &[("entity", metadata.name()), ("key", key.as_str())],
                );
            }
        })
    }

    /// Search mode: `params.search` is matched with `LIKE %term%` against
    /// any of `options.columns`. Filter keys are ignored. Default sort
    /// `createdAt:asc`.
    pub fn search(
        &self,
        entity: &str,
        params: &QueryParams,
        options: &SearchOptions,
    ) -> EngineResult<QueryResult> {
        let term = params.search.as_deref().unwrap_or_default();
        self.run(
            Mode::Search,
            entity,
            params,
            &options.relations,
            |query, metadata| apply_search(query, term, &options.columns, metadata),
        )
    }

    /// Single record by `id`, with relations joined
    pub fn find_by_id<R: AsRef<str>>(
        &self,
        entity: &str,
        id: &str,
        relations: &[R],
    ) -> EngineResult<Option<Value>> {
        let metadata = self.metadata(entity)?;

        let mut query = SelectQuery::new(metadata.name());
        resolve_relations(&mut query, relations);

        let raw = Value::String(id.to_string());
        let bound = numeric_value(&raw).map(numeric_bound).unwrap_or(raw);
        let target = query.column("id");
        query
            .set_parameter("id", bound)
            .and_where(Condition::compare(target, CompareOp::Eq, "id"))
            .take(1);

        let (rows, _) = self.execute(&query)?;
        let found = rows.into_iter().next();

        log_event_with_fields(
            Event::LookupComplete,
            &[
                ("entity", metadata.name()),
                ("found", if found.is_some() { "true" } else { "false" }),
            ],
        );
        Ok(found)
    }

    fn run<R, F>(
        &self,
        mode: Mode,
        entity: &str,
        params: &QueryParams,
        relations: &[R],
        predicates: F,
    ) -> EngineResult<QueryResult>
    where
        R: AsRef<str>,
        F: FnOnce(&mut SelectQuery, &EntityMetadata),
    {
        let (start, complete) = mode.events();
        let call_id = Uuid::new_v4().to_string();
        let call = call_id.as_str();
        log_event_with_fields(start, &[("call", call), ("entity", entity)]);

        let window = pagination::validate(params.page.as_ref(), params.limit.as_ref())
            .inspect_err(|e| {
                let reason = e.to_string();
                log_event_with_fields(
                    Event::PaginationRejected,
                    &[("call", call), ("entity", entity), ("reason", reason.as_str())],
                );
            })?;

        let metadata = self.metadata(entity)?;

        let mut query = SelectQuery::new(metadata.name());
        resolve_relations(&mut query, relations);
        predicates(&mut query, metadata.as_ref());
        paginate(&mut query, window);

        let sort = params.sort.as_deref().unwrap_or(mode.default_sort());
        if !apply_sort(&mut query, sort, &metadata) {
            log_event_with_fields(
                Event::SortSkipped,
                &[("call", call), ("entity", entity), ("sort", sort)],
            );
        }

        let (data, total) = self.execute(&query)?;

        let (page, limit) = (window.page.to_string(), window.limit.to_string());
        let (total_text, returned) = (total.to_string(), data.len().to_string());
        log_event_with_fields(
            complete,
            &[
                ("call", call),
                ("entity", entity),
                ("page", page.as_str()),
                ("limit", limit.as_str()),
                ("total", total_text.as_str()),
                ("returned", returned.as_str()),
            ],
        );

        Ok(QueryResult::new(window.page, window.limit, total, data))
    }

    fn metadata(&self, entity: &str) -> EngineResult<Arc<EntityMetadata>> {
        self.store
            .metadata(entity)
            .map_err(|e| store_failure(entity, e).into())
    }

    fn execute(&self, query: &SelectQuery) -> EngineResult<(Vec<Value>, u64)> {
        self.store
            .fetch_and_count(query)
            .map_err(|e| store_failure(query.entity(), e).into())
    }
}

fn paginate(query: &mut SelectQuery, window: Pagination) {
    query.skip(window.offset()).take(window.limit);
}

fn store_failure(entity: &str, err: StoreError) -> StoreError {
    let message = err.to_string();
    log_event_with_fields(
        Event::StoreFailed,
        &[("entity", entity), ("error", message.as_str())],
    );
    err
}
