//! # REST API HTTP Server
//!
//! Axum router over a [`QueryEngine`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use super::errors::{RestError, RestResult};
use crate::config::EntityProfile;
use crate::observability::{log_event_with_fields, Event};
use crate::query::{parse_relation_list, QueryEngine, QueryParams, QueryResult, SearchOptions};
use crate::store::Store;

/// Query key that overrides an entity's default relations
pub const RELATIONS_KEY: &str = "relations";

/// Shared handler state
pub struct AppState<S: Store> {
    pub engine: QueryEngine<S>,
    pub profiles: HashMap<String, EntityProfile>,
}

impl<S: Store> AppState<S> {
    pub fn new(engine: QueryEngine<S>, profiles: HashMap<String, EntityProfile>) -> Self {
        Self { engine, profiles }
    }

    fn profile(&self, entity: &str) -> EntityProfile {
        self.profiles.get(entity).cloned().unwrap_or_default()
    }
}

type ServerState<S> = Arc<AppState<S>>;

/// Build the API router
pub fn build_router<S: Store + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/:entity", get(list_handler::<S>))
        .route("/api/:entity/search", get(search_handler::<S>))
        .route("/api/:entity/:id", get(get_handler::<S>))
        .layer(middleware::from_fn(log_request))
        .with_state(Arc::new(state))
}

/// One `HTTP_REQUEST` log line per answered request
async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    let elapsed_ms = started.elapsed().as_millis().to_string();
    log_event_with_fields(
        Event::RequestServed,
        &[
            ("method", method.as_str()),
            ("path", path.as_str()),
            ("status", status.as_str()),
            ("elapsed_ms", elapsed_ms.as_str()),
        ],
    );
    response
}

/// Pull `relations` out of the query pairs, falling back to the entity's defaults
fn split_relations(
    pairs: Vec<(String, String)>,
    profile: &EntityProfile,
) -> (Vec<String>, QueryParams) {
    let mut relations = None;
    let mut rest = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        if key == RELATIONS_KEY {
            relations
                .get_or_insert_with(Vec::new)
                .extend(parse_relation_list(&value));
        } else {
            rest.push((key, value));
        }
    }
    let relations = relations.unwrap_or_else(|| profile.default_relations.clone());
    (relations, QueryParams::from_pairs(rest))
}

async fn health_handler() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn list_handler<S: Store + 'static>(
    State(state): State<ServerState<S>>,
    Path(entity): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> RestResult<Json<QueryResult>> {
    let (relations, params) = split_relations(pairs, &state.profile(&entity));
    let result = state.engine.query(&entity, &params, &relations)?;
    Ok(Json(result))
}

async fn search_handler<S: Store + 'static>(
    State(state): State<ServerState<S>>,
    Path(entity): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> RestResult<Json<QueryResult>> {
    let profile = state.profile(&entity);
    let (relations, params) = split_relations(pairs, &profile);
    let options = SearchOptions::new(profile.search_columns).with_relations(relations);
    let result = state.engine.search(&entity, &params, &options)?;
    Ok(Json(result))
}

async fn get_handler<S: Store + 'static>(
    State(state): State<ServerState<S>>,
    Path((entity, id)): Path<(String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> RestResult<Json<Value>> {
    let (relations, _) = split_relations(pairs, &state.profile(&entity));
    state
        .engine
        .find_by_id(&entity, &id, &relations)?
        .map(Json)
        .ok_or(RestError::NotFound { entity, id })
}
