//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use axum::http::HeaderValue;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};
use crate::config::Config;
use crate::observability::{log_event_with_fields, set_min_severity, Event};
use crate::query::{parse_relation_list, QueryEngine, QueryParams, QueryResult, SearchOptions};
use crate::rest_api::{build_router, AppState};

/// Main CLI entry point.
///
/// Parses arguments and dispatches to the matching command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Query {
            config,
            entity,
            relations,
        } => query(&config, &entity, relations.as_deref()),
        Command::Search {
            config,
            entity,
            relations,
        } => search(&config, &entity, relations.as_deref()),
    }
}

fn load(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    set_min_severity(config.min_severity()?);

    let path = config_path.display().to_string();
    let entities = config.entities.len().to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("path", path.as_str()), ("entities", entities.as_str())],
    );
    Ok(config)
}

fn relations_for(config: &Config, entity: &str, explicit: Option<&str>) -> Vec<String> {
    match explicit {
        Some(raw) => parse_relation_list(raw),
        None => config
            .profiles()
            .remove(entity)
            .map(|p| p.default_relations)
            .unwrap_or_default(),
    }
}

/// Start the HTTP API and block until Ctrl-C.
///
/// Requests are logged through the crate logger by the router itself.
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = load(config_path)?;
    if let Some(port) = port {
        config.port = port;
    }

    let engine = QueryEngine::new(Arc::new(config.build_store()));
    let router = build_router(AppState::new(engine, config.profiles()))
        .layer(cors_layer(&config.cors_origins));

    let addr = config.socket_addr();
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| CliError::serve_failed(format!("Failed to bind {}: {}", addr, e)))?;

        log_event_with_fields(Event::ServerStart, &[("addr", addr.as_str())]);

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    })?;

    log_event_with_fields(Event::ServerStop, &[("addr", addr.as_str())]);
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins.iter().filter_map(|s| s.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// One filter-mode query: parameter bag on stdin, result on stdout
pub fn query(config_path: &Path, entity: &str, relations: Option<&str>) -> CliResult<()> {
    let config = load(config_path)?;
    let relations = relations_for(&config, entity, relations);
    let params = QueryParams::from_value(read_request()?);

    let engine = QueryEngine::new(Arc::new(config.build_store()));
    respond(engine.query(entity, &params, &relations))
}

/// One search-mode query: parameter bag on stdin, result on stdout
pub fn search(config_path: &Path, entity: &str, relations: Option<&str>) -> CliResult<()> {
    let config = load(config_path)?;
    let relations = relations_for(&config, entity, relations);
    let columns = config
        .profiles()
        .remove(entity)
        .map(|p| p.search_columns)
        .unwrap_or_default();
    let params = QueryParams::from_value(read_request()?);

    let engine = QueryEngine::new(Arc::new(config.build_store()));
    let options = SearchOptions::new(columns).with_relations(relations);
    respond(engine.search(entity, &params, &options))
}

fn respond(result: crate::query::EngineResult<QueryResult>) -> CliResult<()> {
    match result {
        Ok(page) => write_response(serde_json::to_value(page)?),
        Err(e) => {
            write_error(e.code(), &e.to_string())?;
            Err(e.into())
        }
    }
}
